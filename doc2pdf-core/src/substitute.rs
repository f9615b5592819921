//! Tag substitution
//!
//! Tokens are matched inside individual runs only. A token whose characters
//! are spread over two adjacent runs (which happens when a word processor
//! splits a run mid-word because of a spell-check mark or partial
//! formatting) is left in place.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::docx::Document;
use crate::tags::TagMap;

/// What a substitution pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubstitutionReport {
    /// Runs whose text was rewritten
    pub runs_rewritten: usize,
    /// Token occurrences replaced, over all tags
    pub occurrences: usize,
    /// Occurrences per token, for tokens that matched at least once
    pub by_tag: BTreeMap<String, usize>,
}

/// Replace every `{TAG}` token of `tags` found within a single run of any
/// region of `document`.
///
/// Tags are applied in map order, each over every run of a paragraph, so a
/// value that itself contains a later token is substituted again.
pub fn substitute(document: &mut Document, tags: &TagMap) -> SubstitutionReport {
    let mut report = SubstitutionReport::default();
    if tags.is_empty() {
        return report;
    }

    let tokens = tags.tokens();
    let regions = document.regions().to_vec();

    for region in &regions {
        for paragraph in document.paragraphs(region) {
            let original = document.run_texts(paragraph);
            let mut texts = original.clone();

            for (token, value) in &tokens {
                for text in texts.iter_mut() {
                    let count = text.matches(token.as_str()).count();
                    if count == 0 {
                        continue;
                    }
                    *text = text.replace(token.as_str(), value);
                    report.occurrences += count;
                    *report.by_tag.entry(token.clone()).or_default() += count;
                }
            }

            for (run, (before, after)) in original.iter().zip(&texts).enumerate() {
                if before != after && document.set_run_text(paragraph, run, after) {
                    report.runs_rewritten += 1;
                }
            }
        }
    }

    tracing::debug!(
        "Substitution: {} occurrences in {} runs across {} regions",
        report.occurrences,
        report.runs_rewritten,
        regions.len()
    );

    report
}
