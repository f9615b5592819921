//! Conversion pipeline
//!
//! `decode → check size → classify → parse → substitute → serialize`, then
//! for conversions `write to a job directory → export → read the PDF back`.
//! Each stage runs only if the previous one succeeded. The job directory is
//! a [`TempDir`] owned by the running job, so it is removed on every exit
//! path, including converter timeouts and early returns.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tempfile::TempDir;

use crate::codec;
use crate::docx::Document;
use crate::error::{Doc2PdfError, Result};
use crate::format;
use crate::quality::{Quality, QualityProfile};
use crate::render::{DocumentRenderer, LibreOfficeRenderer};
use crate::settings::Settings;
use crate::substitute::{substitute, SubstitutionReport};
use crate::tags::{TagError, TagMap};

const INPUT_FILE: &str = "input.docx";
const OUTPUT_FILE: &str = "output.pdf";

/// How the caller supplied the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentInput {
    /// Base64 text of the document
    Base64(String),
    /// The document bytes themselves
    Raw(Vec<u8>),
}

/// One conversion request
#[derive(Debug, Clone)]
pub struct ConversionJob {
    pub input: DocumentInput,
    pub replacements: TagMap,
    pub quality: &'static QualityProfile,
}

/// A document with its tags substituted
#[derive(Debug, Clone)]
pub struct FilledDocument {
    /// Serialized DOCX
    pub bytes: Vec<u8>,
    pub report: SubstitutionReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    /// Size of the filled DOCX handed to the converter
    pub input_size: usize,
    /// Size of the produced PDF
    pub output_size: usize,
    pub quality: Quality,
    /// Entries in the replacement map
    pub replacements_count: usize,
    /// Runs rewritten by substitution
    pub tags_replaced: usize,
}

#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub pdf: Vec<u8>,
    pub stats: ConversionStats,
}

/// Runs fill and conversion jobs against one renderer.
#[derive(Clone)]
pub struct Pipeline {
    settings: Arc<Settings>,
    renderer: Arc<dyn DocumentRenderer>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(settings: Arc<Settings>, renderer: Arc<dyn DocumentRenderer>) -> Self {
        Self { settings, renderer }
    }

    /// Pipeline backed by the converter command named in `settings`.
    pub fn with_libreoffice(settings: Settings) -> Self {
        let renderer = Arc::new(LibreOfficeRenderer::from_settings(&settings));
        Self::new(Arc::new(settings), renderer)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Decode, validate and fill a document without converting it.
    pub async fn fill(
        &self,
        input: DocumentInput,
        replacements: TagMap,
    ) -> Result<FilledDocument> {
        let max_replacements = self.settings.max_replacements;
        if replacements.len() > max_replacements {
            return Err(TagError::TooMany {
                max: max_replacements,
            }
            .into());
        }

        let started = Instant::now();
        let bytes = match input {
            DocumentInput::Base64(text) => codec::decode(&text)?,
            DocumentInput::Raw(bytes) => bytes,
        };
        tracing::info!("Document decoded: {} bytes", bytes.len());

        if bytes.len() > self.settings.max_file_size {
            return Err(Doc2PdfError::DocumentTooLarge {
                size: bytes.len(),
                max: self.settings.max_file_size,
            });
        }

        let detected = format::classify(&bytes)?;
        tracing::debug!("Detected format: {detected:?}");

        let max_unpacked = self.settings.max_unpacked_size();
        let filled = tokio::task::spawn_blocking(move || -> Result<FilledDocument> {
            let mut document = Document::from_bytes_with_limit(&bytes, max_unpacked)?;
            let report = substitute(&mut document, &replacements);
            let bytes = document.to_bytes()?;
            Ok(FilledDocument { bytes, report })
        })
        .await
        .map_err(|e| Doc2PdfError::Internal(format!("substitution task failed: {e}")))??;

        tracing::info!(
            "Tags substituted: {} occurrences in {} runs ({:.2?})",
            filled.report.occurrences,
            filled.report.runs_rewritten,
            started.elapsed()
        );
        Ok(filled)
    }

    /// Fill a document and export it to PDF.
    pub async fn convert(&self, job: ConversionJob) -> Result<ConversionOutput> {
        let started = Instant::now();
        let replacements_count = job.replacements.len();
        let filled = self.fill(job.input, job.replacements).await?;

        let workspace = self.job_dir()?;
        let document_path = workspace.path().join(INPUT_FILE);
        let output_path = workspace.path().join(OUTPUT_FILE);
        tokio::fs::write(&document_path, &filled.bytes).await?;
        tracing::debug!("Job directory: {}", workspace.path().display());

        let export_started = Instant::now();
        self.renderer
            .export_pdf(&document_path, &output_path, job.quality)
            .await?;
        tracing::info!(
            "PDF exported with '{}' profile ({:.2?})",
            job.quality.quality,
            export_started.elapsed()
        );

        let pdf = tokio::fs::read(&output_path).await?;
        drop(workspace);

        let stats = ConversionStats {
            input_size: filled.bytes.len(),
            output_size: pdf.len(),
            quality: job.quality.quality,
            replacements_count,
            tags_replaced: filled.report.runs_rewritten,
        };
        tracing::info!(
            "Conversion finished in {:.2?}: {} -> {} bytes",
            started.elapsed(),
            stats.input_size,
            stats.output_size
        );

        Ok(ConversionOutput { pdf, stats })
    }

    fn job_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("doc2pdf-");
        let dir = match &self.settings.work_dir {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }
}

/// Read a document from disk as pipeline input.
pub async fn read_document(path: &Path) -> Result<DocumentInput> {
    Ok(DocumentInput::Raw(tokio::fs::read(path).await?))
}
