use std::collections::HashMap;

use super::package::Package;
use super::part::XmlPart;
use super::rels::{rels_path_for, resolve_target, Relationships, OFFICE_DOCUMENT_TYPE};
use super::{DocxError, DEFAULT_MAX_UNPACKED_SIZE, MAIN_DOCUMENT_PART};

/// Structural area of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Body,
    /// Header part first referenced by section `section` (0-based)
    Header { section: usize },
    /// Footer part first referenced by section `section` (0-based)
    Footer { section: usize },
}

/// One visitable region: the body, or one header/footer part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub kind: RegionKind,
    /// Package path of the part holding the region, e.g. `word/header1.xml`
    pub part_name: String,
    part: usize,
}

/// Handle to one paragraph of a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParagraphId {
    part: usize,
    index: usize,
}

/// A parsed DOCX document
#[derive(Debug, Clone)]
pub struct Document {
    package: Package,
    parts: Vec<XmlPart>,
    regions: Vec<Region>,
}

impl Document {
    /// Open a DOCX package from memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DocxError> {
        Self::from_bytes_with_limit(bytes, DEFAULT_MAX_UNPACKED_SIZE)
    }

    /// Open a DOCX package whose entries may unpack to at most
    /// `max_unpacked` bytes in total.
    pub fn from_bytes_with_limit(bytes: &[u8], max_unpacked: u64) -> Result<Self, DocxError> {
        let package = Package::read(bytes, max_unpacked)?;

        let main_name = main_part_name(&package)?;
        let main_xml = package
            .get(&main_name)
            .ok_or_else(|| DocxError::MissingPart(main_name.clone()))?;
        let main = XmlPart::parse(&main_name, main_xml).map_err(DocxError::xml(&main_name))?;

        let rels_name = rels_path_for(&main_name);
        let rels = match package.get(&rels_name) {
            Some(xml) => Relationships::parse(xml).map_err(DocxError::xml(&rels_name))?,
            None => Relationships::default(),
        };

        let sections = main.sections.clone();
        let mut parts = vec![main];
        let mut regions = vec![Region {
            kind: RegionKind::Body,
            part_name: main_name.clone(),
            part: 0,
        }];

        for (index, section) in sections.iter().enumerate() {
            let references = section
                .headers
                .iter()
                .map(|r| (r, RegionKind::Header { section: index }))
                .chain(
                    section
                        .footers
                        .iter()
                        .map(|r| (r, RegionKind::Footer { section: index })),
                );

            for (reference, kind) in references {
                let Some(rel) = rels.by_id(&reference.rel_id).filter(|rel| !rel.external) else {
                    tracing::warn!(
                        "Section {index} {} reference points to unknown relationship '{}'",
                        reference.kind,
                        reference.rel_id
                    );
                    continue;
                };

                let name = resolve_target(&main_name, &rel.target);
                if parts.iter().any(|part| part.name == name) {
                    continue;
                }
                let Some(xml) = package.get(&name) else {
                    tracing::warn!("Section {index} references missing part '{name}'");
                    continue;
                };

                parts.push(XmlPart::parse(&name, xml).map_err(DocxError::xml(&name))?);
                regions.push(Region {
                    kind,
                    part_name: name,
                    part: parts.len() - 1,
                });
            }
        }

        tracing::debug!(
            "Opened DOCX: {} sections, {} regions",
            sections.len(),
            regions.len()
        );

        Ok(Self {
            package,
            parts,
            regions,
        })
    }

    /// Regions in traversal order: body, then each section's headers and
    /// footers. A part shared by several sections appears once.
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Paragraphs of a region: top-level paragraphs first, then table cell
    /// paragraphs row by row.
    pub fn paragraphs(&self, region: &Region) -> Vec<ParagraphId> {
        self.parts[region.part]
            .content
            .paragraph_order()
            .into_iter()
            .map(|index| ParagraphId {
                part: region.part,
                index,
            })
            .collect()
    }

    /// Text of each run of a paragraph, in order.
    pub fn run_texts(&self, paragraph: ParagraphId) -> Vec<String> {
        self.parts[paragraph.part].paragraphs[paragraph.index]
            .runs
            .iter()
            .map(|run| run.text())
            .collect()
    }

    /// Replace the text of one run, leaving its formatting alone.
    pub fn set_run_text(&mut self, paragraph: ParagraphId, run: usize, text: &str) -> bool {
        self.parts[paragraph.part].set_run_text(paragraph.index, run, text)
    }

    /// Visible text of a paragraph (its runs concatenated)
    pub fn paragraph_text(&self, paragraph: ParagraphId) -> String {
        self.parts[paragraph.part].paragraphs[paragraph.index].text()
    }

    /// Paragraph texts of a region in traversal order
    pub fn region_text(&self, region: &Region) -> Vec<String> {
        self.paragraphs(region)
            .into_iter()
            .map(|p| self.paragraph_text(p))
            .collect()
    }

    pub fn body_text(&self) -> Vec<String> {
        self.region_text(&self.regions[0])
    }

    pub fn is_modified(&self) -> bool {
        self.parts.iter().any(XmlPart::is_modified)
    }

    /// Serialize the package. Unmodified parts are written byte-for-byte.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let mut overrides = HashMap::new();
        for part in self.parts.iter().filter(|part| part.is_modified()) {
            let xml = part.to_bytes().map_err(DocxError::xml(&part.name))?;
            overrides.insert(part.name.clone(), xml);
        }
        self.package.write(&overrides)
    }
}

fn main_part_name(package: &Package) -> Result<String, DocxError> {
    let target = match package.get("_rels/.rels") {
        Some(xml) => Relationships::parse(xml)
            .map_err(DocxError::xml("_rels/.rels"))?
            .by_type(OFFICE_DOCUMENT_TYPE)
            .map(|rel| resolve_target("", &rel.target)),
        None => None,
    };
    Ok(target.unwrap_or_else(|| MAIN_DOCUMENT_PART.to_string()))
}
