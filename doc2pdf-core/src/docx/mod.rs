//! DOCX documents
//!
//! Opens an Office Open XML package, indexes the main document part and every
//! header/footer part referenced by its sections, and writes the package back
//! with only the modified parts re-serialized.

mod document;
mod package;
mod part;
mod rels;

pub use document::{Document, ParagraphId, Region, RegionKind};

use thiserror::Error;

/// Default location of the main document part
pub const MAIN_DOCUMENT_PART: &str = "word/document.xml";

/// Unpacked size limit used by [`Document::from_bytes`] (100 MiB)
pub const DEFAULT_MAX_UNPACKED_SIZE: u64 = 100 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum DocxError {
    #[error("not a valid zip package: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("malformed XML in '{part}': {source}")]
    Xml {
        part: String,
        #[source]
        source: quick_xml::Error,
    },

    #[error("package expands to more than {limit} bytes when unpacked")]
    TooLarge { limit: u64 },

    #[error("missing package part '{0}'")]
    MissingPart(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocxError {
    pub(crate) fn xml(part: &str) -> impl FnOnce(quick_xml::Error) -> DocxError + '_ {
        move |source| DocxError::Xml {
            part: part.to_string(),
            source,
        }
    }
}
