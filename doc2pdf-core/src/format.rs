//! Document format sniffing
//!
//! Classifies an uploaded byte buffer by its leading magic bytes before any
//! attempt is made to open it as a zip package. The package reader's own
//! errors say little to a caller who uploaded, say, a Word 97 file; the
//! messages here tell them what to do instead.

use thiserror::Error;

/// Zip local file header prefix. DOCX packages are zip archives.
pub const ZIP_MAGIC: [u8; 2] = [0x50, 0x4B];

/// OLE2 compound file signature used by `.doc` (Word 97-2003).
pub const COMPOUND_FILE_MAGIC: [u8; 4] = [0xD0, 0xCF, 0x11, 0xE0];

/// Minimum number of bytes needed to classify a buffer.
pub const MIN_DOCUMENT_LEN: usize = 4;

/// Number of leading bytes inspected for the plain-text check.
const TEXT_PREFIX_LEN: usize = 5;

/// Supported container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Zip-based Office Open XML package (DOCX, Word 2007+)
    OfficeOpenXml,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("File is too small to be a valid DOCX document ({len} bytes)")]
    TooSmall { len: usize },

    #[error("The .DOC format (Word 97-2003) is not supported. Please convert the file to .DOCX first")]
    LegacyFormatUnsupported,

    #[error("File does not look like a Word document. Make sure to send a valid .DOCX file encoded in Base64")]
    NotADocument,

    #[error("Unrecognized file format (leading bytes: {magic}). Only .DOCX files (Word 2007+) are supported")]
    UnrecognizedFormat { magic: String },
}

/// Classify a document buffer by its magic number.
pub fn classify(bytes: &[u8]) -> Result<DocumentFormat, FormatError> {
    if bytes.len() < MIN_DOCUMENT_LEN {
        return Err(FormatError::TooSmall { len: bytes.len() });
    }

    if bytes.starts_with(&ZIP_MAGIC) {
        tracing::info!("DOCX format detected (zip container)");
        return Ok(DocumentFormat::OfficeOpenXml);
    }

    if bytes.starts_with(&COMPOUND_FILE_MAGIC) {
        tracing::warn!("Legacy .DOC (compound file) document rejected");
        return Err(FormatError::LegacyFormatUnsupported);
    }

    if looks_like_text(&bytes[..bytes.len().min(TEXT_PREFIX_LEN)]) {
        tracing::warn!("Document looks like plain text, not DOCX");
        return Err(FormatError::NotADocument);
    }

    let magic = hex_prefix(bytes, 8);
    tracing::error!("Unrecognized document format, leading bytes: {magic}");
    Err(FormatError::UnrecognizedFormat { magic })
}

/// Undecodable bytes are dropped and every remaining character must be
/// printable. A prefix where nothing decodes counts as text.
fn looks_like_text(prefix: &[u8]) -> bool {
    String::from_utf8_lossy(prefix)
        .chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER)
        .all(is_printable)
}

/// Space is the only printable whitespace.
fn is_printable(c: char) -> bool {
    c == ' ' || !(c.is_control() || c.is_whitespace())
}

fn hex_prefix(bytes: &[u8], len: usize) -> String {
    bytes
        .iter()
        .take(len)
        .map(|b| format!("{b:02x}"))
        .collect()
}
