use thiserror::Error;

use crate::codec::CodecError;
use crate::docx::DocxError;
use crate::format::FormatError;
use crate::render::RenderError;
use crate::tags::TagError;

#[derive(Error, Debug)]
pub enum Doc2PdfError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Tags(#[from] TagError),

    #[error("Invalid DOCX file: {0}")]
    DocumentParse(#[from] DocxError),

    #[error("Document too large: {size} bytes (maximum: {max} bytes)")]
    DocumentTooLarge { size: usize, max: usize },

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Doc2PdfError {
    /// Whether the failure was caused by the caller's input rather than by
    /// the service or the converter.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Doc2PdfError::Codec(_)
                | Doc2PdfError::Format(_)
                | Doc2PdfError::Tags(_)
                | Doc2PdfError::DocumentParse(_)
                | Doc2PdfError::DocumentTooLarge { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Doc2PdfError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};
    use std::time::Duration;

    #[test]
    fn test_client_errors() {
        let errors = vec![
            Doc2PdfError::from(CodecError::InvalidBase64("bad".to_string())),
            Doc2PdfError::from(FormatError::LegacyFormatUnsupported),
            Doc2PdfError::from(TagError::NotAnObject),
            Doc2PdfError::from(DocxError::MissingPart("word/document.xml".to_string())),
            Doc2PdfError::DocumentTooLarge { size: 20, max: 10 },
        ];

        for error in errors {
            assert!(
                error.is_client_error(),
                "{error:?} should be a client error"
            );
        }
    }

    #[test]
    fn test_server_errors() {
        let errors = vec![
            Doc2PdfError::from(RenderError::Timeout {
                limit: Duration::from_secs(60),
            }),
            Doc2PdfError::from(IoError::new(ErrorKind::Other, "disk full")),
            Doc2PdfError::Internal("join error".to_string()),
        ];

        for error in errors {
            assert!(
                !error.is_client_error(),
                "{error:?} should be a server error"
            );
        }
    }

    #[test]
    fn test_document_parse_display() {
        let error = Doc2PdfError::from(DocxError::MissingPart("word/document.xml".to_string()));
        assert_eq!(
            error.to_string(),
            "Invalid DOCX file: missing package part 'word/document.xml'"
        );
    }

    #[test]
    fn test_format_error_is_transparent() {
        let error = Doc2PdfError::from(FormatError::TooSmall { len: 2 });
        assert_eq!(
            error.to_string(),
            FormatError::TooSmall { len: 2 }.to_string()
        );
    }
}
