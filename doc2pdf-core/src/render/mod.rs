//! PDF export
//!
//! Rendering is delegated to an external office converter. The pipeline only
//! talks to the [`DocumentRenderer`] trait, so tests can swap the converter
//! process for an in-process fake.

mod libreoffice;

pub use libreoffice::{LibreOfficeRenderer, CONVERTER_OPTIONS};

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::quality::QualityProfile;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(
        "Document conversion timed out after {}s. The document may be too large or complex.",
        limit.as_secs()
    )]
    Timeout { limit: Duration },

    #[error("Converter exited with {status}: {stderr}")]
    ConversionFailed { status: String, stderr: String },

    #[error("PDF was not produced by the converter (expected {})", expected.display())]
    OutputNotProduced { expected: PathBuf },

    #[error("Converter '{command}' could not be started: {source}")]
    ConverterUnavailable {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns a DOCX file on disk into a PDF file on disk.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    /// Export `document` to `output` using the image settings of `profile`.
    ///
    /// On success `output` exists. Scratch files may be left next to
    /// `output`; callers own the directory and remove it.
    async fn export_pdf(
        &self,
        document: &Path,
        output: &Path,
        profile: &QualityProfile,
    ) -> Result<(), RenderError>;
}
