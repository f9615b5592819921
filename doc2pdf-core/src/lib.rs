//! # doc2pdf
//!
//! Fill `{TAG}` placeholders in DOCX documents and export the result to PDF
//! through an external office converter.
//!
//! ## Features
//!
//! - **Format sniffing**: zip-based documents are accepted; legacy binary
//!   `.doc` files, plain text and unknown data are rejected with a hint
//! - **Tag substitution**: body paragraphs, table cells, headers and footers,
//!   one run at a time, without touching run formatting
//! - **Lossless write-back**: untouched XML and package entries are written
//!   back as they were read
//! - **Quality profiles**: `high`, `medium` and `low` image settings for the
//!   PDF export filter
//! - **Pluggable rendering**: the converter sits behind [`DocumentRenderer`];
//!   [`LibreOfficeRenderer`] drives a headless LibreOffice process
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc2pdf::{quality, ConversionJob, DocumentInput, Pipeline, Settings, TagMap};
//!
//! # async fn run() -> doc2pdf::Result<()> {
//! let pipeline = Pipeline::with_libreoffice(Settings::default());
//!
//! let mut replacements = TagMap::new();
//! replacements.insert("nome", "Ana")?;
//!
//! let output = pipeline
//!     .convert(ConversionJob {
//!         input: DocumentInput::Raw(std::fs::read("contract.docx")?),
//!         replacements,
//!         quality: quality::resolve(Some("medium")),
//!     })
//!     .await?;
//!
//! std::fs::write("contract.pdf", &output.pdf)?;
//! println!("{} bytes", output.stats.output_size);
//! # Ok(())
//! # }
//! ```
//!
//! Tokens are only found when they lie entirely inside one run. A token
//! that the word processor split across runs stays in the output as typed.

pub mod codec;
pub mod docx;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod quality;
pub mod render;
pub mod settings;
pub mod substitute;
pub mod tags;

pub use docx::{Document, DocxError};
pub use error::{Doc2PdfError, Result};
pub use format::{classify, DocumentFormat, FormatError};
pub use pipeline::{
    ConversionJob, ConversionOutput, ConversionStats, DocumentInput, FilledDocument, Pipeline,
};
pub use quality::{Quality, QualityProfile};
pub use render::{DocumentRenderer, LibreOfficeRenderer, RenderError};
pub use settings::Settings;
pub use substitute::{substitute, SubstitutionReport};
pub use tags::{TagError, TagMap};

/// Current version of doc2pdf
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
