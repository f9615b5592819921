//! # doc2pdf-api
//!
//! REST API server for the doc2pdf library
//!

mod api;
pub mod config;
mod error;
pub mod request;

pub use api::{
    app, body_limit, convert, convert_file, health_check, index, process, AppState,
    ConvertResponse, DOCX_CONTENT_TYPE, PDF_CONTENT_TYPE, SERVICE_NAME,
};
pub use error::{AppError, ErrorResponse, GENERIC_PROCESSING_ERROR};
