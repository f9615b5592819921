use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use doc2pdf::{Doc2PdfError, RenderError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::request::RequestError;

/// Message returned for failures whose details stay in the server log
pub const GENERIC_PROCESSING_ERROR: &str = "Error processing document";

/// Standard error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message describing what went wrong
    pub error: String,
}

/// Application-specific error types for the API
#[derive(Error, Debug)]
pub enum AppError {
    /// The request was malformed or failed validation (400)
    #[error("{0}")]
    BadRequest(String),

    /// The body exceeded the configured limit (413)
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Processing failed on the server side (500)
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_response = ErrorResponse {
            error: self.to_string(),
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<RequestError> for AppError {
    fn from(err: RequestError) -> Self {
        tracing::warn!("Validation error: {err}");
        AppError::BadRequest(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::warn!("Rejected body: {}", rejection.body_text());
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                AppError::BadRequest("Content-Type must be application/json".to_string())
            }
            other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                AppError::PayloadTooLarge("Request body too large".to_string())
            }
            other => AppError::BadRequest(format!("Invalid JSON body: {}", other.body_text())),
        }
    }
}

impl From<Doc2PdfError> for AppError {
    fn from(err: Doc2PdfError) -> Self {
        if err.is_client_error() {
            tracing::warn!("Validation error: {err}");
            return AppError::BadRequest(err.to_string());
        }

        tracing::error!("Processing failed: {err}");
        match err {
            // Actionable for the caller, so it is surfaced as is
            Doc2PdfError::Render(RenderError::Timeout { .. }) => {
                AppError::Internal(err.to_string())
            }
            _ => AppError::Internal(GENERIC_PROCESSING_ERROR.to_string()),
        }
    }
}
