use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, DefaultBodyLimit, Json, State},
    http::{header, HeaderName, HeaderValue, Request},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use doc2pdf::quality::Quality;
use doc2pdf::{codec, ConversionJob, ConversionStats, DocumentRenderer, Pipeline, Settings};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::request::{ConvertFileRequest, ConvertRequest, OutputType, ProcessRequest};

/// Service name reported by `/health` and `/`
pub const SERVICE_NAME: &str = "DOC2PDF Converter API";

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Room for JSON framing and the replacement map on top of the document
const BODY_OVERHEAD: usize = 1024 * 1024;

const SECURITY_HEADERS: [(&str, &str); 4] = [
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    ("x-xss-protection", "1; mode=block"),
    (
        "strict-transport-security",
        "max-age=31536000; includeSubDomains",
    ),
];

/// State shared by all handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pipeline: Pipeline,
}

impl AppState {
    /// State backed by the converter command in `settings`.
    pub fn new(settings: Settings) -> Self {
        Self {
            pipeline: Pipeline::with_libreoffice(settings),
        }
    }

    pub fn with_renderer(settings: Settings, renderer: Arc<dyn DocumentRenderer>) -> Self {
        Self {
            pipeline: Pipeline::new(Arc::new(settings), renderer),
        }
    }

    pub fn settings(&self) -> &Settings {
        self.pipeline.settings()
    }

    fn max_replacements(&self) -> usize {
        self.settings().max_replacements
    }
}

/// Response for `POST /convert`
#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub success: bool,
    /// Base64 PDF
    pub pdf: String,
    pub message: String,
    /// Seconds spent on the request
    pub processing_time: f64,
    pub stats: ConversionStats,
}

/// Largest request body accepted for a given maximum document size.
pub fn body_limit(max_file_size: usize) -> usize {
    max_file_size.div_ceil(3) * 4 + BODY_OVERHEAD
}

/// Build the application router with all routes configured
pub fn app(state: AppState) -> Router {
    let limit = body_limit(state.settings().max_file_size);

    let mut router = Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/convert", post(convert))
        .route("/convert-file", post(convert_file))
        .route("/process", post(process))
        .layer(DefaultBodyLimit::max(limit))
        .layer(CorsLayer::permissive());

    for (name, value) in SECURITY_HEADERS {
        router = router.layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }

    router
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let (method, uri) = (request.method(), request.uri());
                // Health checks hit /health constantly
                if uri.path() == "/health" {
                    tracing::debug_span!("request", %method, %uri)
                } else {
                    tracing::info_span!("request", %method, %uri)
                }
            }),
        )
        .with_state(Arc::new(state))
}

/// Health check endpoint for monitoring and load balancing
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Service description and endpoint catalog
pub async fn index() -> impl IntoResponse {
    let profiles: Vec<Value> = Quality::ALL
        .iter()
        .map(|quality| {
            let profile = quality.profile();
            json!({
                "name": quality.as_str(),
                "description": profile.description,
                "max_image_resolution": profile.max_image_resolution,
                "jpeg_quality": profile.jpeg_quality,
                "reduce_image_resolution": profile.reduce_image_resolution,
            })
        })
        .collect();

    Json(json!({
        "name": SERVICE_NAME,
        "description": "Word (DOCX) to PDF conversion with {TAG} substitution",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": {
                "path": "/health",
                "method": "GET",
                "description": "Health check"
            },
            "convert": {
                "path": "/convert",
                "method": "POST",
                "description": "Convert DOCX to PDF (returns Base64)"
            },
            "convert_file": {
                "path": "/convert-file",
                "method": "POST",
                "description": "Convert DOCX to PDF (returns a file)"
            },
            "process": {
                "path": "/process",
                "method": "POST",
                "description": "Flexible processing with several input and output types"
            }
        },
        "quality_profiles": Quality::ALL.map(Quality::as_str),
        "quality_profile_details": profiles,
        "tag_format": "{TAG}",
        "supported_formats": {
            "input": ["DOCX (Base64)", "DOCX (raw, /process only)"],
            "output": ["PDF (Base64)", "PDF (file)", "DOCX (Base64)", "DOCX (file)"]
        }
    }))
}

/// Fill a document and return the PDF as Base64
pub async fn convert(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ConvertResponse>, AppError> {
    let started = Instant::now();
    let Json(body) = payload?;
    let request = ConvertRequest::from_json(&body, state.max_replacements())?;
    let job = request.into_job();
    log_job("/convert", &job);

    let output = state.pipeline.convert(job).await?;

    Ok(Json(ConvertResponse {
        success: true,
        pdf: codec::encode(&output.pdf),
        message: "Document converted successfully".to_string(),
        processing_time: seconds(started),
        stats: output.stats,
    }))
}

/// Fill a document and return the PDF as a download
pub async fn convert_file(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) = payload?;
    let request = ConvertFileRequest::from_json(&body, state.max_replacements())?;
    let job = request.convert.into_job();
    log_job("/convert-file", &job);

    let output = state.pipeline.convert(job).await?;
    attachment(output.pdf, PDF_CONTENT_TYPE, &request.filename)
}

/// Fill a document and return it in the requested form
pub async fn process(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) = payload?;
    let request = ProcessRequest::from_json(&body, state.max_replacements())?;
    tracing::info!(
        "/process: input={:?} output={:?} quality={} ({} tags)",
        request.input_type,
        request.output_type,
        request.quality.quality,
        request.replacements.len()
    );

    let output_type = request.output_type;
    let filename = request.filename;

    if !output_type.needs_pdf() {
        let filled = state
            .pipeline
            .fill(request.input, request.replacements)
            .await?;

        return match output_type {
            OutputType::Doc => attachment(filled.bytes, DOCX_CONTENT_TYPE, &filename),
            _ => Ok(Json(json!({
                "success": true,
                "document": codec::encode(&filled.bytes),
                "message": "DOCX generated as Base64",
                "stats": { "output_size": filled.bytes.len() }
            }))
            .into_response()),
        };
    }

    let output = state
        .pipeline
        .convert(ConversionJob {
            input: request.input,
            replacements: request.replacements,
            quality: request.quality,
        })
        .await?;

    match output_type {
        OutputType::Pdf => attachment(output.pdf, PDF_CONTENT_TYPE, &filename),
        _ => Ok(Json(json!({
            "success": true,
            "pdf": codec::encode(&output.pdf),
            "message": "PDF generated as Base64",
            "stats": {
                "output_size": output.stats.output_size,
                "quality": output.stats.quality
            }
        }))
        .into_response()),
    }
}

fn log_job(route: &str, job: &ConversionJob) {
    tracing::info!(
        "{route}: {} tags, quality {}",
        job.replacements.len(),
        job.quality.quality
    );
    tracing::debug!("Tags: {:?}", job.replacements.names().collect::<Vec<_>>());
}

fn attachment(
    bytes: Vec<u8>,
    content_type: &'static str,
    filename: &str,
) -> Result<Response, AppError> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .map_err(|_| AppError::BadRequest(format!("Invalid filename '{filename}'")))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// Elapsed seconds rounded to milliseconds
fn seconds(started: Instant) -> f64 {
    (started.elapsed().as_secs_f64() * 1000.0).round() / 1000.0
}
