//! Request validation
//!
//! Bodies are accepted as loose JSON and checked field by field before any
//! document processing starts, so every validation failure carries a
//! message naming the offending field.

use doc2pdf::quality::{self, QualityProfile};
use doc2pdf::{ConversionJob, DocumentInput, TagError, TagMap};
use serde_json::{Map, Value};
use thiserror::Error;

/// Default download name, without extension
pub const DEFAULT_FILENAME: &str = "documento";

pub const PDF_EXTENSION: &str = ".pdf";
pub const DOCX_EXTENSION: &str = ".docx";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Field \"{0}\" is required")]
    MissingField(&'static str),

    #[error("Fields \"document\" and \"replacements\" are required")]
    MissingDocumentOrReplacements,

    #[error("Field \"{field}\" must be a string")]
    NotAString { field: &'static str },

    #[error("Invalid input_type '{0}'. Use: base64, doc")]
    InvalidInputType(String),

    #[error("Invalid output_type '{0}'. Use: pdf, doc, base64_pdf, base64_doc")]
    InvalidOutputType(String),

    #[error(transparent)]
    Tags(#[from] TagError),
}

/// Body of `POST /convert`
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    /// Base64 text of the document
    pub document: String,
    pub replacements: TagMap,
    pub quality: &'static QualityProfile,
}

impl ConvertRequest {
    pub fn from_json(body: &Value, max_replacements: usize) -> Result<Self, RequestError> {
        let object = body.as_object().ok_or(RequestError::NotAnObject)?;
        let document = object
            .get("document")
            .ok_or(RequestError::MissingField("document"))?;
        let replacements = object
            .get("replacements")
            .ok_or(RequestError::MissingField("replacements"))?;

        Ok(Self {
            document: string_field("document", document)?.to_string(),
            replacements: TagMap::from_json(replacements, max_replacements)?,
            quality: quality_field(object),
        })
    }

    pub fn into_job(self) -> ConversionJob {
        ConversionJob {
            input: DocumentInput::Base64(self.document),
            replacements: self.replacements,
            quality: self.quality,
        }
    }
}

/// Body of `POST /convert-file`
#[derive(Debug, Clone)]
pub struct ConvertFileRequest {
    pub convert: ConvertRequest,
    /// Normalized download name
    pub filename: String,
}

impl ConvertFileRequest {
    pub fn from_json(body: &Value, max_replacements: usize) -> Result<Self, RequestError> {
        let convert = ConvertRequest::from_json(body, max_replacements)?;
        let filename = optional_string(body, "filename")?;

        Ok(Self {
            convert,
            filename: normalize_filename(filename, PDF_EXTENSION),
        })
    }
}

/// How `document` is encoded in a `/process` body
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum InputType {
    #[default]
    Base64,
    /// The field carries the document text itself
    Doc,
}

impl InputType {
    pub fn parse(name: &str) -> Result<Self, RequestError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "base64" => Ok(InputType::Base64),
            "doc" => Ok(InputType::Doc),
            _ => Err(RequestError::InvalidInputType(name.to_string())),
        }
    }
}

/// What `/process` sends back
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    /// PDF download
    #[default]
    Pdf,
    /// Filled DOCX download
    Doc,
    /// PDF as base64 inside JSON
    Base64Pdf,
    /// Filled DOCX as base64 inside JSON
    Base64Doc,
}

impl OutputType {
    pub fn parse(name: &str) -> Result<Self, RequestError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(OutputType::Pdf),
            "doc" => Ok(OutputType::Doc),
            "base64_pdf" => Ok(OutputType::Base64Pdf),
            "base64_doc" => Ok(OutputType::Base64Doc),
            _ => Err(RequestError::InvalidOutputType(name.to_string())),
        }
    }

    /// Whether the converter has to run
    pub fn needs_pdf(self) -> bool {
        matches!(self, OutputType::Pdf | OutputType::Base64Pdf)
    }

    pub fn extension(self) -> &'static str {
        if self.needs_pdf() {
            PDF_EXTENSION
        } else {
            DOCX_EXTENSION
        }
    }
}

/// Body of `POST /process`
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    pub input: DocumentInput,
    pub replacements: TagMap,
    pub quality: &'static QualityProfile,
    pub input_type: InputType,
    pub output_type: OutputType,
    /// Normalized download name, extension matching `output_type`
    pub filename: String,
}

impl ProcessRequest {
    pub fn from_json(body: &Value, max_replacements: usize) -> Result<Self, RequestError> {
        let object = body.as_object().ok_or(RequestError::NotAnObject)?;
        let (Some(document), Some(replacements)) =
            (object.get("document"), object.get("replacements"))
        else {
            return Err(RequestError::MissingDocumentOrReplacements);
        };

        let input_type = match optional_string(body, "input_type")? {
            Some(name) => InputType::parse(name)?,
            None => InputType::default(),
        };
        let output_type = match optional_string(body, "output_type")? {
            Some(name) => OutputType::parse(name)?,
            None => OutputType::default(),
        };
        let filename = optional_string(body, "filename")?;

        let document = string_field("document", document)?;
        let input = match input_type {
            InputType::Base64 => DocumentInput::Base64(document.to_string()),
            InputType::Doc => DocumentInput::Raw(document.as_bytes().to_vec()),
        };

        Ok(Self {
            input,
            replacements: TagMap::from_json(replacements, max_replacements)?,
            quality: quality_field(object),
            input_type,
            output_type,
            filename: normalize_filename(filename, output_type.extension()),
        })
    }
}

fn string_field<'a>(field: &'static str, value: &'a Value) -> Result<&'a str, RequestError> {
    value.as_str().ok_or(RequestError::NotAString { field })
}

/// A string field that may be absent or `null`.
fn optional_string<'a>(
    body: &'a Value,
    field: &'static str,
) -> Result<Option<&'a str>, RequestError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => string_field(field, value).map(Some),
    }
}

/// Quality never fails validation: anything unusable means "high".
fn quality_field(object: &Map<String, Value>) -> &'static QualityProfile {
    match object.get("quality") {
        None | Some(Value::Null) => quality::resolve(None),
        Some(Value::String(name)) => quality::resolve(Some(name)),
        Some(other) => {
            tracing::warn!("Non-string quality {other}, falling back to 'high'");
            quality::resolve(None)
        }
    }
}

/// Make a caller-supplied name safe for `Content-Disposition`.
///
/// Empty names become [`DEFAULT_FILENAME`]; path separators, quotes and
/// control characters become `_`; `extension` is appended unless present.
pub fn normalize_filename(name: Option<&str>, extension: &str) -> String {
    let name = name.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return format!("{DEFAULT_FILENAME}{extension}");
    }

    let mut safe: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '"' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if !safe.to_lowercase().ends_with(extension) {
        safe.push_str(extension);
    }
    safe
}
