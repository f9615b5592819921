//! Server configuration from command-line flags and environment variables

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use doc2pdf::settings::{
    Settings, DEFAULT_CONVERTER, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_REPLACEMENTS,
};

/// Filter used when neither `RUST_LOG` nor `--log-level` is given
pub const DEFAULT_LOG_FILTER: &str = "doc2pdf=info,doc2pdf_api=info,tower_http=info";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "doc2pdf-api",
    about = "DOCX tag substitution and PDF export over HTTP",
    version
)]
pub struct ServerArgs {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Converter executable
    #[arg(long = "converter", env = "LIBREOFFICE_COMMAND", default_value = DEFAULT_CONVERTER)]
    pub converter: String,

    /// Converter timeout in seconds
    #[arg(long = "timeout", env = "CONVERSION_TIMEOUT", default_value_t = 60)]
    pub timeout_secs: u64,

    /// Maximum decoded document size in bytes
    #[arg(long, env = "MAX_FILE_SIZE", default_value_t = DEFAULT_MAX_FILE_SIZE)]
    pub max_file_size: usize,

    /// Maximum number of tags per request
    #[arg(long, env = "MAX_REPLACEMENTS", default_value_t = DEFAULT_MAX_REPLACEMENTS)]
    pub max_replacements: usize,

    /// Parent directory for per-request working directories
    #[arg(long, env = "DOC2PDF_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// Log filter, e.g. `info` or `doc2pdf=debug` (RUST_LOG takes precedence)
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl ServerArgs {
    pub fn settings(&self) -> Settings {
        let settings = Settings::default()
            .with_converter_command(self.converter.clone())
            .with_conversion_timeout(Duration::from_secs(self.timeout_secs))
            .with_max_file_size(self.max_file_size)
            .with_max_replacements(self.max_replacements);

        match &self.work_dir {
            Some(dir) => settings.with_work_dir(dir),
            None => settings,
        }
    }

    /// Resolve `host` and `port` to the address to bind.
    ///
    /// Accepts IPv4 and IPv6 literals (bracketed or not) and host names.
    pub async fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let host = self.host.trim();
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        tokio::net::lookup_host((host, self.port))
            .await
            .with_context(|| format!("Failed to resolve bind address '{}'", self.host))?
            .next()
            .with_context(|| format!("No address found for host '{}'", self.host))
    }

    /// Filter directive for the log subscriber.
    ///
    /// A bare level such as `DEBUG` applies to the service crates only.
    pub fn log_filter(&self) -> String {
        match self.log_level.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_LOG_FILTER.to_string(),
            Some(level) if !level.contains('=') => {
                let level = level.to_ascii_lowercase();
                format!("doc2pdf={level},doc2pdf_api={level},tower_http={level}")
            }
            Some(directives) => directives.to_string(),
        }
    }
}
