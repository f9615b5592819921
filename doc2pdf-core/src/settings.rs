//! Process-wide settings
//!
//! Built once at startup and shared read-only between jobs.

use std::path::PathBuf;
use std::time::Duration;

/// Default converter executable
pub const DEFAULT_CONVERTER: &str = "libreoffice";

/// Default converter wall-clock limit
pub const DEFAULT_CONVERSION_TIMEOUT: Duration = Duration::from_secs(60);

/// Default maximum decoded document size (10 MiB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Largest allowed ratio of unpacked package size to document size
pub const UNPACKED_SIZE_RATIO: u64 = 10;

/// Default maximum number of entries in a replacement map
pub const DEFAULT_MAX_REPLACEMENTS: usize = 1000;

/// Service settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Converter executable, looked up on `PATH` when not absolute
    pub converter_command: String,
    /// Kill the converter after this long
    pub conversion_timeout: Duration,
    /// Maximum decoded document size in bytes
    pub max_file_size: usize,
    /// Maximum number of tags per request
    pub max_replacements: usize,
    /// Parent directory for per-job working directories (system temp dir if unset)
    pub work_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            converter_command: DEFAULT_CONVERTER.to_string(),
            conversion_timeout: DEFAULT_CONVERSION_TIMEOUT,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_replacements: DEFAULT_MAX_REPLACEMENTS,
            work_dir: None,
        }
    }
}

impl Settings {
    pub fn with_converter_command(mut self, command: impl Into<String>) -> Self {
        self.converter_command = command.into();
        self
    }

    pub fn with_conversion_timeout(mut self, timeout: Duration) -> Self {
        self.conversion_timeout = timeout;
        self
    }

    pub fn with_max_file_size(mut self, bytes: usize) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn with_max_replacements(mut self, count: usize) -> Self {
        self.max_replacements = count;
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Total bytes a document's package entries may decompress to.
    pub fn max_unpacked_size(&self) -> u64 {
        (self.max_file_size as u64).saturating_mul(UNPACKED_SIZE_RATIO)
    }
}
