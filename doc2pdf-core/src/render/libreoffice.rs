use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;

use super::{DocumentRenderer, RenderError};
use crate::quality::QualityProfile;
use crate::settings::Settings;

/// Flags that keep a converter run non-interactive and free of session state
pub const CONVERTER_OPTIONS: [&str; 8] = [
    "--headless",
    "--invisible",
    "--nocrashreport",
    "--nodefault",
    "--nofirststartwizard",
    "--nolockcheck",
    "--nologo",
    "--norestore",
];

/// Directory under the output directory used as the converter's `HOME`
const PROFILE_DIR: &str = ".home";

/// Renders through a `soffice`/`libreoffice` command line, one process per
/// document.
#[derive(Debug, Clone)]
pub struct LibreOfficeRenderer {
    command: String,
    timeout: Duration,
}

impl LibreOfficeRenderer {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.converter_command.clone(),
            settings.conversion_timeout,
        )
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Full argument list for one conversion.
    pub fn arguments(document: &Path, outdir: &Path, profile: &QualityProfile) -> Vec<OsString> {
        let mut args: Vec<OsString> = CONVERTER_OPTIONS
            .iter()
            .map(|option| OsString::from(*option))
            .collect();
        args.push("--convert-to".into());
        args.push(format!("pdf:writer_pdf_Export:{{{}}}", filter_options(profile)).into());
        args.push("--outdir".into());
        args.push(outdir.as_os_str().to_owned());
        args.push(document.as_os_str().to_owned());
        args
    }
}

/// `:`-joined PDF export filter settings for a profile.
pub(crate) fn filter_options(profile: &QualityProfile) -> String {
    [
        "SelectPdfVersion=1".to_string(),
        "UseTaggedPDF=true".to_string(),
        "ExportBookmarks=true".to_string(),
        "ExportNotes=false".to_string(),
        format!("Quality={}", profile.jpeg_quality),
        format!("ReduceImageResolution={}", profile.reduce_image_resolution),
        format!("MaxImageResolution={}", profile.max_image_resolution),
        "ExportFormFields=true".to_string(),
        "FormsType=0".to_string(),
        "EmbedStandardFonts=false".to_string(),
    ]
    .join(":")
}

#[async_trait]
impl DocumentRenderer for LibreOfficeRenderer {
    async fn export_pdf(
        &self,
        document: &Path,
        output: &Path,
        profile: &QualityProfile,
    ) -> Result<(), RenderError> {
        let outdir = output
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        // Private profile directory so concurrent runs never share a lock
        let home = outdir.join(PROFILE_DIR);
        tokio::fs::create_dir_all(&home).await?;

        let args = Self::arguments(document, outdir, profile);
        tracing::debug!("Running {} {:?}", self.command, args);
        tracing::info!(
            "Exporting PDF: {} ({} DPI, JPEG {}%)",
            profile.description,
            profile.max_image_resolution,
            profile.jpeg_quality
        );

        let child = Command::new(&self.command)
            .args(&args)
            .env("HOME", &home)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RenderError::ConverterUnavailable {
                command: self.command.clone(),
                source,
            })?;

        let started = Instant::now();
        // Dropping the child on timeout kills it
        let result = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                tracing::error!(
                    "Converter timed out after {:?} (limit: {}s)",
                    started.elapsed(),
                    self.timeout.as_secs()
                );
                RenderError::Timeout {
                    limit: self.timeout,
                }
            })?;
        let result = result?;

        let stdout = String::from_utf8_lossy(&result.stdout);
        let stderr = String::from_utf8_lossy(&result.stderr);
        if !result.status.success() {
            tracing::error!("Converter failed ({})", result.status);
            tracing::error!("stdout: {stdout}");
            tracing::error!("stderr: {stderr}");
            return Err(RenderError::ConversionFailed {
                status: result.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        tracing::debug!("Converter output: {}", stdout.trim());

        // The converter names its output after the input file
        let stem = document.file_stem().unwrap_or(document.as_os_str());
        let mut produced = outdir.join(stem);
        produced.set_extension("pdf");

        if !tokio::fs::try_exists(&produced).await? {
            return Err(RenderError::OutputNotProduced { expected: produced });
        }
        if produced != output {
            tokio::fs::rename(&produced, output).await?;
            tracing::debug!("Renamed {} to {}", produced.display(), output.display());
        }

        tracing::info!("PDF exported in {:.2?}", started.elapsed());
        Ok(())
    }
}
