use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use doc2pdf::pipeline::read_document;
use doc2pdf::quality::{resolve, Quality};
use doc2pdf::settings::{DEFAULT_CONVERTER, DEFAULT_MAX_REPLACEMENTS};
use doc2pdf::tags::value_text;
use doc2pdf::{ConversionJob, Pipeline, Settings, TagMap};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "doc2pdf",
    about = "Fill {TAG} placeholders in Word documents and export them to PDF",
    version,
    author
)]
struct Cli {
    /// Show pipeline progress on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Substitute tags and write the filled DOCX
    Fill {
        /// Input DOCX file
        input: PathBuf,

        /// Output DOCX file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        tags: TagArgs,
    },

    /// Substitute tags and export the result to PDF
    Convert {
        /// Input DOCX file
        input: PathBuf,

        /// Output PDF file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        tags: TagArgs,

        /// Quality profile: high, medium or low
        #[arg(short, long, default_value = "high")]
        quality: String,

        /// Converter executable
        #[arg(long, env = "LIBREOFFICE_COMMAND", default_value = DEFAULT_CONVERTER)]
        converter: String,

        /// Converter timeout in seconds
        #[arg(long, default_value_t = 60)]
        timeout: u64,
    },

    /// List the quality profiles
    Profiles,
}

#[derive(Args)]
struct TagArgs {
    /// Tag value as KEY=VALUE (repeatable)
    #[arg(short = 'r', long = "replace", value_name = "KEY=VALUE")]
    replace: Vec<String>,

    /// JSON object of tag values; -r entries are applied after it
    #[arg(long = "replacements", value_name = "FILE")]
    replacements_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Fill {
            input,
            output,
            tags,
        } => {
            let replacements = tags.tag_map()?;
            let pipeline = Pipeline::with_libreoffice(Settings::default());

            let document = read_document(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let filled = pipeline
                .fill(document, replacements)
                .await
                .with_context(|| format!("Failed to fill {}", input.display()))?;

            write_output(&output, &filled.bytes).await?;
            println!(
                "✓ Filled document written to {} ({} occurrence(s) in {} run(s))",
                output.display(),
                filled.report.occurrences,
                filled.report.runs_rewritten
            );
            for (tag, count) in &filled.report.by_tag {
                println!("  {tag}: {count}");
            }
        }

        Commands::Convert {
            input,
            output,
            tags,
            quality,
            converter,
            timeout,
        } => {
            let replacements = tags.tag_map()?;
            let settings = Settings::default()
                .with_converter_command(converter)
                .with_conversion_timeout(Duration::from_secs(timeout));
            let pipeline = Pipeline::with_libreoffice(settings);

            let document = read_document(&input)
                .await
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let output_pdf = pipeline
                .convert(ConversionJob {
                    input: document,
                    replacements,
                    quality: resolve(Some(quality.as_str())),
                })
                .await
                .with_context(|| format!("Failed to convert {}", input.display()))?;

            write_output(&output, &output_pdf.pdf).await?;
            println!(
                "✓ PDF written to {} ({} bytes, quality {})",
                output.display(),
                output_pdf.stats.output_size,
                output_pdf.stats.quality
            );
        }

        Commands::Profiles => {
            for quality in Quality::ALL {
                let profile = quality.profile();
                println!(
                    "{:<8} {:>4} dpi  jpeg {:>3}  reduce images: {:<5}  {}",
                    quality.as_str(),
                    profile.max_image_resolution,
                    profile.jpeg_quality,
                    if profile.reduce_image_resolution { "yes" } else { "no" },
                    profile.description
                );
            }
        }
    }

    Ok(())
}

impl TagArgs {
    fn tag_map(&self) -> Result<TagMap> {
        let mut pairs = Vec::new();

        if let Some(path) = &self.replacements_file {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let value: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("{} is not valid JSON", path.display()))?;
            let Some(object) = value.as_object() else {
                bail!("{} must contain a JSON object", path.display());
            };
            pairs.extend(
                object
                    .iter()
                    .map(|(name, value)| (name.clone(), value_text(value))),
            );
        }

        for entry in &self.replace {
            let Some((name, value)) = entry.split_once('=') else {
                bail!("Invalid replacement '{entry}', expected KEY=VALUE");
            };
            pairs.push((name.trim().to_string(), value.to_string()));
        }

        Ok(TagMap::from_pairs(pairs, DEFAULT_MAX_REPLACEMENTS)?)
    }
}

async fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn init_logging(verbose: bool) {
    let default = if verbose { "doc2pdf=info" } else { "doc2pdf=error" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
