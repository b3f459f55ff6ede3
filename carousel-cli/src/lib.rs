//! # Carousel CLI
//!
//! Command-line host for carousel deck documents.
//!
//! ## Usage
//!
//! ```bash
//! carousel new -o deck.json --slides 3
//! carousel validate deck.json
//! carousel thumbnails deck.json -o thumbs/
//! carousel export deck.json -o deck.pdf --scale 2
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `ExportArgs` - Export options, converted into an `ExportConfig`
//! - `run` - Executes one subcommand against the filesystem

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use carousel_core::{CanvasSize, Slide, SlideDeck, MAX_SLIDES, MIN_SLIDES};
use carousel_renderer::{
    AssetLoader, AssetLoaderConfig, AssetPolicy, DeckExporter, DefaultAssetSource,
    ExportConfig, ExportDocument, ExportFormat, RenderOptions, Renderer,
};
use clap::{Args, Parser, Subcommand};

/// Command-line arguments for carousel.
#[derive(Debug, Clone, Parser)]
#[command(name = "carousel")]
#[command(about = "Carousel deck exporter and tooling")]
#[command(version)]
pub struct CliArgs {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Export a deck to PDF, PNG or SVG.
    Export(ExportArgs),
    /// Write one SVG thumbnail per slide.
    Thumbnails {
        /// Deck document to read.
        deck: PathBuf,
        /// Output directory.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Create a new deck document with empty slides.
    New {
        /// Where to write the document.
        #[arg(short, long)]
        output: PathBuf,
        /// Number of slides (1 to 10).
        #[arg(long, default_value = "1")]
        slides: usize,
        /// Canvas width in pixels.
        #[arg(long, default_value = "1080")]
        width: f32,
        /// Canvas height in pixels.
        #[arg(long, default_value = "1350")]
        height: f32,
    },
    /// Check that a deck document is well-formed.
    Validate {
        /// Deck document to read.
        deck: PathBuf,
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Options for `carousel export`.
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Deck document to read.
    pub deck: PathBuf,

    /// Output file. PNG and SVG exports write one file per slide,
    /// numbered from this path.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Output format.
    #[arg(long, default_value = "pdf")]
    pub format: ExportFormat,

    /// Pixels per canvas unit
    #[arg(long, env = "CAROUSEL_EXPORT_SCALE", default_value = "1.0")]
    pub scale: f32,

    /// What to do when an image fails to load
    #[arg(long, env = "CAROUSEL_ASSET_POLICY", default_value = "abort")]
    pub asset_policy: AssetPolicy,

    /// Per-image load timeout in seconds
    #[arg(long, env = "CAROUSEL_ASSET_TIMEOUT_SECS", default_value = "30")]
    pub asset_timeout_secs: u64,

    /// PDF document title
    #[arg(long, default_value = "Carousel Export")]
    pub title: String,
}

impl From<&ExportArgs> for ExportConfig {
    fn from(args: &ExportArgs) -> Self {
        Self {
            format: args.format,
            scale: args.scale,
            asset_policy: args.asset_policy,
            title: args.title.clone(),
            ..ExportConfig::default()
        }
    }
}

impl From<&ExportArgs> for AssetLoaderConfig {
    fn from(args: &ExportArgs) -> Self {
        Self {
            timeout: Duration::from_secs(args.asset_timeout_secs),
            ..AssetLoaderConfig::default()
        }
    }
}

/// Run a subcommand, returning the paths it wrote.
///
/// # Errors
///
/// Returns an error if a document cannot be read, is invalid, or an output
/// cannot be written.
pub async fn run(args: CliArgs) -> anyhow::Result<Vec<PathBuf>> {
    match args.command {
        Command::Export(export) => run_export(&export).await,
        Command::Thumbnails { deck, output } => write_thumbnails(&deck, &output).await,
        Command::New {
            output,
            slides,
            width,
            height,
        } => new_deck(&output, slides, CanvasSize::new(width, height))
            .await
            .map(|path| vec![path]),
        Command::Validate { deck, json } => {
            let summary = validate(&deck).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "{}: {} slides, {} elements, {} images",
                    deck.display(),
                    summary["slides"],
                    summary["elements"],
                    summary["images"]
                );
            }
            Ok(Vec::new())
        }
    }
}

/// Read and validate a deck document.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the document is invalid.
pub async fn load_deck(path: &Path) -> anyhow::Result<SlideDeck> {
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let deck = SlideDeck::from_json(&json)
        .with_context(|| format!("Invalid deck document {}", path.display()))?;
    tracing::debug!("Loaded {} with {} slides", path.display(), deck.len());
    Ok(deck)
}

async fn run_export(args: &ExportArgs) -> anyhow::Result<Vec<PathBuf>> {
    let deck = load_deck(&args.deck).await?;

    let mut source = DefaultAssetSource::new();
    if let Some(dir) = args.deck.parent() {
        source = source.with_base_dir(dir);
    }
    let exporter = DeckExporter::with_loader(
        ExportConfig::from(args),
        AssetLoader::new(source, AssetLoaderConfig::from(args)),
    );

    let document = exporter
        .export(&deck)
        .await
        .with_context(|| format!("Failed to export {}", args.deck.display()))?;
    let written = write_document(&document, &args.output).await?;
    tracing::info!("Wrote {} file(s)", written.len());
    Ok(written)
}

/// Write an exported document to disk.
///
/// PDF goes to `output` as-is; PNG and SVG pages go to
/// `<stem>-<n>.<ext>` next to it, numbered from 1.
///
/// # Errors
///
/// Returns an error if a file cannot be written.
pub async fn write_document(
    document: &ExportDocument,
    output: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let mut written = Vec::new();
    match document.format {
        ExportFormat::Pdf => {
            let pdf = document
                .pdf
                .as_deref()
                .context("PDF export produced no document")?;
            write_file(output, pdf).await?;
            written.push(output.to_path_buf());
        }
        ExportFormat::Png | ExportFormat::Svg => {
            for page in &document.pages {
                let path = numbered_path(output, page.index + 1, document.format.extension());
                let bytes = match document.format {
                    ExportFormat::Png => page
                        .png
                        .as_deref()
                        .with_context(|| format!("Page {} was not rasterized", page.index + 1))?,
                    ExportFormat::Svg | ExportFormat::Pdf => page.svg.as_bytes(),
                };
                write_file(&path, bytes).await?;
                written.push(path);
            }
        }
    }
    Ok(written)
}

async fn write_thumbnails(deck_path: &Path, output: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let deck = load_deck(deck_path).await?;
    tokio::fs::create_dir_all(output)
        .await
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let mut renderer = Renderer::thumbnails(deck.canvas());
    let mut written = Vec::with_capacity(deck.len());
    for (i, slide) in deck.slides().iter().enumerate() {
        let svg = renderer.render_slide(slide, &RenderOptions::default())?;
        let path = output.join(format!("slide-{}.svg", i + 1));
        write_file(&path, svg.as_bytes()).await?;
        written.push(path);
    }
    tracing::info!("Wrote {} thumbnails to {}", written.len(), output.display());
    Ok(written)
}

/// Create a new deck document with `slides` empty slides.
///
/// # Errors
///
/// Returns an error if `slides` is outside the allowed range or the file
/// cannot be written.
pub async fn new_deck(output: &Path, slides: usize, canvas: CanvasSize) -> anyhow::Result<PathBuf> {
    if !(MIN_SLIDES..=MAX_SLIDES).contains(&slides) {
        bail!("A deck holds {MIN_SLIDES} to {MAX_SLIDES} slides, got {slides}");
    }
    let positive = |v: f32| v.is_finite() && v > 0.0;
    if !positive(canvas.width) || !positive(canvas.height) {
        bail!("Canvas size must be positive, got {}x{}", canvas.width, canvas.height);
    }

    let mut deck = SlideDeck::new(canvas);
    for _ in 1..slides {
        deck.add_slide()?;
    }
    deck.set_current(0);
    write_file(output, deck.to_json()?.as_bytes()).await?;
    Ok(output.to_path_buf())
}

/// Validate a deck document and summarize it.
///
/// # Errors
///
/// Returns an error if the document cannot be read or is invalid.
pub async fn validate(path: &Path) -> anyhow::Result<serde_json::Value> {
    let deck = load_deck(path).await?;
    let elements: usize = deck.slides().iter().map(Slide::element_count).sum();
    let images: usize = deck
        .slides()
        .iter()
        .map(|s| s.image_sources().count())
        .sum();
    Ok(serde_json::json!({
        "slides": deck.len(),
        "elements": elements,
        "images": images,
        "canvas": { "width": deck.canvas().width, "height": deck.canvas().height },
    }))
}

fn numbered_path(output: &Path, number: usize, extension: &str) -> PathBuf {
    let stem = output
        .file_stem()
        .map_or_else(|| "slide".into(), |s| s.to_string_lossy());
    output.with_file_name(format!("{stem}-{number}.{extension}"))
}

async fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_path() {
        assert_eq!(
            numbered_path(Path::new("out/deck.png"), 3, "png"),
            PathBuf::from("out/deck-3.png")
        );
        assert_eq!(
            numbered_path(Path::new("deck"), 1, "svg"),
            PathBuf::from("deck-1.svg")
        );
    }

    #[test]
    fn test_export_args_into_config() {
        let args = CliArgs::parse_from([
            "carousel",
            "export",
            "deck.json",
            "-o",
            "deck.pdf",
            "--format",
            "png",
            "--scale",
            "2",
            "--asset-policy",
            "placeholder",
        ]);
        let Command::Export(export) = args.command else {
            panic!("expected export");
        };
        let config = ExportConfig::from(&export);
        assert_eq!(config.format, ExportFormat::Png);
        assert!((config.scale - 2.0).abs() < f32::EPSILON);
        assert_eq!(config.asset_policy, AssetPolicy::Placeholder);
        assert_eq!(
            AssetLoaderConfig::from(&export).timeout,
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result = CliArgs::try_parse_from([
            "carousel", "export", "deck.json", "-o", "x", "--format", "gif",
        ]);
        assert!(result.is_err());
    }
}
