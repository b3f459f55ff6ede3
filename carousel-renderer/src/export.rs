//! Deck export to SVG, PNG and multi-page PDF.
//!
//! Export is two-phase. First every image referenced by any slide is loaded
//! and decoded; nothing is composited until all loads have settled. Then
//! each slide is rendered at the export scale, painted to SVG and, for PNG
//! and PDF, rasterized with resvg/tiny-skia. A PDF gets one page per slide.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use carousel_core::{DeckSnapshot, ElementId, ElementKind, SlideDeck, SlideId};
use serde::{Deserialize, Serialize};

use crate::assets::AssetLoader;
use crate::backend::svg::SvgBackend;
use crate::backend::RenderBackend;
use crate::error::{RenderError, RenderResult};
use crate::image::create_placeholder;
use crate::render::render;

/// Export output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// One SVG document per slide.
    Svg,
    /// One PNG image per slide.
    Png,
    /// A single PDF with one page per slide.
    #[default]
    Pdf,
}

impl ExportFormat {
    /// Conventional file extension.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            "pdf" => Ok(Self::Pdf),
            other => Err(RenderError::Export(format!("unknown export format '{other}'"))),
        }
    }
}

/// What to do when an image cannot be loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetPolicy {
    /// Fail the whole export, naming the slide.
    #[default]
    Abort,
    /// Draw a checkerboard in place of the image and log a warning.
    Placeholder,
}

impl fmt::Display for AssetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abort => f.write_str("abort"),
            Self::Placeholder => f.write_str("placeholder"),
        }
    }
}

impl FromStr for AssetPolicy {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "placeholder" => Ok(Self::Placeholder),
            other => Err(RenderError::Export(format!("unknown asset policy '{other}'"))),
        }
    }
}

/// Configuration for deck export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Output format.
    pub format: ExportFormat,
    /// Pixels per canvas unit (e.g. 2.0 for retina).
    pub scale: f32,
    /// DPI used to size PDF pages (default: 96.0).
    pub dpi: f32,
    /// Image failure policy.
    pub asset_policy: AssetPolicy,
    /// PDF document title.
    pub title: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            scale: 1.0,
            dpi: 96.0,
            asset_policy: AssetPolicy::default(),
            title: "Carousel Export".to_string(),
        }
    }
}

/// One exported slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedPage {
    /// Zero-based slide position.
    pub index: usize,
    /// Source slide.
    pub slide_id: SlideId,
    /// The composited page as SVG.
    pub svg: String,
    /// The rasterized page, for PNG and PDF exports.
    pub png: Option<Vec<u8>>,
}

/// Result of exporting a deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    /// Requested format.
    pub format: ExportFormat,
    /// Page width in pixels.
    pub page_width: u32,
    /// Page height in pixels.
    pub page_height: u32,
    /// Exactly one page per slide, in slide order.
    pub pages: Vec<ExportedPage>,
    /// The assembled PDF, for PDF exports.
    pub pdf: Option<Vec<u8>>,
}

impl ExportDocument {
    /// Number of pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Image reference found while scanning a snapshot.
struct ImageRef<'a> {
    slide_index: usize,
    element_id: ElementId,
    src: &'a str,
    width: f32,
    height: f32,
}

/// Exports decks to image and document formats.
#[derive(Debug, Clone, Default)]
pub struct DeckExporter {
    config: ExportConfig,
    loader: AssetLoader,
}

impl DeckExporter {
    /// Create an exporter with the default asset loader.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self::with_loader(config, AssetLoader::default())
    }

    /// Create an exporter with a custom asset loader.
    #[must_use]
    pub fn with_loader(config: ExportConfig, loader: AssetLoader) -> Self {
        Self { config, loader }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// The export configuration.
    #[must_use]
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export the current state of a deck.
    ///
    /// # Errors
    ///
    /// See [`DeckExporter::export_snapshot`].
    pub async fn export(&self, deck: &SlideDeck) -> RenderResult<ExportDocument> {
        self.export_snapshot(deck.snapshot()).await
    }

    /// Export a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::AssetLoad`] under [`AssetPolicy::Abort`] when
    /// any image fails to load, or an export error if painting or encoding
    /// fails.
    pub async fn export_snapshot(&self, snapshot: DeckSnapshot) -> RenderResult<ExportDocument> {
        tracing::info!(
            "Exporting {} slides as {} at {}x",
            snapshot.slides.len(),
            self.config.format,
            self.config.scale
        );
        let images = self.resolve_images(&snapshot).await?;

        let config = self.config.clone();
        let document = tokio::task::spawn_blocking(move || compose(&config, &snapshot, &images))
            .await
            .map_err(|e| {
                if e.is_cancelled() {
                    RenderError::Cancelled
                } else {
                    RenderError::Export(format!("compose task failed: {e}"))
                }
            })??;

        tracing::info!("Export finished: {} pages", document.page_count());
        Ok(document)
    }

    /// Load every referenced image and map each source to an embeddable
    /// data URI, applying the failure policy.
    async fn resolve_images(&self, snapshot: &DeckSnapshot) -> RenderResult<HashMap<String, String>> {
        let refs: Vec<ImageRef<'_>> = snapshot
            .slides
            .iter()
            .enumerate()
            .flat_map(|(slide_index, slide)| {
                slide.elements().iter().filter_map(move |element| match &element.kind {
                    ElementKind::Image(image) => Some(ImageRef {
                        slide_index,
                        element_id: element.id,
                        src: image.src.as_str(),
                        width: element.transform.width,
                        height: element.transform.height,
                    }),
                    ElementKind::Text(_) | ElementKind::Shape(_) => None,
                })
            })
            .collect();
        if refs.is_empty() {
            return Ok(HashMap::new());
        }

        let outcomes = self.loader.load_all(refs.iter().map(|r| r.src)).await;

        let mut resolved = HashMap::with_capacity(outcomes.len());
        for image_ref in &refs {
            if resolved.contains_key(image_ref.src) {
                continue;
            }
            let reason = match outcomes.get(image_ref.src) {
                Some(Ok(image)) => {
                    resolved.insert(image_ref.src.to_string(), image.to_data_uri());
                    continue;
                }
                Some(Err(reason)) => reason.clone(),
                None => "image was not loaded".to_string(),
            };

            match self.config.asset_policy {
                AssetPolicy::Abort => {
                    let err = RenderError::AssetLoad {
                        slide_index: image_ref.slide_index,
                        element_id: image_ref.element_id,
                        src: image_ref.src.to_string(),
                        reason,
                    };
                    tracing::warn!("Aborting export: {err}");
                    return Err(err);
                }
                AssetPolicy::Placeholder => {
                    tracing::warn!(
                        "Using placeholder for image on slide {}: {reason}",
                        image_ref.slide_index + 1
                    );
                    let placeholder = create_placeholder(
                        pixel_size(image_ref.width),
                        pixel_size(image_ref.height),
                    )?;
                    resolved.insert(image_ref.src.to_string(), placeholder.to_data_uri());
                }
            }
        }
        Ok(resolved)
    }
}

/// Paint every slide of a snapshot with already-resolved images.
///
/// # Errors
///
/// Returns an error for a non-positive scale or if rasterization or PDF
/// assembly fails.
pub fn compose(
    config: &ExportConfig,
    snapshot: &DeckSnapshot,
    images: &HashMap<String, String>,
) -> RenderResult<ExportDocument> {
    if !config.scale.is_finite() || config.scale <= 0.0 {
        return Err(RenderError::Export(format!(
            "export scale must be positive, got {}",
            config.scale
        )));
    }

    let page_width = pixel_size(snapshot.canvas.width * config.scale);
    let page_height = pixel_size(snapshot.canvas.height * config.scale);
    let mut backend = SvgBackend::new(page_width, page_height).with_images(images.clone());
    let rasterizer = match config.format {
        ExportFormat::Svg => None,
        ExportFormat::Png | ExportFormat::Pdf => Some(raster::Rasterizer::new()),
    };

    let mut pages = Vec::with_capacity(snapshot.slides.len());
    for (index, slide) in snapshot.slides.iter().enumerate() {
        let tree = render(slide, config.scale);
        let svg = backend.render(&tree)?;
        let png = rasterizer
            .as_ref()
            .map(|r| r.render_png(&svg))
            .transpose()?;
        tracing::debug!("Composited page {} of {}", index + 1, snapshot.slides.len());
        pages.push(ExportedPage {
            index,
            slide_id: slide.id(),
            svg,
            png,
        });
    }

    let pdf = match config.format {
        ExportFormat::Pdf => Some(raster::build_pdf(
            &config.title,
            &pages,
            page_width,
            page_height,
            config.dpi,
        )?),
        ExportFormat::Svg | ExportFormat::Png => None,
    };

    Ok(ExportDocument {
        format: config.format,
        page_width,
        page_height,
        pages,
        pdf,
    })
}

/// Round a length to whole pixels, at least one.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn pixel_size(value: f32) -> u32 {
    if value.is_finite() {
        (value.round() as u32).max(1)
    } else {
        1
    }
}

#[cfg(feature = "export")]
mod raster {
    use super::ExportedPage;
    use crate::error::{RenderError, RenderResult};

    /// SVG rasterizer with a loaded font database.
    pub(super) struct Rasterizer {
        options: usvg::Options<'static>,
    }

    impl Rasterizer {
        pub(super) fn new() -> Self {
            let mut options = usvg::Options::default();
            options.fontdb_mut().load_system_fonts();
            Self { options }
        }

        /// Rasterize an SVG document to PNG bytes.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        pub(super) fn render_png(&self, svg: &str) -> RenderResult<Vec<u8>> {
            let tree = usvg::Tree::from_str(svg, &self.options)
                .map_err(|e| RenderError::Export(format!("SVG parsing failed: {e}")))?;

            let px_w = tree.size().width() as u32;
            let px_h = tree.size().height() as u32;

            let mut pixmap = tiny_skia::Pixmap::new(px_w.max(1), px_h.max(1))
                .ok_or_else(|| RenderError::Export("Failed to create pixmap".to_string()))?;

            resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

            pixmap
                .encode_png()
                .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
        }
    }

    /// Assemble rasterized pages into a PDF, one page per slide.
    #[allow(clippy::cast_precision_loss)]
    pub(super) fn build_pdf(
        title: &str,
        pages: &[ExportedPage],
        width: u32,
        height: u32,
        dpi: f32,
    ) -> RenderResult<Vec<u8>> {
        // Convert pixel dimensions to mm: pixels / dpi * 25.4
        let page_width_mm = width as f32 / dpi * 25.4;
        let page_height_mm = height as f32 / dpi * 25.4;

        let (doc, first_page, first_layer) = printpdf::PdfDocument::new(
            title,
            printpdf::Mm(page_width_mm),
            printpdf::Mm(page_height_mm),
            "Layer 1",
        );

        for (i, page) in pages.iter().enumerate() {
            let png = page.png.as_deref().ok_or_else(|| {
                RenderError::Export(format!("page {} was not rasterized", i + 1))
            })?;

            let (page_index, layer_index) = if i == 0 {
                (first_page, first_layer)
            } else {
                doc.add_page(
                    printpdf::Mm(page_width_mm),
                    printpdf::Mm(page_height_mm),
                    "Layer 1",
                )
            };
            let layer = doc.get_page(page_index).get_layer(layer_index);

            // Decode PNG using printpdf's bundled image crate for compatibility
            let dynamic_image = printpdf::image_crate::load_from_memory(png)
                .map_err(|e| RenderError::Export(format!("Failed to decode PNG for PDF: {e}")))?;
            let pdf_image = printpdf::Image::from_dynamic_image(&dynamic_image);

            let transform = printpdf::ImageTransform {
                translate_x: Some(printpdf::Mm(0.0)),
                translate_y: Some(printpdf::Mm(0.0)),
                dpi: Some(dpi),
                ..Default::default()
            };
            pdf_image.add_to_layer(layer, transform);
        }

        doc.save_to_bytes()
            .map_err(|e| RenderError::Export(format!("PDF save failed: {e}")))
    }
}

#[cfg(not(feature = "export"))]
mod raster {
    use super::ExportedPage;
    use crate::error::{RenderError, RenderResult};

    const DISABLED: &str = "PNG and PDF export require the `export` feature";

    pub(super) struct Rasterizer;

    impl Rasterizer {
        pub(super) fn new() -> Self {
            Self
        }

        #[allow(clippy::unused_self)]
        pub(super) fn render_png(&self, _svg: &str) -> RenderResult<Vec<u8>> {
            Err(RenderError::Export(DISABLED.to_string()))
        }
    }

    pub(super) fn build_pdf(
        _title: &str,
        _pages: &[ExportedPage],
        _width: u32,
        _height: u32,
        _dpi: f32,
    ) -> RenderResult<Vec<u8>> {
        Err(RenderError::Export(DISABLED.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carousel_core::{CanvasSize, Element, ShapeConfig, TextElementInit};

    fn snapshot(slides: usize) -> DeckSnapshot {
        let mut deck = SlideDeck::new(CanvasSize::new(200.0, 250.0));
        for i in 0..slides {
            if i > 0 {
                deck.add_slide().expect("add");
            }
            deck.current_slide_mut().add_element(
                Element::text(TextElementInit::new(format!("Slide {}", i + 1))).expect("text"),
            );
        }
        deck.snapshot()
    }

    #[test]
    fn test_svg_export_has_page_per_slide() {
        let config = ExportConfig {
            format: ExportFormat::Svg,
            ..ExportConfig::default()
        };
        let document = compose(&config, &snapshot(3), &HashMap::new()).expect("svg");
        assert_eq!(document.page_count(), 3);
        assert!(document.pdf.is_none());
        assert!(document.pages.iter().all(|p| p.png.is_none()));
        assert!(document.pages[2].svg.contains("Slide 3"));
        assert_eq!((document.page_width, document.page_height), (200, 250));
    }

    #[test]
    fn test_scale_applies_to_page_size() {
        let config = ExportConfig {
            format: ExportFormat::Svg,
            scale: 2.0,
            ..ExportConfig::default()
        };
        let document = compose(&config, &snapshot(1), &HashMap::new()).expect("svg");
        assert_eq!((document.page_width, document.page_height), (400, 500));
        assert!(document.pages[0].svg.contains("width=\"400\""));
    }

    #[test]
    fn test_rejects_non_positive_scale() {
        let config = ExportConfig {
            scale: 0.0,
            ..ExportConfig::default()
        };
        assert!(compose(&config, &snapshot(1), &HashMap::new()).is_err());
    }

    #[cfg(feature = "export")]
    #[test]
    fn test_png_export_produces_valid_bytes() {
        let config = ExportConfig {
            format: ExportFormat::Png,
            ..ExportConfig::default()
        };
        let document = compose(&config, &snapshot(2), &HashMap::new()).expect("png");
        for page in &document.pages {
            let png = page.png.as_ref().expect("rasterized");
            assert_eq!(&png[0..4], &[137, 80, 78, 71]);
        }
    }

    #[cfg(feature = "export")]
    #[test]
    fn test_pdf_export_produces_valid_bytes() {
        let mut deck = SlideDeck::new(CanvasSize::new(120.0, 150.0));
        deck.current_slide_mut()
            .add_element(Element::shape(ShapeConfig::default()).expect("rect"));
        deck.add_slide().expect("add");
        let document = compose(&ExportConfig::default(), &deck.snapshot(), &HashMap::new())
            .expect("pdf");
        let pdf = document.pdf.as_ref().expect("pdf bytes");
        assert_eq!(&pdf[0..5], b"%PDF-");
        assert_eq!(document.page_count(), 2);
    }

    #[test]
    fn test_format_and_policy_parse() {
        assert_eq!("PNG".parse::<ExportFormat>().expect("png"), ExportFormat::Png);
        assert!("gif".parse::<ExportFormat>().is_err());
        assert_eq!(
            "placeholder".parse::<AssetPolicy>().expect("policy"),
            AssetPolicy::Placeholder
        );
        assert_eq!(AssetPolicy::default(), AssetPolicy::Abort);
        assert_eq!(ExportFormat::Pdf.to_string(), "pdf");
    }

    #[test]
    fn test_empty_slide_still_exported() {
        let mut deck = SlideDeck::default();
        deck.current_slide_mut().background_color = "#000000".to_string();
        let config = ExportConfig {
            format: ExportFormat::Svg,
            ..ExportConfig::default()
        };
        let document = compose(&config, &deck.snapshot(), &HashMap::new()).expect("svg");
        assert!(document.pages[0].svg.contains("fill=\"#000000\""));
    }
}
