//! # Carousel Renderer
//!
//! Scale-parameterized slide rendering, SVG painting and deck export.
//!
//! ## Pipeline
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │        render(slide, scale) -> VisualTree   │
//! ├─────────────┬─────────────┬─────────────────┤
//! │ Live canvas │ Thumbnails  │ Export          │
//! │ (scale 1)   │ (scale 0.24)│ (any scale)     │
//! ├─────────────┴─────────────┴─────────────────┤
//! │  SvgBackend -> resvg (PNG) -> printpdf (PDF)│
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assets;
pub mod backend;
pub mod cache;
pub mod error;
pub mod export;
pub mod image;
pub mod render;
pub mod task;

pub use assets::{AssetLoader, AssetLoaderConfig, AssetSource, DefaultAssetSource};
pub use backend::{svg::SvgBackend, BackendType, RenderBackend};
pub use error::{RenderError, RenderResult};
pub use export::{
    compose, AssetPolicy, DeckExporter, ExportConfig, ExportDocument, ExportFormat, ExportedPage,
};
pub use render::{
    render, render_with, thumbnail, Primitive, PrimitiveKind, RenderOptions, VisualTree,
    THUMBNAIL_SCALE,
};
pub use task::{ExportRunner, ExportTask};

use carousel_core::{CanvasSize, Slide};

/// Configuration for the slide renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RendererConfig {
    /// Unscaled canvas size shared by every slide.
    pub canvas: CanvasSize,
    /// Pixels per canvas unit.
    pub scale: f32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            scale: 1.0,
        }
    }
}

/// Paints slides to SVG at a fixed scale.
///
/// Used for the live canvas (scale 1) and the thumbnail strip
/// ([`Renderer::thumbnails`]).
#[derive(Debug, Clone)]
pub struct Renderer {
    config: RendererConfig,
    backend: SvgBackend,
    frame_count: u64,
}

impl Renderer {
    /// Create a renderer with the given configuration.
    #[must_use]
    pub fn new(config: RendererConfig) -> Self {
        let (width, height) = page_size(config.canvas, config.scale);
        Self {
            config,
            backend: SvgBackend::new(width, height),
            frame_count: 0,
        }
    }

    /// Create a renderer producing thumbnails of a `canvas`-sized deck.
    #[must_use]
    pub fn thumbnails(canvas: CanvasSize) -> Self {
        Self::new(RendererConfig {
            canvas,
            scale: THUMBNAIL_SCALE,
        })
    }

    /// Paint one slide.
    ///
    /// # Errors
    ///
    /// Returns an error if painting fails.
    pub fn render_slide(&mut self, slide: &Slide, options: &RenderOptions) -> RenderResult<String> {
        let tree = render_with(slide, self.config.scale, options);
        let svg = self.backend.render(&tree)?;
        self.frame_count += 1;
        Ok(svg)
    }

    /// Get the number of slides painted so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the active backend type.
    #[must_use]
    pub fn active_backend(&self) -> BackendType {
        self.backend.backend_type()
    }

    /// Get the renderer configuration.
    #[must_use]
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Change the scale, resizing the output surface to match.
    pub fn set_scale(&mut self, scale: f32) {
        self.config.scale = scale;
        let (width, height) = page_size(self.config.canvas, scale);
        self.backend.resize(width, height);
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn page_size(canvas: CanvasSize, scale: f32) -> (u32, u32) {
    let side = |v: f32| (v * scale).round().max(1.0) as u32;
    (side(canvas.width), side(canvas.height))
}

/// Carousel renderer version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use carousel_core::{Element, TextElementInit};

    #[test]
    fn test_thumbnail_renderer_size() {
        let mut renderer = Renderer::thumbnails(CanvasSize::default());
        let svg = renderer
            .render_slide(&Slide::new(), &RenderOptions::default())
            .expect("svg");
        // 1080 * 0.24 = 259.2, 1350 * 0.24 = 324
        assert!(svg.contains("width=\"259\""));
        assert!(svg.contains("height=\"324\""));
        assert_eq!(renderer.frame_count(), 1);
        assert_eq!(renderer.active_backend(), BackendType::Svg);
    }

    #[test]
    fn test_set_scale_resizes_output() {
        let mut renderer = Renderer::new(RendererConfig::default());
        renderer.set_scale(2.0);
        let mut slide = Slide::new();
        slide.add_element(Element::text(TextElementInit::new("Hello")).expect("text"));
        let svg = renderer
            .render_slide(&slide, &RenderOptions::default())
            .expect("svg");
        assert!(svg.contains("width=\"2160\""));
        assert!(svg.contains("Hello"));
    }
}
