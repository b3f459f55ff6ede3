//! SVG backend.
//!
//! Paints a [`VisualTree`] as a standalone SVG document. Used for SVG
//! export, as the intermediate for PNG/PDF rasterization and for
//! thumbnails.

use std::collections::HashMap;
use std::fmt::Write;

use carousel_core::{FontStyle, FontWeight, TextAlign};

use crate::render::{ImagePrimitive, Primitive, PrimitiveKind, TextPrimitive};
use crate::{RenderResult, VisualTree};

use super::{BackendType, RenderBackend};

/// SVG document renderer.
#[derive(Debug, Clone, Default)]
pub struct SvgBackend {
    width: u32,
    height: u32,
    images: HashMap<String, String>,
}

impl SvgBackend {
    /// Create a backend producing documents of the given pixel size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            images: HashMap::new(),
        }
    }

    /// Substitute image sources when painting, e.g. with embedded data URIs.
    #[must_use]
    pub fn with_images(mut self, images: HashMap<String, String>) -> Self {
        self.images = images;
        self
    }

    fn image_href<'a>(&'a self, src: &'a str) -> &'a str {
        self.images.get(src).map_or(src, String::as_str)
    }

    fn paint_primitive(&self, svg: &mut String, primitive: &Primitive) {
        if !primitive.visible {
            tracing::trace!("Skipping hidden element {}", primitive.element_id);
            return;
        }
        tracing::trace!(
            "Paint {} at ({}, {}) size {}x{}",
            kind_name(&primitive.kind),
            primitive.x,
            primitive.y,
            primitive.width,
            primitive.height
        );

        let _ = write!(
            svg,
            "<g transform=\"translate({} {}) rotate({})\" opacity=\"{}\">",
            primitive.x, primitive.y, primitive.rotation, primitive.opacity,
        );

        let (w, h) = (primitive.width, primitive.height);
        match &primitive.kind {
            PrimitiveKind::Text(text) => paint_text(svg, text, w),
            PrimitiveKind::Rect {
                fill,
                stroke,
                stroke_width,
                corner_radius,
            } => {
                let _ = write!(
                    svg,
                    "<rect width=\"{w}\" height=\"{h}\" rx=\"{corner_radius}\" ry=\"{corner_radius}\" fill=\"{}\"{}/>",
                    escape_xml(fill),
                    stroke_attrs(stroke.as_deref(), *stroke_width),
                );
            }
            PrimitiveKind::Ellipse {
                fill,
                stroke,
                stroke_width,
            } => {
                let (rx, ry) = (w / 2.0, h / 2.0);
                let _ = write!(
                    svg,
                    "<ellipse cx=\"{rx}\" cy=\"{ry}\" rx=\"{rx}\" ry=\"{ry}\" fill=\"{}\"{}/>",
                    escape_xml(fill),
                    stroke_attrs(stroke.as_deref(), *stroke_width),
                );
            }
            PrimitiveKind::Line {
                stroke,
                stroke_width,
            } => {
                let mid = h / 2.0;
                let _ = write!(
                    svg,
                    "<line x1=\"0\" y1=\"{mid}\" x2=\"{w}\" y2=\"{mid}\" stroke=\"{}\" stroke-width=\"{stroke_width}\" stroke-linecap=\"round\"/>",
                    escape_xml(stroke),
                );
            }
            PrimitiveKind::Image(ImagePrimitive { src, .. }) => {
                let _ = write!(
                    svg,
                    "<image width=\"{w}\" height=\"{h}\" preserveAspectRatio=\"none\" href=\"{}\"/>",
                    escape_xml(self.image_href(src)),
                );
            }
        }

        svg.push_str("</g>");
    }
}

impl RenderBackend for SvgBackend {
    type Output = String;

    fn backend_type(&self) -> BackendType {
        BackendType::Svg
    }

    fn render(&mut self, tree: &VisualTree) -> RenderResult<String> {
        let (w, h) = (self.width, self.height);
        let mut svg = String::with_capacity(4096);
        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">",
        );
        let _ = write!(
            svg,
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
            escape_xml(&tree.background),
        );

        for primitive in &tree.primitives {
            self.paint_primitive(&mut svg, primitive);
        }

        svg.push_str("</svg>");
        Ok(svg)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        tracing::debug!("SVG backend resized to {}x{}", width, height);
    }
}

fn paint_text(svg: &mut String, text: &TextPrimitive, box_width: f32) {
    let (anchor, x) = match text.align {
        TextAlign::Left => ("start", 0.0),
        TextAlign::Center => ("middle", box_width / 2.0),
        TextAlign::Right => ("end", box_width),
    };
    let weight = match text.font_weight {
        FontWeight::Normal => "normal",
        FontWeight::Bold => "bold",
    };
    let style = match text.font_style {
        FontStyle::Normal => "normal",
        FontStyle::Italic => "italic",
    };

    let _ = write!(
        svg,
        "<text font-size=\"{}\" font-family=\"{}\" font-weight=\"{weight}\" font-style=\"{style}\" letter-spacing=\"{}\" fill=\"{}\" text-anchor=\"{anchor}\" xml:space=\"preserve\">",
        text.font_size,
        escape_xml(&text.font_family),
        text.letter_spacing,
        escape_xml(&text.fill),
    );
    for line in &text.lines {
        let _ = write!(
            svg,
            "<tspan x=\"{x}\" y=\"{}\">{}</tspan>",
            line.baseline,
            escape_xml(&line.text),
        );
    }
    svg.push_str("</text>");
}

fn stroke_attrs(stroke: Option<&str>, width: f32) -> String {
    match stroke {
        Some(color) if width > 0.0 => {
            format!(" stroke=\"{}\" stroke-width=\"{width}\"", escape_xml(color))
        }
        _ => String::new(),
    }
}

fn kind_name(kind: &PrimitiveKind) -> &'static str {
    match kind {
        PrimitiveKind::Text(_) => "text",
        PrimitiveKind::Rect { .. } => "rect",
        PrimitiveKind::Ellipse { .. } => "ellipse",
        PrimitiveKind::Line { .. } => "line",
        PrimitiveKind::Image(_) => "image",
    }
}

/// Escape special XML characters.
pub(crate) fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
