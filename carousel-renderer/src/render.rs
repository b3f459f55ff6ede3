//! Scale-parameterized slide rendering.
//!
//! [`render`] turns a [`Slide`] into a flat [`VisualTree`] of positioned
//! primitives. The same function feeds the live editing surface (scale 1),
//! thumbnails ([`THUMBNAIL_SCALE`]) and export (any scale), so every view
//! agrees on geometry.
//!
//! Every scaled value is computed as `value * scale` from the unscaled
//! model value, so `render(s, k)` equals `render(s, 1)` multiplied by `k`
//! exactly. Text is wrapped at the unscaled width, which keeps line breaks
//! identical at every scale.

use carousel_core::{
    wrap_text, Element, ElementId, ElementKind, FontStyle, FontWeight, ShapeStyle, ShapeType,
    Slide, TextAlign, TextMetrics, TextStyle,
};
use serde::{Deserialize, Serialize};

/// Scale used for slide-strip thumbnails.
pub const THUMBNAIL_SCALE: f32 = 0.24;

/// Distance from the top of a text line to its baseline, in font sizes.
pub const BASELINE_RATIO: f32 = 0.8;

/// Options that affect what is drawn but not where.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RenderOptions {
    /// Element drawn invisibly, typically the one in text-edit mode.
    pub hidden: Option<ElementId>,
}

impl RenderOptions {
    /// Hide the given element.
    #[must_use]
    pub fn hiding(id: Option<ElementId>) -> Self {
        Self { hidden: id }
    }
}

/// Flat, paint-ordered description of a slide at a given scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualTree {
    /// Background fill.
    pub background: String,
    /// Scale the tree was rendered at.
    pub scale: f32,
    /// One primitive per element, in paint order.
    pub primitives: Vec<Primitive>,
}

impl VisualTree {
    /// Number of primitives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Check if the tree has no primitives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Image sources in paint order.
    pub fn image_sources(&self) -> impl Iterator<Item = &str> {
        self.primitives.iter().filter_map(|p| match &p.kind {
            PrimitiveKind::Image(image) => Some(image.src.as_str()),
            _ => None,
        })
    }
}

/// A positioned drawable. Geometry is in output pixels.
///
/// The box is rotated clockwise by `rotation` degrees around its top-left
/// corner `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    /// Source element.
    pub element_id: ElementId,
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Box width.
    pub width: f32,
    /// Box height.
    pub height: f32,
    /// Rotation in degrees.
    pub rotation: f32,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// False for an element hidden by [`RenderOptions`].
    pub visible: bool,
    /// What to draw inside the box.
    pub kind: PrimitiveKind,
}

/// Variant-specific drawing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum PrimitiveKind {
    /// Wrapped text.
    Text(TextPrimitive),
    /// Rectangle, optionally rounded.
    Rect {
        /// Fill color.
        fill: String,
        /// Stroke color.
        stroke: Option<String>,
        /// Stroke width.
        stroke_width: f32,
        /// Corner radius.
        corner_radius: f32,
    },
    /// Ellipse inscribed in the box.
    Ellipse {
        /// Fill color.
        fill: String,
        /// Stroke color.
        stroke: Option<String>,
        /// Stroke width.
        stroke_width: f32,
    },
    /// Horizontal line through the box's vertical center.
    Line {
        /// Line color.
        stroke: String,
        /// Line thickness.
        stroke_width: f32,
    },
    /// Image stretched to the box.
    Image(ImagePrimitive),
}

/// Text drawing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPrimitive {
    /// Lines after wrapping, top to bottom.
    pub lines: Vec<TextLine>,
    /// Font size.
    pub font_size: f32,
    /// Font family.
    pub font_family: String,
    /// Font weight.
    pub font_weight: FontWeight,
    /// Font style.
    pub font_style: FontStyle,
    /// Fill color.
    pub fill: String,
    /// Horizontal alignment inside the box.
    pub align: TextAlign,
    /// Extra spacing between characters.
    pub letter_spacing: f32,
}

/// One wrapped line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    /// Line content.
    pub text: String,
    /// Baseline offset from the top of the box.
    pub baseline: f32,
}

/// Image drawing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePrimitive {
    /// Source as written in the document.
    pub src: String,
    /// Intrinsic image width.
    pub natural_width: f32,
    /// Intrinsic image height.
    pub natural_height: f32,
}

/// Render a slide at `scale`.
#[must_use]
pub fn render(slide: &Slide, scale: f32) -> VisualTree {
    render_with(slide, scale, &RenderOptions::default())
}

/// Render a slide at `scale` with options.
#[must_use]
pub fn render_with(slide: &Slide, scale: f32, options: &RenderOptions) -> VisualTree {
    let primitives = slide
        .elements()
        .iter()
        .map(|element| render_element(element, scale, options))
        .collect();
    VisualTree {
        background: slide.background_color.clone(),
        scale,
        primitives,
    }
}

/// Render a slide for the slide strip.
#[must_use]
pub fn thumbnail(slide: &Slide) -> VisualTree {
    render(slide, THUMBNAIL_SCALE)
}

fn render_element(element: &Element, scale: f32, options: &RenderOptions) -> Primitive {
    let t = &element.transform;
    let width = t.effective_width();
    let height = t.effective_height();

    let kind = match &element.kind {
        ElementKind::Text(style) => PrimitiveKind::Text(text_primitive(style, width, scale)),
        ElementKind::Shape(style) => shape_primitive(style, scale),
        ElementKind::Image(image) => PrimitiveKind::Image(ImagePrimitive {
            src: image.src.clone(),
            natural_width: image.natural_width,
            natural_height: image.natural_height,
        }),
    };

    Primitive {
        element_id: element.id,
        x: t.x * scale,
        y: t.y * scale,
        width: width * scale,
        height: height * scale,
        rotation: t.rotation,
        opacity: element.opacity,
        visible: options.hidden != Some(element.id),
        kind,
    }
}

#[allow(clippy::cast_precision_loss)]
fn text_primitive(style: &TextStyle, box_width: f32, scale: f32) -> TextPrimitive {
    let metrics = TextMetrics::from_style(style);
    let line_advance = style.font_size * style.line_height;
    let lines = wrap_text(&style.text, box_width, &metrics)
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let baseline = line_advance.mul_add(i as f32, style.font_size * BASELINE_RATIO);
            TextLine {
                text,
                baseline: baseline * scale,
            }
        })
        .collect();

    TextPrimitive {
        lines,
        font_size: style.font_size * scale,
        font_family: style.font_family.clone(),
        font_weight: style.font_weight,
        font_style: style.font_style,
        fill: style.fill.clone(),
        align: style.align,
        letter_spacing: style.letter_spacing * scale,
    }
}

fn shape_primitive(style: &ShapeStyle, scale: f32) -> PrimitiveKind {
    let stroke_width = style.stroke_width * scale;
    match style.shape_type {
        ShapeType::Rect => PrimitiveKind::Rect {
            fill: style.fill.clone(),
            stroke: style.stroke.clone(),
            stroke_width,
            corner_radius: style.corner_radius * scale,
        },
        ShapeType::Circle => PrimitiveKind::Ellipse {
            fill: style.fill.clone(),
            stroke: style.stroke.clone(),
            stroke_width,
        },
        ShapeType::Line => PrimitiveKind::Line {
            stroke: style.stroke.clone().unwrap_or_else(|| style.fill.clone()),
            stroke_width,
        },
    }
}
