//! Slide elements - the building blocks of a carousel slide.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::text::{estimate_text_box, TextMetrics};
use crate::{CanvasError, CanvasResult};

/// Minimum width of an element at rest, in pixels.
pub const MIN_WIDTH: f32 = 50.0;

/// Minimum height of an element at rest, in pixels.
pub const MIN_HEIGHT: f32 = 20.0;

/// Smallest font size a patch can set.
const MIN_FONT_SIZE: f32 = 1.0;

/// Smallest line-height multiplier a patch can set.
const MIN_LINE_HEIGHT: f32 = 0.5;

/// Text used when a text element is created without content.
pub const DEFAULT_TEXT: &str = "Your text here";

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse an element ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Font weight of a text element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    /// Regular weight.
    #[default]
    Normal,
    /// Bold weight.
    Bold,
}

/// Font style of a text element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    /// Upright glyphs.
    #[default]
    Normal,
    /// Italic glyphs.
    Italic,
}

/// Horizontal alignment of text lines inside the element box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Flush left.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Flush right.
    Right,
}

/// Styling and content of a text element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Text content. May contain newlines.
    pub text: String,
    /// Font size in pixels.
    pub font_size: f32,
    /// Font family name.
    pub font_family: String,
    /// Font weight.
    #[serde(default)]
    pub font_weight: FontWeight,
    /// Font style.
    #[serde(default)]
    pub font_style: FontStyle,
    /// Text color.
    pub fill: String,
    /// Line alignment.
    #[serde(default)]
    pub align: TextAlign,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
    /// Extra spacing between glyphs in pixels.
    #[serde(default)]
    pub letter_spacing: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEXT.to_string(),
            font_size: 32.0,
            font_family: "Inter".to_string(),
            font_weight: FontWeight::Normal,
            font_style: FontStyle::Normal,
            fill: "#111111".to_string(),
            align: TextAlign::Left,
            line_height: 1.2,
            letter_spacing: 0.0,
        }
    }
}

/// Closed set of shape primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    /// Rectangle, optionally with rounded corners.
    Rect,
    /// Circle or ellipse inscribed in the element box.
    Circle,
    /// Horizontal line through the middle of the element box.
    Line,
}

impl FromStr for ShapeType {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rect" | "rectangle" => Ok(Self::Rect),
            "circle" | "ellipse" => Ok(Self::Circle),
            "line" => Ok(Self::Line),
            other => Err(CanvasError::validation(format!(
                "unknown shape type '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rect => "rect",
            Self::Circle => "circle",
            Self::Line => "line",
        };
        f.write_str(name)
    }
}

/// Styling of a shape element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    /// Which shape to draw.
    pub shape_type: ShapeType,
    /// Fill color, or `transparent`.
    pub fill: String,
    /// Optional stroke color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    /// Stroke width in pixels.
    #[serde(default)]
    pub stroke_width: f32,
    /// Corner radius in pixels. Always zero for non-rect shapes.
    #[serde(default)]
    pub corner_radius: f32,
}

/// Source of an image element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSource {
    /// Image URL, file path, or `data:` URI.
    pub src: String,
    /// Natural width of the image in pixels.
    pub natural_width: f32,
    /// Natural height of the image in pixels.
    pub natural_height: f32,
}

/// The content an element draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ElementKind {
    /// A block of styled text.
    Text(TextStyle),
    /// A rect, circle, or line.
    Shape(ShapeStyle),
    /// A raster image.
    Image(ImageSource),
}

impl ElementKind {
    /// Short variant name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Shape(_) => "shape",
            Self::Image(_) => "image",
        }
    }
}

const fn unit_scale() -> f32 {
    1.0
}

/// Position, size and rotation of an element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// X position (pixels from the slide's left edge).
    pub x: f32,
    /// Y position (pixels from the slide's top edge).
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Clockwise rotation in degrees around the top-left corner.
    #[serde(default)]
    pub rotation: f32,
    /// Horizontal scale of an interactive resize in progress.
    #[serde(default = "unit_scale")]
    pub scale_x: f32,
    /// Vertical scale of an interactive resize in progress.
    #[serde(default = "unit_scale")]
    pub scale_y: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

impl Transform {
    /// Width including any in-progress resize.
    #[must_use]
    pub fn effective_width(&self) -> f32 {
        self.width * self.scale_x
    }

    /// Height including any in-progress resize.
    #[must_use]
    pub fn effective_height(&self) -> f32 {
        self.height * self.scale_y
    }

    /// Fold the resize scale into width/height and restore unit scale.
    pub fn bake_scale(&mut self) {
        self.width = clamp_width(self.effective_width());
        self.height = clamp_height(self.effective_height());
        self.scale_x = 1.0;
        self.scale_y = 1.0;
    }

    /// Whether this transform satisfies the at-rest invariants.
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        self.width >= MIN_WIDTH
            && self.height >= MIN_HEIGHT
            && (0.0..360.0).contains(&self.rotation)
            && (self.scale_x - 1.0).abs() < f32::EPSILON
            && (self.scale_y - 1.0).abs() < f32::EPSILON
    }
}

/// Normalize an angle in degrees into `[0, 360)`.
#[must_use]
pub fn normalize_rotation(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let r = degrees.rem_euclid(360.0);
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

/// Floor a width to [`MIN_WIDTH`].
#[must_use]
pub fn clamp_width(width: f32) -> f32 {
    if width.is_finite() {
        width.max(MIN_WIDTH)
    } else {
        MIN_WIDTH
    }
}

/// Floor a height to [`MIN_HEIGHT`].
#[must_use]
pub fn clamp_height(height: f32) -> f32 {
    if height.is_finite() {
        height.max(MIN_HEIGHT)
    } else {
        MIN_HEIGHT
    }
}

fn ensure_finite(name: &str, value: f32) -> CanvasResult<f32> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CanvasError::validation(format!("{name} must be a finite number")))
    }
}

fn ensure_at_least(name: &str, value: f32, min: f32) -> CanvasResult<f32> {
    let value = ensure_finite(name, value)?;
    if value < min {
        return Err(CanvasError::validation(format!(
            "{name} {value} is below the minimum of {min}"
        )));
    }
    Ok(value)
}

fn ensure_opacity(value: f32) -> CanvasResult<f32> {
    let value = ensure_finite("opacity", value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(CanvasError::validation(format!(
            "opacity {value} is outside [0, 1]"
        )))
    }
}

/// Caller-supplied parameters for a new text element.
///
/// Unset fields fall back to [`TextStyle::default`] and to a size derived
/// from the estimated text box.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextElementInit {
    /// Text content; defaults to a placeholder.
    pub text: Option<String>,
    /// X position.
    pub x: f32,
    /// Y position.
    pub y: f32,
    /// Requested width; defaults to the estimated text width.
    pub width: Option<f32>,
    /// Requested height; defaults to the estimated text height.
    pub height: Option<f32>,
    /// Rotation in degrees.
    pub rotation: f32,
    /// Opacity in `[0, 1]`.
    pub opacity: Option<f32>,
    /// Font size in pixels.
    pub font_size: Option<f32>,
    /// Font family name.
    pub font_family: Option<String>,
    /// Font weight.
    pub font_weight: Option<FontWeight>,
    /// Font style.
    pub font_style: Option<FontStyle>,
    /// Text color.
    pub fill: Option<String>,
    /// Line alignment.
    pub align: Option<TextAlign>,
    /// Line height multiplier.
    pub line_height: Option<f32>,
    /// Letter spacing in pixels.
    pub letter_spacing: Option<f32>,
}

impl TextElementInit {
    /// Start from the given text content.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Set the position.
    #[must_use]
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Request an explicit size.
    #[must_use]
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set the font size.
    #[must_use]
    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = Some(font_size);
        self
    }

    /// Floor any requested size to the element minimums.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.width = self.width.map(clamp_width);
        self.height = self.height.map(clamp_height);
        self
    }
}

/// Caller-supplied parameters for a new shape element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    /// Which shape to draw.
    pub shape_type: ShapeType,
    /// X position.
    pub x: f32,
    /// Y position.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Rotation in degrees.
    pub rotation: f32,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Fill color, or `transparent`.
    pub fill: String,
    /// Optional stroke color.
    pub stroke: Option<String>,
    /// Stroke width in pixels.
    pub stroke_width: f32,
    /// Corner radius; rect only.
    pub corner_radius: f32,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            shape_type: ShapeType::Rect,
            x: 0.0,
            y: 0.0,
            width: 200.0,
            height: 200.0,
            rotation: 0.0,
            opacity: 1.0,
            fill: "#3b82f6".to_string(),
            stroke: None,
            stroke_width: 0.0,
            corner_radius: 0.0,
        }
    }
}

impl ShapeConfig {
    /// Default configuration for the given shape.
    #[must_use]
    pub fn new(shape_type: ShapeType) -> Self {
        let mut config = Self {
            shape_type,
            ..Self::default()
        };
        if shape_type == ShapeType::Line {
            config.height = MIN_HEIGHT;
            config.fill = "transparent".to_string();
            config.stroke = Some("#111111".to_string());
            config.stroke_width = 4.0;
        }
        config
    }
}

/// A partial update merged into an existing element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementPatch {
    /// New x position.
    pub x: Option<f32>,
    /// New y position.
    pub y: Option<f32>,
    /// New width, floored to the minimum.
    pub width: Option<f32>,
    /// New height, floored to the minimum.
    pub height: Option<f32>,
    /// New rotation, normalized into `[0, 360)`.
    pub rotation: Option<f32>,
    /// New opacity, clamped into `[0, 1]`.
    pub opacity: Option<f32>,
    /// Variant-specific styling.
    pub style: Option<StylePatch>,
}

/// Variant-specific part of an [`ElementPatch`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum StylePatch {
    /// Applies to text elements only.
    Text(TextStylePatch),
    /// Applies to shape elements only.
    Shape(ShapeStylePatch),
    /// Applies to image elements only.
    Image(ImagePatch),
}

/// Partial text styling.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStylePatch {
    /// New content.
    pub text: Option<String>,
    /// New font size.
    pub font_size: Option<f32>,
    /// New font family.
    pub font_family: Option<String>,
    /// New weight.
    pub font_weight: Option<FontWeight>,
    /// New style.
    pub font_style: Option<FontStyle>,
    /// New text color.
    pub fill: Option<String>,
    /// New alignment.
    pub align: Option<TextAlign>,
    /// New line height multiplier.
    pub line_height: Option<f32>,
    /// New letter spacing.
    pub letter_spacing: Option<f32>,
}

/// Partial shape styling. `stroke: Some(None)` removes the stroke.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeStylePatch {
    /// New fill color.
    pub fill: Option<String>,
    /// New stroke color, or `Some(None)` to remove it.
    pub stroke: Option<Option<String>>,
    /// New stroke width.
    pub stroke_width: Option<f32>,
    /// New corner radius; ignored for non-rect shapes.
    pub corner_radius: Option<f32>,
}

/// Partial image update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagePatch {
    /// New image source.
    pub src: Option<String>,
}

/// A slide element with content, transform, and opacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Unique identifier within the owning slide.
    pub id: ElementId,
    /// Element content type.
    pub kind: ElementKind,
    /// Position, size and rotation.
    pub transform: Transform,
    /// Opacity in `[0, 1]`.
    #[serde(default = "unit_scale")]
    pub opacity: f32,
}

impl Element {
    /// Create a new element with the given kind and a default transform.
    #[must_use]
    pub fn new(kind: ElementKind) -> Self {
        Self {
            id: ElementId::new(),
            kind,
            transform: Transform::default(),
            opacity: 1.0,
        }
    }

    /// Create a text element.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] if any supplied number is not
    /// finite, the requested size is below the minimums, the font size or
    /// line height is not positive, or opacity is outside `[0, 1]`.
    pub fn text(init: TextElementInit) -> CanvasResult<Self> {
        let defaults = TextStyle::default();
        let style = TextStyle {
            text: init.text.unwrap_or(defaults.text),
            font_size: ensure_at_least(
                "font size",
                init.font_size.unwrap_or(defaults.font_size),
                MIN_FONT_SIZE,
            )?,
            font_family: init
                .font_family
                .filter(|f| !f.trim().is_empty())
                .unwrap_or(defaults.font_family),
            font_weight: init.font_weight.unwrap_or(defaults.font_weight),
            font_style: init.font_style.unwrap_or(defaults.font_style),
            fill: init.fill.unwrap_or(defaults.fill),
            align: init.align.unwrap_or(defaults.align),
            line_height: ensure_at_least(
                "line height",
                init.line_height.unwrap_or(defaults.line_height),
                MIN_LINE_HEIGHT,
            )?,
            letter_spacing: ensure_finite(
                "letter spacing",
                init.letter_spacing.unwrap_or(defaults.letter_spacing),
            )?,
        };

        let (estimated_w, estimated_h) =
            estimate_text_box(&style.text, &TextMetrics::from_style(&style), style.line_height);
        let width = match init.width {
            Some(w) => ensure_at_least("width", w, MIN_WIDTH)?,
            None => clamp_width(estimated_w),
        };
        let height = match init.height {
            Some(h) => ensure_at_least("height", h, MIN_HEIGHT)?,
            None => clamp_height(estimated_h),
        };

        let transform = Transform {
            x: ensure_finite("x", init.x)?,
            y: ensure_finite("y", init.y)?,
            width,
            height,
            rotation: normalize_rotation(ensure_finite("rotation", init.rotation)?),
            scale_x: 1.0,
            scale_y: 1.0,
        };
        let opacity = ensure_opacity(init.opacity.unwrap_or(1.0))?;

        Ok(Self::new(ElementKind::Text(style))
            .with_transform(transform)
            .with_opacity(opacity))
    }

    /// Create a shape element.
    ///
    /// A corner radius on a non-rect shape is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] for non-finite numbers, a size
    /// below the minimums, negative stroke width or corner radius, or an
    /// opacity outside `[0, 1]`.
    pub fn shape(config: ShapeConfig) -> CanvasResult<Self> {
        let stroke_width = ensure_at_least("stroke width", config.stroke_width, 0.0)?;
        let corner_radius = match config.shape_type {
            ShapeType::Rect => ensure_at_least("corner radius", config.corner_radius, 0.0)?,
            ShapeType::Circle | ShapeType::Line => 0.0,
        };
        let style = ShapeStyle {
            shape_type: config.shape_type,
            fill: config.fill,
            stroke: config.stroke,
            stroke_width,
            corner_radius,
        };
        let transform = Transform {
            x: ensure_finite("x", config.x)?,
            y: ensure_finite("y", config.y)?,
            width: ensure_at_least("width", config.width, MIN_WIDTH)?,
            height: ensure_at_least("height", config.height, MIN_HEIGHT)?,
            rotation: normalize_rotation(ensure_finite("rotation", config.rotation)?),
            scale_x: 1.0,
            scale_y: 1.0,
        };
        let opacity = ensure_opacity(config.opacity)?;

        Ok(Self::new(ElementKind::Shape(style))
            .with_transform(transform)
            .with_opacity(opacity))
    }

    /// Create an image element sized to the image's natural dimensions.
    ///
    /// Natural sizes below the element minimums are floored to them.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] if `src` is empty or either
    /// natural dimension is not a positive finite number.
    pub fn image(
        src: impl Into<String>,
        natural_width: f32,
        natural_height: f32,
    ) -> CanvasResult<Self> {
        let src = src.into();
        if src.trim().is_empty() {
            return Err(CanvasError::validation("image source must not be empty"));
        }
        for (name, value) in [("natural width", natural_width), ("natural height", natural_height)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CanvasError::validation(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        let transform = Transform {
            width: clamp_width(natural_width),
            height: clamp_height(natural_height),
            ..Transform::default()
        };
        Ok(Self::new(ElementKind::Image(ImageSource {
            src,
            natural_width,
            natural_height,
        }))
        .with_transform(transform))
    }

    /// Set the transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the opacity, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self
    }

    /// Deep copy of this element with a fresh id.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            id: ElementId::new(),
            ..self.clone()
        }
    }

    /// Whether this is a text element.
    #[must_use]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, ElementKind::Text(_))
    }

    /// Text styling, if this is a text element.
    #[must_use]
    pub fn as_text(&self) -> Option<&TextStyle> {
        match &self.kind {
            ElementKind::Text(style) => Some(style),
            ElementKind::Shape(_) | ElementKind::Image(_) => None,
        }
    }

    /// Mutable text styling, if this is a text element.
    pub fn as_text_mut(&mut self) -> Option<&mut TextStyle> {
        match &mut self.kind {
            ElementKind::Text(style) => Some(style),
            ElementKind::Shape(_) | ElementKind::Image(_) => None,
        }
    }

    /// Image source, if this is an image element.
    #[must_use]
    pub fn image_src(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::Image(image) => Some(&image.src),
            ElementKind::Text(_) | ElementKind::Shape(_) => None,
        }
    }

    /// Merge a patch into this element.
    ///
    /// Out-of-range values are clamped instead of rejected: rotation is
    /// normalized to `[0, 360)`, width/height floored to the minimums and
    /// opacity clamped to `[0, 1]`. Non-finite numbers are ignored, as is a
    /// style patch for a different element variant.
    pub fn apply_patch(&mut self, patch: &ElementPatch) {
        let t = &mut self.transform;
        if let Some(x) = patch.x.filter(|v| v.is_finite()) {
            t.x = x;
        }
        if let Some(y) = patch.y.filter(|v| v.is_finite()) {
            t.y = y;
        }
        if let Some(width) = patch.width.filter(|v| v.is_finite()) {
            t.width = clamp_width(width);
        }
        if let Some(height) = patch.height.filter(|v| v.is_finite()) {
            t.height = clamp_height(height);
        }
        if let Some(rotation) = patch.rotation.filter(|v| v.is_finite()) {
            t.rotation = normalize_rotation(rotation);
        }
        if let Some(opacity) = patch.opacity.filter(|v| v.is_finite()) {
            self.opacity = opacity.clamp(0.0, 1.0);
        }

        let Some(style_patch) = &patch.style else {
            return;
        };
        match (&mut self.kind, style_patch) {
            (ElementKind::Text(style), StylePatch::Text(p)) => apply_text_patch(style, p),
            (ElementKind::Shape(style), StylePatch::Shape(p)) => apply_shape_patch(style, p),
            (ElementKind::Image(image), StylePatch::Image(p)) => {
                if let Some(src) = p.src.as_ref().filter(|s| !s.trim().is_empty()) {
                    image.src.clone_from(src);
                }
            }
            (kind, _) => {
                tracing::debug!(
                    "Ignoring style patch for mismatched {} element {}",
                    kind.name(),
                    self.id
                );
            }
        }
    }

    /// Check if a point (in slide coordinates) is within this element,
    /// honoring rotation around the top-left corner.
    #[must_use]
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        let t = &self.transform;
        let (sin, cos) = (-t.rotation.to_radians()).sin_cos();
        let dx = x - t.x;
        let dy = y - t.y;
        let local_x = dx * cos - dy * sin;
        let local_y = dx * sin + dy * cos;
        local_x >= 0.0
            && local_x <= t.effective_width()
            && local_y >= 0.0
            && local_y <= t.effective_height()
    }
}

fn apply_text_patch(style: &mut TextStyle, p: &TextStylePatch) {
    if let Some(text) = &p.text {
        style.text.clone_from(text);
    }
    if let Some(size) = p.font_size.filter(|v| v.is_finite()) {
        style.font_size = size.max(MIN_FONT_SIZE);
    }
    if let Some(family) = p.font_family.as_ref().filter(|f| !f.trim().is_empty()) {
        style.font_family.clone_from(family);
    }
    if let Some(weight) = p.font_weight {
        style.font_weight = weight;
    }
    if let Some(font_style) = p.font_style {
        style.font_style = font_style;
    }
    if let Some(fill) = &p.fill {
        style.fill.clone_from(fill);
    }
    if let Some(align) = p.align {
        style.align = align;
    }
    if let Some(line_height) = p.line_height.filter(|v| v.is_finite()) {
        style.line_height = line_height.max(MIN_LINE_HEIGHT);
    }
    if let Some(spacing) = p.letter_spacing.filter(|v| v.is_finite()) {
        style.letter_spacing = spacing;
    }
}

fn apply_shape_patch(style: &mut ShapeStyle, p: &ShapeStylePatch) {
    if let Some(fill) = &p.fill {
        style.fill.clone_from(fill);
    }
    if let Some(stroke) = &p.stroke {
        style.stroke.clone_from(stroke);
    }
    if let Some(width) = p.stroke_width.filter(|v| v.is_finite()) {
        style.stroke_width = width.max(0.0);
    }
    if let Some(radius) = p.corner_radius.filter(|v| v.is_finite()) {
        if style.shape_type == ShapeType::Rect {
            style.corner_radius = radius.max(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_defaults_fill_minimum_box() {
        let element = Element::text(TextElementInit::new("Hi")).expect("text element");
        assert!(element.transform.width >= MIN_WIDTH);
        assert!(element.transform.height >= MIN_HEIGHT);
        assert_eq!(element.as_text().map(|t| t.text.as_str()), Some("Hi"));
    }

    #[test]
    fn test_text_rejects_undersized_geometry() {
        let result = Element::text(TextElementInit::new("Hi").with_size(10.0, 5.0));
        assert!(matches!(result, Err(CanvasError::Validation(_))));
    }

    #[test]
    fn test_text_clamped_init_floors_geometry() {
        let init = TextElementInit::new("Hi").with_size(10.0, 5.0).clamped();
        let element = Element::text(init).expect("clamped init is valid");
        assert!((element.transform.width - MIN_WIDTH).abs() < f32::EPSILON);
        assert!((element.transform.height - MIN_HEIGHT).abs() < f32::EPSILON);
    }

    #[test]
    fn test_text_rejects_bad_font_size_and_opacity() {
        let zero_font = TextElementInit::new("x").with_font_size(0.0);
        assert!(Element::text(zero_font).is_err());

        let opaque = TextElementInit {
            opacity: Some(1.5),
            ..TextElementInit::new("x")
        };
        assert!(Element::text(opaque).is_err());
    }

    #[test]
    fn test_shape_type_parsing() {
        assert_eq!("rect".parse::<ShapeType>().ok(), Some(ShapeType::Rect));
        assert_eq!("Circle".parse::<ShapeType>().ok(), Some(ShapeType::Circle));
        assert!(matches!(
            "star".parse::<ShapeType>(),
            Err(CanvasError::Validation(_))
        ));
    }

    #[test]
    fn test_corner_radius_ignored_for_circle() {
        let element = Element::shape(ShapeConfig {
            corner_radius: 12.0,
            ..ShapeConfig::new(ShapeType::Circle)
        })
        .expect("circle");
        match element.kind {
            ElementKind::Shape(style) => assert!(style.corner_radius.abs() < f32::EPSILON),
            other => panic!("expected shape, got {other:?}"),
        }
    }

    #[test]
    fn test_shape_rejects_negative_stroke() {
        let config = ShapeConfig {
            stroke_width: -1.0,
            ..ShapeConfig::default()
        };
        assert!(Element::shape(config).is_err());
    }

    #[test]
    fn test_image_defaults_to_natural_size() {
        let element = Element::image("https://example.com/a.png", 640.0, 480.0).expect("image");
        assert!((element.transform.width - 640.0).abs() < f32::EPSILON);
        assert!((element.transform.height - 480.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_image_floors_tiny_natural_size() {
        let element = Element::image("icon.png", 16.0, 16.0).expect("image");
        assert!((element.transform.width - MIN_WIDTH).abs() < f32::EPSILON);
        assert!((element.transform.height - MIN_HEIGHT).abs() < f32::EPSILON);
    }

    #[test]
    fn test_image_rejects_empty_src() {
        assert!(Element::image("  ", 10.0, 10.0).is_err());
        assert!(Element::image("a.png", 0.0, 10.0).is_err());
    }

    #[test]
    fn test_patch_clamps_instead_of_rejecting() {
        let mut element = Element::shape(ShapeConfig::default()).expect("rect");
        element.apply_patch(&ElementPatch {
            width: Some(3.0),
            height: Some(-40.0),
            rotation: Some(-90.0),
            opacity: Some(7.0),
            ..ElementPatch::default()
        });
        assert!((element.transform.width - MIN_WIDTH).abs() < f32::EPSILON);
        assert!((element.transform.height - MIN_HEIGHT).abs() < f32::EPSILON);
        assert!((element.transform.rotation - 270.0).abs() < f32::EPSILON);
        assert!((element.opacity - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_patch_ignores_mismatched_style() {
        let mut element = Element::shape(ShapeConfig::default()).expect("rect");
        let before = element.clone();
        element.apply_patch(&ElementPatch {
            style: Some(StylePatch::Text(TextStylePatch {
                text: Some("nope".to_string()),
                ..TextStylePatch::default()
            })),
            ..ElementPatch::default()
        });
        assert_eq!(element, before);
    }

    #[test]
    fn test_duplicate_changes_only_id() {
        let element = Element::text(TextElementInit::new("copy me")).expect("text");
        let copy = element.duplicate();
        assert_ne!(copy.id, element.id);
        assert_eq!(copy.kind, element.kind);
        assert_eq!(copy.transform, element.transform);
    }

    #[test]
    fn test_normalize_rotation() {
        assert!((normalize_rotation(360.0)).abs() < f32::EPSILON);
        assert!((normalize_rotation(-30.0) - 330.0).abs() < 1e-4);
        assert!((normalize_rotation(725.0) - 5.0).abs() < 1e-4);
        assert!(normalize_rotation(f32::NAN).abs() < f32::EPSILON);
    }

    #[test]
    fn test_contains_point_respects_rotation() {
        let element = Element::shape(ShapeConfig {
            x: 100.0,
            y: 100.0,
            width: 100.0,
            height: 50.0,
            rotation: 90.0,
            ..ShapeConfig::default()
        })
        .expect("rect");
        // Rotated 90° clockwise around (100, 100): the box now extends left.
        assert!(element.contains_point(75.0, 150.0));
        assert!(!element.contains_point(150.0, 125.0));
    }

    #[test]
    fn test_element_json_uses_tagged_kind() {
        let element = Element::image("a.png", 100.0, 100.0).expect("image");
        let json = serde_json::to_value(&element).expect("serialize");
        assert_eq!(json["kind"]["type"], "image");
        assert_eq!(json["kind"]["data"]["src"], "a.png");
    }
}
