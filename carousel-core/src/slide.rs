//! A single carousel slide: a background plus an ordered element list.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CanvasError, CanvasResult, Element, ElementId, ElementPatch};

/// Background color given to new slides.
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Unique identifier for a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlideId(Uuid);

impl SlideId {
    /// Create a new unique slide ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a slide ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for SlideId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SlideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One page of a carousel.
///
/// Element order is paint order: later elements are drawn on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    id: SlideId,
    /// Background fill of the whole slide.
    pub background_color: String,
    elements: Vec<Element>,
}

impl Default for Slide {
    fn default() -> Self {
        Self::new()
    }
}

impl Slide {
    /// Create an empty slide with the default background.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: SlideId::new(),
            background_color: DEFAULT_BACKGROUND.to_string(),
            elements: Vec::new(),
        }
    }

    /// Set the background color.
    #[must_use]
    pub fn with_background(mut self, color: impl Into<String>) -> Self {
        self.background_color = color.into();
        self
    }

    /// The slide's immutable id.
    #[must_use]
    pub fn id(&self) -> SlideId {
        self.id
    }

    /// Elements in paint order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Number of elements on the slide.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Check if the slide has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Get an element by ID.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    /// Get a mutable reference to an element by ID.
    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Paint-order position of an element.
    #[must_use]
    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    /// Append an element on top of the others.
    ///
    /// An element whose id already exists on this slide is given a fresh id.
    pub fn add_element(&mut self, element: Element) -> ElementId {
        let index = self.elements.len();
        self.insert_element(index, element)
    }

    /// Insert an element at a paint-order position (clamped to the end).
    pub fn insert_element(&mut self, index: usize, mut element: Element) -> ElementId {
        if self.element(element.id).is_some() {
            element = element.duplicate();
        }
        let id = element.id;
        let index = index.min(self.elements.len());
        self.elements.insert(index, element);
        id
    }

    /// Remove an element, returning its former position and value.
    pub fn remove_element(&mut self, id: ElementId) -> Option<(usize, Element)> {
        let index = self.index_of(id)?;
        Some((index, self.elements.remove(index)))
    }

    /// Merge a patch into an element. Unknown ids are ignored.
    pub fn update_element(&mut self, id: ElementId, patch: &ElementPatch) -> bool {
        match self.element_mut(id) {
            Some(element) => {
                element.apply_patch(patch);
                true
            }
            None => false,
        }
    }

    /// Replace the element with the same id, returning the previous value.
    pub fn replace_element(&mut self, element: Element) -> Option<Element> {
        let slot = self.element_mut(element.id)?;
        Some(std::mem::replace(slot, element))
    }

    /// Move an element to a new paint-order position (clamped to the end).
    pub fn move_element(&mut self, id: ElementId, new_index: usize) -> bool {
        let Some(from) = self.index_of(id) else {
            return false;
        };
        let to = new_index.min(self.elements.len() - 1);
        if from == to {
            return false;
        }
        let element = self.elements.remove(from);
        self.elements.insert(to, element);
        true
    }

    /// Paint an element above all others.
    pub fn bring_to_front(&mut self, id: ElementId) -> bool {
        self.move_element(id, usize::MAX)
    }

    /// Paint an element below all others.
    pub fn send_to_back(&mut self, id: ElementId) -> bool {
        self.move_element(id, 0)
    }

    /// Find the topmost element at the given slide coordinates.
    #[must_use]
    pub fn element_at(&self, x: f32, y: f32) -> Option<ElementId> {
        self.elements
            .iter()
            .rev()
            .find(|e| e.contains_point(x, y))
            .map(|e| e.id)
    }

    /// Image sources referenced by this slide, in paint order.
    pub fn image_sources(&self) -> impl Iterator<Item = (ElementId, &str)> {
        self.elements
            .iter()
            .filter_map(|e| e.image_src().map(|src| (e.id, src)))
    }

    /// Deep copy with a new slide id and new element ids.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            id: SlideId::new(),
            background_color: self.background_color.clone(),
            elements: self.elements.iter().map(Element::duplicate).collect(),
        }
    }

    /// Check element id uniqueness and the at-rest size invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidDocument`] describing the first
    /// violation found.
    pub fn validate(&self) -> CanvasResult<()> {
        let mut seen = HashSet::with_capacity(self.elements.len());
        for element in &self.elements {
            if !seen.insert(element.id) {
                return Err(CanvasError::InvalidDocument(format!(
                    "slide {} contains element {} twice",
                    self.id, element.id
                )));
            }
            if !element.transform.is_at_rest() {
                return Err(CanvasError::InvalidDocument(format!(
                    "element {} on slide {} violates size or rotation bounds",
                    element.id, self.id
                )));
            }
            if !(0.0..=1.0).contains(&element.opacity) {
                return Err(CanvasError::InvalidDocument(format!(
                    "element {} on slide {} has opacity {}",
                    element.id, self.id, element.opacity
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ShapeConfig, TextElementInit, Transform};

    fn rect_at(x: f32, y: f32) -> Element {
        Element::shape(ShapeConfig {
            x,
            y,
            width: 100.0,
            height: 100.0,
            ..ShapeConfig::default()
        })
        .expect("rect")
    }

    #[test]
    fn test_slide_add_remove() {
        let mut slide = Slide::new();
        assert!(slide.is_empty());

        let id = slide.add_element(rect_at(0.0, 0.0));
        assert_eq!(slide.element_count(), 1);
        assert!(slide.element(id).is_some());

        let (index, removed) = slide.remove_element(id).expect("should remove");
        assert_eq!(index, 0);
        assert_eq!(removed.id, id);
        assert!(slide.is_empty());
        assert!(slide.remove_element(id).is_none());
    }

    #[test]
    fn test_add_element_reassigns_colliding_id() {
        let mut slide = Slide::new();
        let element = rect_at(0.0, 0.0);
        let first = slide.add_element(element.clone());
        let second = slide.add_element(element);
        assert_ne!(first, second);
        assert_eq!(slide.element_count(), 2);
    }

    #[test]
    fn test_element_at_prefers_topmost() {
        let mut slide = Slide::new();
        let below = slide.add_element(rect_at(0.0, 0.0));
        let above = slide.add_element(rect_at(50.0, 50.0));

        assert_eq!(slide.element_at(75.0, 75.0), Some(above));
        assert_eq!(slide.element_at(10.0, 10.0), Some(below));
        assert_eq!(slide.element_at(500.0, 500.0), None);
    }

    #[test]
    fn test_move_element_reorders_paint() {
        let mut slide = Slide::new();
        let a = slide.add_element(rect_at(0.0, 0.0));
        let b = slide.add_element(rect_at(0.0, 0.0));
        let c = slide.add_element(rect_at(0.0, 0.0));

        assert!(slide.bring_to_front(a));
        let order: Vec<_> = slide.elements().iter().map(|e| e.id).collect();
        assert_eq!(order, vec![b, c, a]);

        assert!(slide.send_to_back(a));
        assert!(!slide.send_to_back(a));
        assert_eq!(slide.index_of(a), Some(0));
    }

    #[test]
    fn test_duplicate_regenerates_ids() {
        let mut slide = Slide::new().with_background("#000000");
        slide.add_element(rect_at(10.0, 20.0));
        slide.add_element(Element::text(TextElementInit::new("hello")).expect("text"));

        let copy = slide.duplicate();
        assert_ne!(copy.id(), slide.id());
        assert_eq!(copy.background_color, "#000000");
        for (original, cloned) in slide.elements().iter().zip(copy.elements()) {
            assert_ne!(original.id, cloned.id);
            assert_eq!(original.kind, cloned.kind);
            assert_eq!(original.transform, cloned.transform);
        }
    }

    #[test]
    fn test_validate_rejects_undersized_element() {
        let mut slide = Slide::new();
        let tiny = rect_at(0.0, 0.0).with_transform(Transform {
            width: 10.0,
            height: 10.0,
            ..Transform::default()
        });
        slide.add_element(tiny);
        assert!(matches!(
            slide.validate(),
            Err(CanvasError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_image_sources_in_paint_order() {
        let mut slide = Slide::new();
        slide.add_element(Element::image("a.png", 100.0, 100.0).expect("a"));
        slide.add_element(rect_at(0.0, 0.0));
        slide.add_element(Element::image("b.png", 100.0, 100.0).expect("b"));

        let srcs: Vec<_> = slide.image_sources().map(|(_, src)| src).collect();
        assert_eq!(srcs, vec!["a.png", "b.png"]);
    }
}
