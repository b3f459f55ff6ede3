//! The slide deck: the authoritative ordered slide list.
//!
//! `SlideDeck` is the single owner of the slide-count invariant
//! `1 <= len <= MAX_SLIDES`. Guarded operations return an error *before*
//! touching any state, so a rejected call never leaves the deck torn.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{CanvasError, CanvasResult, Slide, SlideId};

/// Maximum number of slides in a carousel.
pub const MAX_SLIDES: usize = 10;

/// Minimum number of slides in a carousel.
pub const MIN_SLIDES: usize = 1;

/// Pixel size of the editing canvas; every slide and export page shares it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl CanvasSize {
    /// Create a canvas size.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    #[must_use]
    pub fn aspect_ratio(&self) -> f32 {
        self.width / self.height
    }
}

impl Default for CanvasSize {
    /// Portrait 4:5, the common carousel format.
    fn default() -> Self {
        Self::new(1080.0, 1350.0)
    }
}

/// An immutable copy of the deck taken at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckSnapshot {
    /// Canvas size at snapshot time.
    pub canvas: CanvasSize,
    /// Slides in order.
    pub slides: Vec<Slide>,
}

/// Ordered collection of slides plus the current-slide cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideDeck {
    canvas: CanvasSize,
    slides: Vec<Slide>,
    current: usize,
}

impl Default for SlideDeck {
    fn default() -> Self {
        Self::new(CanvasSize::default())
    }
}

impl SlideDeck {
    /// Create a deck holding one empty slide.
    #[must_use]
    pub fn new(canvas: CanvasSize) -> Self {
        Self {
            canvas,
            slides: vec![Slide::new()],
            current: 0,
        }
    }

    /// Build a deck from existing slides.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidDocument`] if the slide count is out of
    /// bounds, a slide id repeats, or any slide fails validation.
    pub fn from_slides(canvas: CanvasSize, slides: Vec<Slide>, current: usize) -> CanvasResult<Self> {
        if !(MIN_SLIDES..=MAX_SLIDES).contains(&slides.len()) {
            return Err(CanvasError::InvalidDocument(format!(
                "a carousel needs {MIN_SLIDES} to {MAX_SLIDES} slides, found {}",
                slides.len()
            )));
        }
        if !(canvas.width.is_finite() && canvas.height.is_finite())
            || canvas.width <= 0.0
            || canvas.height <= 0.0
        {
            return Err(CanvasError::InvalidDocument(format!(
                "canvas size {}x{} is not positive",
                canvas.width, canvas.height
            )));
        }

        let mut seen = HashSet::with_capacity(slides.len());
        for slide in &slides {
            if !seen.insert(slide.id()) {
                return Err(CanvasError::InvalidDocument(format!(
                    "slide {} appears twice",
                    slide.id()
                )));
            }
            slide.validate()?;
        }

        let current = current.min(slides.len() - 1);
        Ok(Self {
            canvas,
            slides,
            current,
        })
    }

    /// Canvas size shared by all slides.
    #[must_use]
    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    /// All slides in order.
    #[must_use]
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Number of slides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Always false for a valid deck; provided for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Whether no more slides can be added.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.slides.len() >= MAX_SLIDES
    }

    /// Index of the current slide.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The current slide.
    #[must_use]
    pub fn current_slide(&self) -> &Slide {
        &self.slides[self.current]
    }

    /// Mutable access to the current slide.
    pub fn current_slide_mut(&mut self) -> &mut Slide {
        &mut self.slides[self.current]
    }

    /// Slide at `index`.
    #[must_use]
    pub fn slide(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    /// Mutable slide at `index`.
    pub fn slide_mut(&mut self, index: usize) -> Option<&mut Slide> {
        self.slides.get_mut(index)
    }

    /// Position of the slide with the given id.
    #[must_use]
    pub fn index_of(&self, id: SlideId) -> Option<usize> {
        self.slides.iter().position(|s| s.id() == id)
    }

    /// Slide with the given id.
    #[must_use]
    pub fn slide_by_id(&self, id: SlideId) -> Option<&Slide> {
        self.slides.iter().find(|s| s.id() == id)
    }

    /// Mutable slide with the given id.
    pub fn slide_by_id_mut(&mut self, id: SlideId) -> Option<&mut Slide> {
        self.slides.iter_mut().find(|s| s.id() == id)
    }

    /// Move the cursor to `index`. Out-of-range indices are ignored.
    pub fn set_current(&mut self, index: usize) -> bool {
        if index >= self.slides.len() || index == self.current {
            return false;
        }
        tracing::debug!("Current slide {} -> {}", self.current, index);
        self.current = index;
        true
    }

    /// Append a new empty slide and make it current.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::SlideLimitExceeded`] when the deck is full.
    pub fn add_slide(&mut self) -> CanvasResult<SlideId> {
        let index = self.slides.len();
        self.insert_slide(index, Slide::new())
    }

    /// Clone the slide at `index` (fresh slide and element ids), insert the
    /// copy right after it and make the copy current.
    ///
    /// Returns `Ok(None)` for an out-of-range index.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::SlideLimitExceeded`] when the deck is full.
    pub fn duplicate_slide(&mut self, index: usize) -> CanvasResult<Option<SlideId>> {
        let Some(source) = self.slides.get(index) else {
            tracing::debug!("Ignoring duplicate of missing slide {index}");
            return Ok(None);
        };
        if self.is_full() {
            return Err(CanvasError::SlideLimitExceeded);
        }
        let copy = source.duplicate();
        self.insert_slide(index + 1, copy).map(Some)
    }

    /// Insert `slide` at `index` (clamped to the end) and make it current.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::SlideLimitExceeded`] when the deck is full, or
    /// [`CanvasError::InvalidDocument`] if a slide with the same id exists.
    pub fn insert_slide(&mut self, index: usize, slide: Slide) -> CanvasResult<SlideId> {
        if self.is_full() {
            tracing::warn!("Slide limit of {MAX_SLIDES} reached");
            return Err(CanvasError::SlideLimitExceeded);
        }
        let id = slide.id();
        if self.index_of(id).is_some() {
            return Err(CanvasError::InvalidDocument(format!(
                "slide {id} is already in the deck"
            )));
        }
        let index = index.min(self.slides.len());
        self.slides.insert(index, slide);
        self.current = index;
        tracing::debug!("Inserted slide {id} at {index}, {} slides", self.slides.len());
        Ok(id)
    }

    /// Remove the slide at `index`.
    ///
    /// Returns `Ok(None)` for an out-of-range index. If the cursor ends up
    /// past the last slide it moves to the new last slide; otherwise the
    /// cursor index is kept.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::MinimumSlideCount`] when only one slide remains.
    pub fn delete_slide(&mut self, index: usize) -> CanvasResult<Option<Slide>> {
        if index >= self.slides.len() {
            tracing::debug!("Ignoring delete of missing slide {index}");
            return Ok(None);
        }
        if self.slides.len() <= MIN_SLIDES {
            tracing::warn!("Refusing to delete the last slide");
            return Err(CanvasError::MinimumSlideCount);
        }
        let removed = self.slides.remove(index);
        if self.current >= self.slides.len() {
            self.current = self.slides.len() - 1;
        }
        tracing::debug!(
            "Deleted slide {} at {index}, current {}",
            removed.id(),
            self.current
        );
        Ok(Some(removed))
    }

    /// Move the slide at `from` to position `to`, shifting the slides in
    /// between. Equal or out-of-range indices leave the deck unchanged.
    ///
    /// The cursor keeps pointing at the same slide.
    pub fn reorder_slide(&mut self, from: usize, to: usize) -> bool {
        let len = self.slides.len();
        if from == to || from >= len || to >= len {
            if from != to {
                tracing::debug!("Ignoring reorder {from} -> {to} with {len} slides");
            }
            return false;
        }

        let current_id = self.slides[self.current].id();
        let slide = self.slides.remove(from);
        self.slides.insert(to, slide);
        self.current = self.index_of(current_id).unwrap_or(self.current);
        tracing::debug!("Reordered slide {from} -> {to}");
        true
    }

    /// Copy of the slide list for background work such as export.
    #[must_use]
    pub fn snapshot(&self) -> DeckSnapshot {
        DeckSnapshot {
            canvas: self.canvas,
            slides: self.slides.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Element, ShapeConfig};

    fn deck_with(count: usize) -> SlideDeck {
        let mut deck = SlideDeck::default();
        for _ in 1..count {
            deck.add_slide().expect("below limit");
        }
        deck
    }

    fn ids(deck: &SlideDeck) -> Vec<SlideId> {
        deck.slides().iter().map(Slide::id).collect()
    }

    #[test]
    fn test_add_four_slides_moves_cursor() {
        let mut deck = SlideDeck::default();
        for _ in 0..4 {
            deck.add_slide().expect("add");
        }
        assert_eq!(deck.len(), 5);
        assert_eq!(deck.current_index(), 4);
    }

    #[test]
    fn test_add_rejected_at_limit() {
        let mut deck = deck_with(MAX_SLIDES);
        let before = ids(&deck);
        assert!(matches!(
            deck.add_slide(),
            Err(CanvasError::SlideLimitExceeded)
        ));
        assert_eq!(ids(&deck), before);
    }

    #[test]
    fn test_delete_last_remaining_slide_rejected() {
        let mut deck = SlideDeck::default();
        assert!(matches!(
            deck.delete_slide(0),
            Err(CanvasError::MinimumSlideCount)
        ));
        assert_eq!(deck.len(), 1);
    }

    #[test]
    fn test_delete_out_of_range_is_noop() {
        let mut deck = deck_with(3);
        assert!(deck.delete_slide(7).expect("no error").is_none());
        assert_eq!(deck.len(), 3);
    }

    #[test]
    fn test_delete_final_slide_moves_cursor_back() {
        let mut deck = deck_with(3);
        assert_eq!(deck.current_index(), 2);
        deck.delete_slide(2).expect("delete");
        assert_eq!(deck.current_index(), 1);
    }

    #[test]
    fn test_delete_keeps_cursor_index_stable() {
        let mut deck = deck_with(4);
        deck.set_current(1);
        deck.delete_slide(3).expect("delete");
        assert_eq!(deck.current_index(), 1);
        deck.delete_slide(0).expect("delete");
        assert_eq!(deck.current_index(), 1);
    }

    #[test]
    fn test_duplicate_inserts_after_source() {
        let mut deck = deck_with(2);
        deck.slide_mut(0)
            .expect("slide")
            .add_element(Element::shape(ShapeConfig::default()).expect("rect"));
        let source_id = deck.slides()[0].id();

        let copy_id = deck.duplicate_slide(0).expect("dup").expect("in range");
        assert_eq!(deck.len(), 3);
        assert_eq!(deck.slides()[0].id(), source_id);
        assert_eq!(deck.slides()[1].id(), copy_id);
        assert_eq!(deck.current_index(), 1);
        assert_eq!(deck.slides()[1].element_count(), 1);
    }

    #[test]
    fn test_duplicate_rejected_at_limit() {
        let mut deck = deck_with(MAX_SLIDES);
        assert!(matches!(
            deck.duplicate_slide(0),
            Err(CanvasError::SlideLimitExceeded)
        ));
        assert_eq!(deck.len(), MAX_SLIDES);
    }

    #[test]
    fn test_reorder_same_index_is_identity() {
        let mut deck = deck_with(4);
        let before = ids(&deck);
        assert!(!deck.reorder_slide(2, 2));
        assert_eq!(ids(&deck), before);
    }

    #[test]
    fn test_reorder_shifts_intervening_slides() {
        let mut deck = deck_with(4);
        let before = ids(&deck);
        assert!(deck.reorder_slide(0, 2));
        assert_eq!(ids(&deck), vec![before[1], before[2], before[0], before[3]]);
        assert!(deck.reorder_slide(3, 1));
        assert_eq!(ids(&deck), vec![before[1], before[3], before[2], before[0]]);
    }

    #[test]
    fn test_reorder_out_of_range_ignored() {
        let mut deck = deck_with(3);
        let before = ids(&deck);
        assert!(!deck.reorder_slide(0, 3));
        assert!(!deck.reorder_slide(9, 0));
        assert_eq!(ids(&deck), before);
    }

    #[test]
    fn test_reorder_cursor_follows_slide() {
        let mut deck = deck_with(3);
        deck.set_current(0);
        let current = deck.current_slide().id();
        deck.reorder_slide(0, 2);
        assert_eq!(deck.current_slide().id(), current);
        assert_eq!(deck.current_index(), 2);
    }

    #[test]
    fn test_from_slides_validates_count() {
        assert!(SlideDeck::from_slides(CanvasSize::default(), Vec::new(), 0).is_err());
        let too_many = (0..=MAX_SLIDES).map(|_| Slide::new()).collect();
        assert!(SlideDeck::from_slides(CanvasSize::default(), too_many, 0).is_err());
    }

    #[test]
    fn test_from_slides_rejects_duplicate_ids() {
        let slide = Slide::new();
        let result =
            SlideDeck::from_slides(CanvasSize::default(), vec![slide.clone(), slide], 0);
        assert!(matches!(result, Err(CanvasError::InvalidDocument(_))));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut deck = deck_with(2);
        let snapshot = deck.snapshot();
        deck.add_slide().expect("add");
        assert_eq!(snapshot.slides.len(), 2);
        assert_eq!(deck.len(), 3);
    }
}
