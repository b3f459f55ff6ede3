//! Editor session: the deck, the interaction state and the undo history
//! behind one synchronous API.
//!
//! The editor is the only caller that mutates a [`SlideDeck`] on behalf of a
//! user. Every change it makes is recorded in [`History`], and guard
//! violations from the deck become [`Notice`]s instead of errors so a UI can
//! show them without unwinding.

use std::fmt;

use crate::history::{Command, History};
use crate::selection::{SelectionEngine, TransformUpdate};
use crate::{
    CanvasError, CanvasResult, CanvasSize, Element, ElementId, ElementPatch, ShapeConfig, Slide,
    SlideDeck, SlideId, TextElementInit, MAX_SLIDES, MIN_SLIDES,
};

/// User-visible message produced by a rejected operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A slide could not be added because the deck is full.
    SlideLimitReached,
    /// The only remaining slide cannot be deleted.
    LastSlideProtected,
    /// An undo or redo step could not be applied and was dropped.
    HistoryStepFailed(String),
    /// Any other rejected operation.
    Rejected(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SlideLimitReached => write!(f, "A carousel can have at most {MAX_SLIDES} slides"),
            Self::LastSlideProtected => write!(f, "A carousel needs at least one slide"),
            Self::HistoryStepFailed(reason) => write!(f, "Could not apply history step: {reason}"),
            Self::Rejected(reason) => write!(f, "{reason}"),
        }
    }
}

/// Single-owner editing session over a deck.
#[derive(Debug, Clone, Default)]
pub struct Editor {
    deck: SlideDeck,
    selection: SelectionEngine,
    history: History,
    notices: Vec<Notice>,
}

impl Editor {
    /// Start a session on a fresh one-slide deck.
    #[must_use]
    pub fn new(canvas: CanvasSize) -> Self {
        Self::from_deck(SlideDeck::new(canvas))
    }

    /// Start a session on an existing deck.
    #[must_use]
    pub fn from_deck(deck: SlideDeck) -> Self {
        Self {
            deck,
            selection: SelectionEngine::new(),
            history: History::new(),
            notices: Vec::new(),
        }
    }

    /// The deck being edited.
    #[must_use]
    pub fn deck(&self) -> &SlideDeck {
        &self.deck
    }

    /// End the session, returning the deck.
    #[must_use]
    pub fn into_deck(self) -> SlideDeck {
        self.deck
    }

    /// Selection and gesture state.
    #[must_use]
    pub fn selection(&self) -> &SelectionEngine {
        &self.selection
    }

    /// Undo history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The slide being edited.
    #[must_use]
    pub fn current_slide(&self) -> &Slide {
        self.deck.current_slide()
    }

    /// The selected element, if any.
    #[must_use]
    pub fn selected(&self) -> Option<ElementId> {
        self.selection.selected()
    }

    /// The element in text-edit mode, hidden on the live canvas.
    #[must_use]
    pub fn editing(&self) -> Option<ElementId> {
        self.selection.editing()
    }

    /// Drain notices produced since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // Slides

    /// Append an empty slide and make it current.
    pub fn add_slide(&mut self) -> Option<SlideId> {
        if self.deck.is_full() {
            self.notice(&CanvasError::SlideLimitExceeded);
            return None;
        }
        self.leave_slide();
        match self.deck.add_slide() {
            Ok(id) => {
                self.record_inserted_slide(id);
                Some(id)
            }
            Err(err) => {
                self.notice(&err);
                None
            }
        }
    }

    /// Duplicate the slide at `index` and make the copy current.
    pub fn duplicate_slide(&mut self, index: usize) -> Option<SlideId> {
        if index >= self.deck.len() {
            return None;
        }
        if self.deck.is_full() {
            self.notice(&CanvasError::SlideLimitExceeded);
            return None;
        }
        self.leave_slide();
        match self.deck.duplicate_slide(index) {
            Ok(Some(id)) => {
                self.record_inserted_slide(id);
                Some(id)
            }
            Ok(None) => None,
            Err(err) => {
                self.notice(&err);
                None
            }
        }
    }

    /// Delete the slide at `index`.
    pub fn delete_slide(&mut self, index: usize) -> bool {
        if index >= self.deck.len() {
            return false;
        }
        if self.deck.len() <= MIN_SLIDES {
            self.notice(&CanvasError::MinimumSlideCount);
            return false;
        }
        self.leave_slide();
        match self.deck.delete_slide(index) {
            Ok(Some(slide)) => {
                self.history.record(Command::RemoveSlide { index, slide });
                true
            }
            Ok(None) => false,
            Err(err) => {
                self.notice(&err);
                false
            }
        }
    }

    /// Move the slide at `from` to `to`. The current slide stays current.
    pub fn reorder_slide(&mut self, from: usize, to: usize) -> bool {
        let moved = self.deck.reorder_slide(from, to);
        if moved {
            self.history.record(Command::MoveSlide { from, to });
        }
        moved
    }

    /// Make the slide at `index` current, clearing the selection.
    pub fn select_slide(&mut self, index: usize) -> bool {
        if index >= self.deck.len() || index == self.deck.current_index() {
            return false;
        }
        self.leave_slide();
        self.deck.set_current(index)
    }

    /// Change the current slide's background color.
    pub fn set_background(&mut self, color: impl Into<String>) {
        let after = color.into();
        if self.deck.current_slide().background_color == after {
            return;
        }
        self.settle();
        let slide = self.deck.current_slide_mut();
        let before = std::mem::replace(&mut slide.background_color, after.clone());
        let id = slide.id();
        self.history.record(Command::SetBackground {
            slide: id,
            before,
            after,
        });
    }

    // Elements

    /// Insert a text element on the current slide and select it.
    ///
    /// Requested sizes below the element minimums are clamped up.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] for non-finite or out-of-range
    /// style values.
    pub fn insert_text(&mut self, init: TextElementInit) -> CanvasResult<Element> {
        let element = Element::text(init.clamped())?;
        Ok(self.insert(element))
    }

    /// Insert an image centered on the canvas and select it.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] for an empty source or a
    /// non-positive natural size.
    pub fn insert_image(
        &mut self,
        src: impl Into<String>,
        natural_width: f32,
        natural_height: f32,
    ) -> CanvasResult<Element> {
        let element = self.centered(Element::image(src, natural_width, natural_height)?);
        Ok(self.insert(element))
    }

    /// Insert a shape centered on the canvas and select it.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Validation`] for an invalid shape config.
    pub fn insert_shape(&mut self, config: ShapeConfig) -> CanvasResult<Element> {
        let element = self.centered(Element::shape(config)?);
        Ok(self.insert(element))
    }

    /// Remove an element from the current slide.
    pub fn remove_element(&mut self, id: ElementId) -> bool {
        if self.deck.current_slide().element(id).is_none() {
            return false;
        }
        self.settle();
        let slide = self.deck.current_slide_mut();
        let Some((index, element)) = slide.remove_element(id) else {
            return false;
        };
        let slide_id = slide.id();
        self.selection.forget(id);
        self.history.record(Command::RemoveElement {
            slide: slide_id,
            index,
            element,
        });
        true
    }

    /// Merge a patch into an element on the current slide.
    pub fn update_element(&mut self, id: ElementId, patch: &ElementPatch) -> bool {
        if self.deck.current_slide().element(id).is_none() {
            return false;
        }
        self.settle();
        let slide = self.deck.current_slide_mut();
        let slide_id = slide.id();
        let Some(element) = slide.element_mut(id) else {
            return false;
        };
        let before = element.clone();
        element.apply_patch(patch);
        if *element == before {
            return false;
        }
        let after = element.clone();
        self.history.record(Command::ReplaceElement {
            slide: slide_id,
            before,
            after,
        });
        true
    }

    /// Paint an element above all others on the current slide.
    pub fn bring_to_front(&mut self, id: ElementId) -> bool {
        self.move_element(id, usize::MAX)
    }

    /// Paint an element below all others on the current slide.
    pub fn send_to_back(&mut self, id: ElementId) -> bool {
        self.move_element(id, 0)
    }

    fn move_element(&mut self, id: ElementId, to: usize) -> bool {
        if self.deck.current_slide().element(id).is_none() {
            return false;
        }
        self.settle();
        let slide = self.deck.current_slide_mut();
        let Some(from) = slide.index_of(id) else {
            return false;
        };
        if !slide.move_element(id, to) {
            return false;
        }
        let to = slide.index_of(id).unwrap_or(from);
        let slide_id = slide.id();
        self.history.record(Command::MoveElement {
            slide: slide_id,
            element: id,
            from,
            to,
        });
        true
    }

    // Selection and gestures

    /// Select an element on the current slide.
    pub fn select(&mut self, id: ElementId) {
        self.selection.select(self.deck.current_slide_mut(), id);
        self.collect_changes();
    }

    /// Select the topmost element under a point, or clear the selection.
    pub fn select_at(&mut self, x: f32, y: f32) -> Option<ElementId> {
        match self.deck.current_slide().element_at(x, y) {
            Some(id) => {
                self.select(id);
                Some(id)
            }
            None => {
                self.deselect();
                None
            }
        }
    }

    /// Clear the selection, completing any gesture.
    pub fn deselect(&mut self) {
        self.selection.deselect(self.deck.current_slide_mut());
        self.collect_changes();
    }

    /// Start moving an element.
    pub fn begin_drag(&mut self, id: ElementId) {
        self.selection.begin_drag(self.deck.current_slide_mut(), id);
        self.collect_changes();
    }

    /// Report the dragged element's live position.
    pub fn update_drag(&mut self, x: f32, y: f32) {
        self.selection.update_drag(self.deck.current_slide_mut(), x, y);
    }

    /// Finish the drag.
    pub fn end_drag(&mut self) {
        self.selection.end_drag(self.deck.current_slide_mut());
        self.collect_changes();
    }

    /// Start resizing or rotating an element.
    pub fn begin_transform(&mut self, id: ElementId) {
        self.selection
            .begin_transform(self.deck.current_slide_mut(), id);
        self.collect_changes();
    }

    /// Report live handle values.
    pub fn update_transform(&mut self, update: TransformUpdate) {
        self.selection
            .update_transform(self.deck.current_slide_mut(), update);
    }

    /// Finish the transform.
    pub fn end_transform(&mut self) {
        self.selection.end_transform(self.deck.current_slide_mut());
        self.collect_changes();
    }

    /// Enter text-edit mode on a text element.
    pub fn begin_text_edit(&mut self, id: ElementId) {
        self.selection
            .begin_text_edit(self.deck.current_slide_mut(), id);
        self.collect_changes();
    }

    /// Replace the draft text of the active edit.
    pub fn update_text_draft(&mut self, text: impl Into<String>) {
        self.selection.update_text_draft(text);
    }

    /// Commit the active edit with `text`.
    pub fn commit_text_edit(&mut self, text: impl Into<String>) {
        self.selection
            .commit_text_edit(self.deck.current_slide_mut(), text);
        self.collect_changes();
    }

    /// Discard the active edit.
    pub fn cancel_text_edit(&mut self) {
        self.selection.cancel_text_edit(self.deck.current_slide_mut());
    }

    // History

    /// Undo the most recent change.
    pub fn undo(&mut self) -> bool {
        if !self.history.can_undo() {
            return false;
        }
        self.leave_slide();
        let result = self.history.undo(&mut self.deck);
        self.history_step(result)
    }

    /// Redo the most recently undone change.
    pub fn redo(&mut self) -> bool {
        if !self.history.can_redo() {
            return false;
        }
        self.leave_slide();
        let result = self.history.redo(&mut self.deck);
        self.history_step(result)
    }

    fn history_step(&mut self, result: CanvasResult<bool>) -> bool {
        match result {
            Ok(applied) => applied,
            Err(err) => {
                tracing::warn!("Dropping history step: {err}");
                self.notices.push(Notice::HistoryStepFailed(err.to_string()));
                false
            }
        }
    }

    fn insert(&mut self, element: Element) -> Element {
        let slide = self.deck.current_slide_mut();
        let index = slide.element_count();
        let mut stored = element.clone();
        stored.id = slide.insert_element(index, element);
        let id = stored.id;
        let slide_id = slide.id();
        tracing::debug!("Inserted {} element {id}", stored.kind.name());
        self.history.record(Command::InsertElement {
            slide: slide_id,
            index,
            element: stored.clone(),
        });
        self.select(id);
        stored
    }

    fn centered(&self, mut element: Element) -> Element {
        let canvas = self.deck.canvas();
        element.transform.x = ((canvas.width - element.transform.width) / 2.0).round();
        element.transform.y = ((canvas.height - element.transform.height) / 2.0).round();
        element
    }

    /// Complete any gesture on the current slide and clear the selection
    /// before the current slide changes.
    fn leave_slide(&mut self) {
        self.deselect();
    }

    /// Complete any gesture on the current slide, keeping the selection,
    /// so a structural change never captures an element mid-gesture.
    fn settle(&mut self) {
        self.selection.settle(self.deck.current_slide_mut());
        self.collect_changes();
    }

    fn collect_changes(&mut self) {
        let slide = self.deck.current_slide().id();
        for change in self.selection.take_changes() {
            self.history.record(Command::ReplaceElement {
                slide,
                before: change.before,
                after: change.after,
            });
        }
    }

    fn record_inserted_slide(&mut self, id: SlideId) {
        let index = self.deck.current_index();
        if let Some(slide) = self.deck.slide_by_id(id) {
            self.history.record(Command::InsertSlide {
                index,
                slide: slide.clone(),
            });
        }
    }

    fn notice(&mut self, err: &CanvasError) {
        let notice = match err {
            CanvasError::SlideLimitExceeded => Notice::SlideLimitReached,
            CanvasError::MinimumSlideCount => Notice::LastSlideProtected,
            other => Notice::Rejected(other.to_string()),
        };
        tracing::warn!("Rejected slide operation: {notice}");
        self.notices.push(notice);
    }
}
