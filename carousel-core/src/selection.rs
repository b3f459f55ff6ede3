//! Selection and transform engine.
//!
//! A single [`InteractionState`] value drives every gesture:
//!
//! ```text
//! Idle ──select──▶ Selected ──begin_drag──────▶ Dragging ─────end_drag──────┐
//!                     │      ──begin_transform─▶ Transforming ─end_transform─┤
//!                     │      ──begin_text_edit─▶ Editing ──commit/cancel─────┤
//!                     ◀──────────────────────────────────────────────────────┘
//! ```
//!
//! Because there is only one state value, at most one element can be
//! selected and at most one element can be in text-edit mode.
//!
//! Every operation is total: ids that are not on the given slide are
//! ignored. Completed mutations are queued as [`ElementChange`]s and drained
//! by the editor with [`SelectionEngine::take_changes`].

use serde::{Deserialize, Serialize};

use crate::element::{normalize_rotation, MIN_HEIGHT, MIN_WIDTH};
use crate::{Element, ElementId, Slide, Transform};

/// Current interaction with the slide's elements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InteractionState {
    /// Nothing selected.
    #[default]
    Idle,
    /// One element selected, no gesture in progress.
    Selected {
        /// Selected element.
        id: ElementId,
    },
    /// The selected element is being moved.
    Dragging {
        /// Dragged element.
        id: ElementId,
        /// Transform when the drag started.
        start: Transform,
    },
    /// The selected element is being resized or rotated.
    Transforming {
        /// Transformed element.
        id: ElementId,
        /// Transform when the gesture started.
        start: Transform,
    },
    /// The selected text element is being edited out of band.
    Editing {
        /// Edited element.
        id: ElementId,
        /// Text before editing started.
        original: String,
        /// Text typed so far.
        draft: String,
    },
}

impl InteractionState {
    /// The element this state refers to, if any.
    #[must_use]
    pub fn element(&self) -> Option<ElementId> {
        match self {
            Self::Idle => None,
            Self::Selected { id }
            | Self::Dragging { id, .. }
            | Self::Transforming { id, .. }
            | Self::Editing { id, .. } => Some(*id),
        }
    }
}

/// Live values reported by an interactive resize/rotate handle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformUpdate {
    /// Current x position.
    pub x: f32,
    /// Current y position.
    pub y: f32,
    /// Horizontal scale relative to the width at rest.
    pub scale_x: f32,
    /// Vertical scale relative to the height at rest.
    pub scale_y: f32,
    /// Current rotation in degrees.
    pub rotation: f32,
}

/// Before/after pair of an element mutated by a completed gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementChange {
    /// Element state before the gesture.
    pub before: Element,
    /// Element state after the gesture.
    pub after: Element,
}

/// Session-scoped selection and gesture tracker.
#[derive(Debug, Clone, Default)]
pub struct SelectionEngine {
    state: InteractionState,
    changes: Vec<ElementChange>,
}

impl SelectionEngine {
    /// Create an idle engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    /// The selected element, including one being dragged, transformed or edited.
    #[must_use]
    pub fn selected(&self) -> Option<ElementId> {
        self.state.element()
    }

    /// The element in text-edit mode, if any.
    #[must_use]
    pub fn editing(&self) -> Option<ElementId> {
        match &self.state {
            InteractionState::Editing { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Text typed so far in the active edit.
    #[must_use]
    pub fn draft(&self) -> Option<&str> {
        match &self.state {
            InteractionState::Editing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Drain mutations completed since the last call.
    pub fn take_changes(&mut self) -> Vec<ElementChange> {
        std::mem::take(&mut self.changes)
    }

    /// Select `id` exclusively. Unknown ids are ignored.
    pub fn select(&mut self, slide: &mut Slide, id: ElementId) {
        if slide.element(id).is_none() || self.selected() == Some(id) {
            return;
        }
        self.finish(slide);
        tracing::debug!("Selected element {id}");
        self.state = InteractionState::Selected { id };
    }

    /// Finish any gesture and clear the selection.
    pub fn deselect(&mut self, slide: &mut Slide) {
        self.finish(slide);
        self.state = InteractionState::Idle;
    }

    /// Finish any gesture in progress, keeping the element selected.
    pub fn settle(&mut self, slide: &mut Slide) {
        self.finish(slide);
    }

    /// Drop all state referring to `id` without committing anything.
    ///
    /// Used when the element disappears from the slide.
    pub fn forget(&mut self, id: ElementId) {
        if self.selected() == Some(id) {
            self.state = InteractionState::Idle;
        }
    }

    /// Drop all state without committing anything.
    pub fn reset(&mut self) {
        self.state = InteractionState::Idle;
    }

    /// Start moving `id`. Ignored for unknown ids and for the element being
    /// edited, which is not draggable.
    pub fn begin_drag(&mut self, slide: &mut Slide, id: ElementId) {
        let Some(start) = self.gesture_start(slide, id) else {
            return;
        };
        self.state = InteractionState::Dragging { id, start };
    }

    /// Move the dragged element to `(x, y)`.
    pub fn update_drag(&mut self, slide: &mut Slide, x: f32, y: f32) {
        let InteractionState::Dragging { id, .. } = self.state else {
            return;
        };
        if !(x.is_finite() && y.is_finite()) {
            return;
        }
        match slide.element_mut(id) {
            Some(element) => {
                element.transform.x = x;
                element.transform.y = y;
            }
            None => self.state = InteractionState::Idle,
        }
    }

    /// Finish the drag, snapping the position to whole pixels.
    pub fn end_drag(&mut self, slide: &mut Slide) {
        let InteractionState::Dragging { id, start } = self.state else {
            return;
        };
        let Some(element) = slide.element_mut(id) else {
            self.state = InteractionState::Idle;
            return;
        };
        let before = Element {
            transform: start,
            ..element.clone()
        };
        element.transform.x = element.transform.x.round();
        element.transform.y = element.transform.y.round();
        let after = element.clone();
        self.record(before, after);
        self.state = InteractionState::Selected { id };
    }

    /// Start resizing/rotating `id`.
    pub fn begin_transform(&mut self, slide: &mut Slide, id: ElementId) {
        let Some(start) = self.gesture_start(slide, id) else {
            return;
        };
        self.state = InteractionState::Transforming { id, start };
    }

    /// Apply live handle values. Scales that would shrink the element below
    /// the minimum box are clamped.
    pub fn update_transform(&mut self, slide: &mut Slide, update: TransformUpdate) {
        let InteractionState::Transforming { id, .. } = self.state else {
            return;
        };
        let Some(element) = slide.element_mut(id) else {
            self.state = InteractionState::Idle;
            return;
        };
        let t = &mut element.transform;
        if update.x.is_finite() {
            t.x = update.x;
        }
        if update.y.is_finite() {
            t.y = update.y;
        }
        if update.rotation.is_finite() {
            t.rotation = update.rotation;
        }
        t.scale_x = clamp_scale(update.scale_x, t.width, MIN_WIDTH);
        t.scale_y = clamp_scale(update.scale_y, t.height, MIN_HEIGHT);
    }

    /// Finish the transform: bake the scale into width/height (floored to
    /// the minimums), reset it to 1 and round the rotation to whole degrees.
    pub fn end_transform(&mut self, slide: &mut Slide) {
        let InteractionState::Transforming { id, start } = self.state else {
            return;
        };
        let Some(element) = slide.element_mut(id) else {
            self.state = InteractionState::Idle;
            return;
        };
        let before = Element {
            transform: start,
            ..element.clone()
        };
        let t = &mut element.transform;
        t.bake_scale();
        t.rotation = normalize_rotation(t.rotation.round());
        let after = element.clone();
        self.record(before, after);
        self.state = InteractionState::Selected { id };
    }

    /// Enter text-edit mode on a text element.
    ///
    /// Non-text elements and unknown ids are ignored. An edit already in
    /// progress on another element is committed first.
    pub fn begin_text_edit(&mut self, slide: &mut Slide, id: ElementId) {
        if self.editing() == Some(id) {
            return;
        }
        let Some(text) = slide.element(id).and_then(Element::as_text) else {
            return;
        };
        let original = text.text.clone();
        self.finish(slide);
        tracing::debug!("Editing text of element {id}");
        self.state = InteractionState::Editing {
            id,
            draft: original.clone(),
            original,
        };
    }

    /// Replace the draft of the active edit.
    pub fn update_text_draft(&mut self, text: impl Into<String>) {
        if let InteractionState::Editing { draft, .. } = &mut self.state {
            *draft = text.into();
        }
    }

    /// Write `text` to the edited element and return to `Selected`.
    pub fn commit_text_edit(&mut self, slide: &mut Slide, text: impl Into<String>) {
        self.update_text_draft(text);
        self.commit_draft(slide);
    }

    /// Discard the draft and return to `Selected`.
    pub fn cancel_text_edit(&mut self, slide: &mut Slide) {
        let InteractionState::Editing { id, .. } = self.state else {
            return;
        };
        self.state = if slide.element(id).is_some() {
            InteractionState::Selected { id }
        } else {
            InteractionState::Idle
        };
    }

    fn commit_draft(&mut self, slide: &mut Slide) {
        if !matches!(self.state, InteractionState::Editing { .. }) {
            return;
        }
        let InteractionState::Editing { id, draft, .. } =
            std::mem::take(&mut self.state)
        else {
            return;
        };
        let Some(element) = slide.element_mut(id) else {
            return;
        };
        let before = element.clone();
        if let Some(style) = element.as_text_mut() {
            style.text = draft;
        }
        let after = element.clone();
        self.record(before, after);
        self.state = InteractionState::Selected { id };
    }

    /// Common preamble of drag/transform: validate the target, finish any
    /// other gesture and select the target.
    fn gesture_start(&mut self, slide: &mut Slide, id: ElementId) -> Option<Transform> {
        if self.editing() == Some(id) {
            return None;
        }
        slide.element(id)?;
        self.finish(slide);
        slide.element(id).map(|e| e.transform)
    }

    /// Complete whatever gesture is in progress, keeping the selection.
    fn finish(&mut self, slide: &mut Slide) {
        match self.state {
            InteractionState::Idle | InteractionState::Selected { .. } => {}
            InteractionState::Dragging { .. } => self.end_drag(slide),
            InteractionState::Transforming { .. } => self.end_transform(slide),
            InteractionState::Editing { .. } => self.commit_draft(slide),
        }
    }

    fn record(&mut self, before: Element, after: Element) {
        if before != after {
            self.changes.push(ElementChange { before, after });
        }
    }
}

/// Clamp a live scale so `base * scale` never drops below `min`.
fn clamp_scale(scale: f32, base: f32, min: f32) -> f32 {
    let floor = if base > 0.0 { min / base } else { 1.0 };
    if scale.is_finite() {
        scale.max(floor)
    } else {
        1.0_f32.max(floor)
    }
}
