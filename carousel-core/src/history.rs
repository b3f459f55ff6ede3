//! Undo/redo as a stack of invertible commands.
//!
//! Every command is applied through the same guarded [`SlideDeck`] and
//! [`Slide`] operations the editor uses, so replaying history can never
//! break a deck invariant.

use crate::{CanvasError, CanvasResult, Element, ElementId, Slide, SlideDeck, SlideId};

/// Default number of commands kept for undo.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// A recorded, invertible edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A slide was inserted at `index`.
    InsertSlide {
        /// Position of the new slide.
        index: usize,
        /// The inserted slide.
        slide: Slide,
    },
    /// The slide at `index` was removed.
    RemoveSlide {
        /// Former position of the slide.
        index: usize,
        /// The removed slide.
        slide: Slide,
    },
    /// A slide moved from `from` to `to`.
    MoveSlide {
        /// Original position.
        from: usize,
        /// New position.
        to: usize,
    },
    /// An element was inserted into a slide.
    InsertElement {
        /// Owning slide.
        slide: SlideId,
        /// Paint-order position.
        index: usize,
        /// The inserted element.
        element: Element,
    },
    /// An element was removed from a slide.
    RemoveElement {
        /// Owning slide.
        slide: SlideId,
        /// Former paint-order position.
        index: usize,
        /// The removed element.
        element: Element,
    },
    /// An element changed in place.
    ReplaceElement {
        /// Owning slide.
        slide: SlideId,
        /// Element before the change.
        before: Element,
        /// Element after the change.
        after: Element,
    },
    /// An element moved within its slide's paint order.
    MoveElement {
        /// Owning slide.
        slide: SlideId,
        /// Moved element.
        element: ElementId,
        /// Original position.
        from: usize,
        /// New position.
        to: usize,
    },
    /// A slide background changed.
    SetBackground {
        /// Affected slide.
        slide: SlideId,
        /// Previous color.
        before: String,
        /// New color.
        after: String,
    },
}

impl Command {
    /// The command that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        match self {
            Self::InsertSlide { index, slide } => Self::RemoveSlide {
                index: *index,
                slide: slide.clone(),
            },
            Self::RemoveSlide { index, slide } => Self::InsertSlide {
                index: *index,
                slide: slide.clone(),
            },
            Self::MoveSlide { from, to } => Self::MoveSlide {
                from: *to,
                to: *from,
            },
            Self::InsertElement {
                slide,
                index,
                element,
            } => Self::RemoveElement {
                slide: *slide,
                index: *index,
                element: element.clone(),
            },
            Self::RemoveElement {
                slide,
                index,
                element,
            } => Self::InsertElement {
                slide: *slide,
                index: *index,
                element: element.clone(),
            },
            Self::ReplaceElement {
                slide,
                before,
                after,
            } => Self::ReplaceElement {
                slide: *slide,
                before: after.clone(),
                after: before.clone(),
            },
            Self::MoveElement {
                slide,
                element,
                from,
                to,
            } => Self::MoveElement {
                slide: *slide,
                element: *element,
                from: *to,
                to: *from,
            },
            Self::SetBackground {
                slide,
                before,
                after,
            } => Self::SetBackground {
                slide: *slide,
                before: after.clone(),
                after: before.clone(),
            },
        }
    }

    /// Apply the command to a deck.
    ///
    /// # Errors
    ///
    /// Propagates the deck's guard errors, and returns
    /// [`CanvasError::InvalidDocument`] when the command's target no longer
    /// exists.
    pub fn apply(&self, deck: &mut SlideDeck) -> CanvasResult<()> {
        match self {
            Self::InsertSlide { index, slide } => {
                deck.insert_slide(*index, slide.clone())?;
            }
            Self::RemoveSlide { slide, .. } => {
                let index = deck
                    .index_of(slide.id())
                    .ok_or_else(|| missing("slide", slide.id()))?;
                deck.delete_slide(index)?;
            }
            Self::MoveSlide { from, to } => {
                deck.reorder_slide(*from, *to);
            }
            Self::InsertElement {
                slide,
                index,
                element,
            } => {
                target(deck, *slide)?.insert_element(*index, element.clone());
            }
            Self::RemoveElement { slide, element, .. } => {
                target(deck, *slide)?
                    .remove_element(element.id)
                    .ok_or_else(|| missing("element", element.id))?;
            }
            Self::ReplaceElement { slide, after, .. } => {
                target(deck, *slide)?
                    .replace_element(after.clone())
                    .ok_or_else(|| missing("element", after.id))?;
            }
            Self::MoveElement {
                slide, element, to, ..
            } => {
                target(deck, *slide)?.move_element(*element, *to);
            }
            Self::SetBackground { slide, after, .. } => {
                target(deck, *slide)?.background_color.clone_from(after);
            }
        }
        Ok(())
    }

    /// Slide the command operates on, if it targets a single slide.
    #[must_use]
    pub fn slide(&self) -> Option<SlideId> {
        match self {
            Self::InsertSlide { slide, .. } | Self::RemoveSlide { slide, .. } => Some(slide.id()),
            Self::MoveSlide { .. } => None,
            Self::InsertElement { slide, .. }
            | Self::RemoveElement { slide, .. }
            | Self::ReplaceElement { slide, .. }
            | Self::MoveElement { slide, .. }
            | Self::SetBackground { slide, .. } => Some(*slide),
        }
    }
}

fn target(deck: &mut SlideDeck, id: SlideId) -> CanvasResult<&mut Slide> {
    deck.slide_by_id_mut(id).ok_or_else(|| missing("slide", id))
}

fn missing(what: &str, id: impl std::fmt::Display) -> CanvasError {
    CanvasError::InvalidDocument(format!("{what} {id} is no longer in the deck"))
}

/// Bounded undo/redo stacks.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    /// Create an empty history with the default depth.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty history keeping at most `limit` commands.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Record an already-applied command. Clears the redo stack.
    pub fn record(&mut self, command: Command) {
        self.undo_stack.push(command);
        self.redo_stack.clear();
        if self.undo_stack.len() > self.limit {
            let overflow = self.undo_stack.len() - self.limit;
            self.undo_stack.drain(..overflow);
        }
    }

    /// Undo the most recent command.
    ///
    /// Returns `Ok(false)` when there is nothing to undo. A command that can
    /// no longer be applied is dropped.
    ///
    /// # Errors
    ///
    /// Returns the error raised while applying the inverse command.
    pub fn undo(&mut self, deck: &mut SlideDeck) -> CanvasResult<bool> {
        let Some(command) = self.undo_stack.pop() else {
            return Ok(false);
        };
        command.inverse().apply(deck)?;
        tracing::debug!("Undid {command:?}");
        self.redo_stack.push(command);
        Ok(true)
    }

    /// Re-apply the most recently undone command.
    ///
    /// # Errors
    ///
    /// Returns the error raised while applying the command.
    pub fn redo(&mut self, deck: &mut SlideDeck) -> CanvasResult<bool> {
        let Some(command) = self.redo_stack.pop() else {
            return Ok(false);
        };
        command.apply(deck)?;
        self.undo_stack.push(command);
        Ok(true)
    }

    /// Returns true if there are commands that can be undone.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there are commands that can be redone.
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of undoable commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.undo_stack.len()
    }

    /// Check if there is nothing to undo.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.undo_stack.is_empty()
    }

    /// Clear the command history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
