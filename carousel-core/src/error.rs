//! Error types for carousel editing operations.

use thiserror::Error;

use crate::deck::MAX_SLIDES;

/// Result type for carousel operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur while building or editing a carousel.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Malformed element creation input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Adding or duplicating a slide would exceed the slide limit.
    #[error("Slide limit exceeded: a carousel holds at most {MAX_SLIDES} slides")]
    SlideLimitExceeded,

    /// Deleting a slide would leave the carousel empty.
    #[error("A carousel must keep at least one slide")]
    MinimumSlideCount,

    /// A loaded document violates a deck invariant.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Deck serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CanvasError {
    /// Shorthand for a validation error.
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
