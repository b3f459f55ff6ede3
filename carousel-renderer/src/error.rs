//! Renderer error types.

use carousel_core::ElementId;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur during rendering and export.
#[derive(Debug, Error)]
pub enum RenderError {
    /// An image referenced by a slide could not be loaded.
    ///
    /// `slide_index` is zero-based; the message names the slide by its
    /// one-based position.
    #[error("Failed to load image '{src}' on slide {} (element {element_id}): {reason}", .slide_index + 1)]
    AssetLoad {
        /// Zero-based index of the first slide referencing the image.
        slide_index: usize,
        /// Element that references the image.
        element_id: ElementId,
        /// The image source as written in the document.
        src: String,
        /// Why loading failed.
        reason: String,
    },

    /// Resource loading or decoding failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Encoding an export format failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// The export was superseded or aborted before it finished.
    #[error("Export cancelled")]
    Cancelled,

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
