//! Rendering backend implementations.

pub mod svg;

use crate::{RenderResult, VisualTree};

/// Available rendering backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// SVG document output.
    Svg,
}

/// Trait for rendering backends that paint a [`VisualTree`].
pub trait RenderBackend {
    /// What a painted tree produces.
    type Output;

    /// Get the backend type.
    fn backend_type(&self) -> BackendType;

    /// Paint a visual tree.
    ///
    /// # Errors
    ///
    /// Returns an error if painting fails.
    fn render(&mut self, tree: &VisualTree) -> RenderResult<Self::Output>;

    /// Resize the output surface, in pixels.
    fn resize(&mut self, width: u32, height: u32);
}
