//! # Carousel Core
//!
//! Editing model for multi-slide carousel documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                   Editor                    │
//! ├─────────────────────────────────────────────┤
//! │  SlideDeck       │  SelectionEngine         │
//! │  - 1..=10 slides │  - Select / drag         │
//! │  - Current slide │  - Resize / rotate       │
//! │  - Reorder       │  - Text edit             │
//! ├─────────────────────────────────────────────┤
//! │  Element model   │  History                 │
//! │  - Text / shape  │  - Invertible commands   │
//! │  - Image         │  - Undo / redo           │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod deck;
pub mod document;
pub mod editor;
pub mod element;
pub mod error;
pub mod history;
pub mod selection;
pub mod slide;
pub mod text;

pub use deck::{CanvasSize, DeckSnapshot, SlideDeck, MAX_SLIDES, MIN_SLIDES};
pub use document::{DeckDocument, DOCUMENT_VERSION};
pub use editor::{Editor, Notice};
pub use element::{
    Element, ElementId, ElementKind, ElementPatch, FontStyle, FontWeight, ImagePatch, ImageSource,
    ShapeConfig, ShapeStyle, ShapeStylePatch, ShapeType, StylePatch, TextAlign, TextElementInit,
    TextStyle, TextStylePatch, Transform, MIN_HEIGHT, MIN_WIDTH,
};
pub use error::{CanvasError, CanvasResult};
pub use history::{Command, History};
pub use selection::{ElementChange, InteractionState, SelectionEngine, TransformUpdate};
pub use slide::{Slide, SlideId};
pub use text::{wrap_text, TextMetrics};

/// Carousel core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
