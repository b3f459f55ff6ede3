//! Canonical serialized representation of a carousel deck.
//!
//! This is the plain form handed to persistence: no runtime-only state,
//! no references between slides. Loading re-checks every deck invariant.

use serde::{Deserialize, Serialize};

use crate::{CanvasError, CanvasResult, CanvasSize, Slide, SlideDeck};

/// Current document format version.
pub const DOCUMENT_VERSION: u32 = 1;

const fn default_version() -> u32 {
    DOCUMENT_VERSION
}

/// Canonical deck document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckDocument {
    /// Format version.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Canvas size shared by every slide.
    #[serde(default)]
    pub canvas: CanvasSize,
    /// Index of the slide that was current when saved.
    #[serde(default)]
    pub current_slide: usize,
    /// Slides in order.
    pub slides: Vec<Slide>,
}

impl DeckDocument {
    /// Build a document from a runtime deck.
    #[must_use]
    pub fn from_deck(deck: &SlideDeck) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            canvas: deck.canvas(),
            current_slide: deck.current_index(),
            slides: deck.slides().to_vec(),
        }
    }

    /// Materialize a runtime deck.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidDocument`] for an unsupported version or
    /// any violated deck invariant.
    pub fn into_deck(self) -> CanvasResult<SlideDeck> {
        if self.version > DOCUMENT_VERSION {
            return Err(CanvasError::InvalidDocument(format!(
                "document version {} is newer than supported version {DOCUMENT_VERSION}",
                self.version
            )));
        }
        SlideDeck::from_slides(self.canvas, self.slides, self.current_slide)
    }
}

impl SlideDeck {
    /// Serialize the deck to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CanvasResult<String> {
        serde_json::to_string_pretty(&DeckDocument::from_deck(self)).map_err(CanvasError::Serialization)
    }

    /// Deserialize and validate a deck from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or violates an invariant.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        let document: DeckDocument = serde_json::from_str(json)?;
        document.into_deck()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Element, ShapeConfig, ShapeType, TextElementInit};

    fn sample_deck() -> SlideDeck {
        let mut deck = SlideDeck::default();
        let slide = deck.current_slide_mut();
        slide.background_color = "#fef3c7".to_string();
        slide.add_element(Element::text(TextElementInit::new("Title").at(80.0, 120.0)).expect("text"));
        slide.add_element(Element::shape(ShapeConfig::new(ShapeType::Circle)).expect("circle"));
        deck.add_slide().expect("add");
        deck.current_slide_mut()
            .add_element(Element::image("data:image/png;base64,AAAA", 320.0, 200.0).expect("image"));
        deck
    }

    #[test]
    fn test_json_round_trip_preserves_deck() {
        let deck = sample_deck();
        let json = deck.to_json().expect("serialize");
        let restored = SlideDeck::from_json(&json).expect("deserialize");
        assert_eq!(restored, deck);
    }

    #[test]
    fn test_rejects_empty_slide_list() {
        let json = r#"{"version":1,"slides":[]}"#;
        assert!(matches!(
            SlideDeck::from_json(json),
            Err(CanvasError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_rejects_future_version() {
        let mut document = DeckDocument::from_deck(&sample_deck());
        document.version = DOCUMENT_VERSION + 1;
        assert!(document.into_deck().is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            SlideDeck::from_json("{not json"),
            Err(CanvasError::Serialization(_))
        ));
    }

    #[test]
    fn test_missing_scale_defaults_to_unit() {
        let id = uuid::Uuid::new_v4();
        let json = format!(
            r##"{{"slides":[{{"id":"{slide}","background_color":"#fff","elements":[
                {{"id":"{id}","kind":{{"type":"shape","data":{{"shape_type":"rect","fill":"#000"}}}},
                  "transform":{{"x":0,"y":0,"width":60,"height":30}}}}]}}]}}"##,
            slide = uuid::Uuid::new_v4(),
        );
        let deck = SlideDeck::from_json(&json).expect("valid document");
        let element = &deck.slides()[0].elements()[0];
        assert!((element.transform.scale_x - 1.0).abs() < f32::EPSILON);
        assert!((element.opacity - 1.0).abs() < f32::EPSILON);
    }
}
