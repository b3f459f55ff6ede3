//! Deterministic text measurement and word wrapping.
//!
//! The editor has no access to real font metrics, so glyph advances are
//! estimated from the Unicode display width of each character. The same
//! estimate is used when sizing new text elements and when the renderer
//! lays out lines, so both always agree on where lines break.

use unicode_width::UnicodeWidthChar;

use crate::element::{FontWeight, TextStyle};

/// Advance of a single-column glyph as a fraction of the font size.
const REGULAR_ADVANCE: f32 = 0.5625;

/// Advance of a single-column bold glyph as a fraction of the font size.
const BOLD_ADVANCE: f32 = 0.625;

/// Font parameters that influence horizontal measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    /// Font size in pixels.
    pub font_size: f32,
    /// Whether glyphs are bold.
    pub bold: bool,
    /// Extra spacing added after every visible glyph, in pixels.
    pub letter_spacing: f32,
}

impl TextMetrics {
    /// Metrics for a text style.
    #[must_use]
    pub fn from_style(style: &TextStyle) -> Self {
        Self {
            font_size: style.font_size,
            bold: style.font_weight == FontWeight::Bold,
            letter_spacing: style.letter_spacing,
        }
    }

    /// Estimated advance of one character.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn char_advance(&self, c: char) -> f32 {
        let columns = c.width().unwrap_or(0);
        if columns == 0 {
            return 0.0;
        }
        let factor = if self.bold { BOLD_ADVANCE } else { REGULAR_ADVANCE };
        columns as f32 * self.font_size * factor + self.letter_spacing
    }

    /// Estimated width of a single unwrapped line.
    #[must_use]
    pub fn line_width(&self, line: &str) -> f32 {
        line.chars().map(|c| self.char_advance(c)).sum()
    }
}

/// Wrap `text` into lines no wider than `max_width`.
///
/// Explicit newlines always break. Words are packed greedily; a word wider
/// than `max_width` on its own is broken between characters. The result
/// always holds at least one (possibly empty) line.
#[must_use]
pub fn wrap_text(text: &str, max_width: f32, metrics: &TextMetrics) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.trim_end_matches('\r');
        if paragraph.trim().is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };

            if metrics.line_width(&candidate) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if metrics.line_width(word) <= max_width {
                current = word.to_string();
            } else {
                current = break_word(word, max_width, metrics, &mut lines);
            }
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Split an over-long word, pushing full chunks and returning the remainder.
fn break_word(word: &str, max_width: f32, metrics: &TextMetrics, lines: &mut Vec<String>) -> String {
    let mut chunk = String::new();
    let mut width = 0.0;
    for c in word.chars() {
        let advance = metrics.char_advance(c);
        if width + advance > max_width && !chunk.is_empty() {
            lines.push(std::mem::take(&mut chunk));
            width = 0.0;
        }
        chunk.push(c);
        width += advance;
    }
    chunk
}

/// Estimated bounding box `(width, height)` of unwrapped text.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn estimate_text_box(text: &str, metrics: &TextMetrics, line_height: f32) -> (f32, f32) {
    let mut widest = 0.0_f32;
    let mut count = 0_usize;
    for line in text.split('\n') {
        widest = widest.max(metrics.line_width(line.trim_end_matches('\r')));
        count += 1;
    }
    let height = count.max(1) as f32 * metrics.font_size * line_height;
    (widest.ceil(), height.ceil())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> TextMetrics {
        TextMetrics {
            font_size: 20.0,
            bold: false,
            letter_spacing: 0.0,
        }
    }

    #[test]
    fn test_line_width_scales_with_font_size() {
        let small = metrics();
        let large = TextMetrics {
            font_size: 40.0,
            ..small
        };
        assert!((large.line_width("abc") - small.line_width("abc") * 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_bold_is_wider() {
        let bold = TextMetrics {
            bold: true,
            ..metrics()
        };
        assert!(bold.line_width("hello") > metrics().line_width("hello"));
    }

    #[test]
    fn test_wrap_respects_newlines() {
        let lines = wrap_text("one\ntwo", 1000.0, &metrics());
        assert_eq!(lines, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_wrap_packs_words_greedily() {
        // Each glyph is 11.25px wide, so 60px fits five characters.
        let lines = wrap_text("ab cd ef", 60.0, &metrics());
        assert_eq!(lines, vec!["ab cd".to_string(), "ef".to_string()]);
    }

    #[test]
    fn test_wrap_breaks_long_word() {
        let lines = wrap_text("abcdefghij", 34.0, &metrics());
        assert_eq!(lines, vec!["abc", "def", "ghi", "j"]);
    }

    #[test]
    fn test_wrap_empty_text_yields_one_line() {
        assert_eq!(wrap_text("", 100.0, &metrics()), vec![String::new()]);
    }

    #[test]
    fn test_estimate_box_counts_lines() {
        let (w, h) = estimate_text_box("abcd\nab", &metrics(), 1.5);
        assert!((w - 45.0).abs() < f32::EPSILON);
        assert!((h - 60.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_wide_glyphs_take_two_columns() {
        let m = metrics();
        assert!((m.char_advance('漢') - m.char_advance('a') * 2.0).abs() < 1e-4);
    }
}
