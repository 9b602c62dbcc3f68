//! Text layer payload.
//!
//! Layout and shaping are delegated to the rendering capability; the model
//! only carries the content and font selection, and estimates extents with
//! a fixed average-advance heuristic so grouping and packing have usable
//! bounds without a font lookup.

use serde::{Deserialize, Serialize};

/// Average glyph advance as a fraction of the font size, used for bounds
/// estimation when no font metrics are available.
const AVG_ADVANCE_RATIO: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLayer {
    pub content: String,
    pub font_size: f64,
    #[serde(default = "default_family")]
    pub font_family: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

fn default_family() -> String {
    "Sans".to_string()
}

impl TextLayer {
    pub fn new(content: impl Into<String>, font_size: f64) -> Self {
        Self {
            content: content.into(),
            font_size,
            font_family: default_family(),
            bold: false,
            italic: false,
        }
    }

    /// Estimated extent of the longest line times the line count.
    pub fn intrinsic_size(&self) -> (f64, f64) {
        let lines: Vec<&str> = self.content.lines().collect();
        let line_count = lines.len().max(1);
        let longest = lines
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);
        (
            longest as f64 * self.font_size * AVG_ADVANCE_RATIO,
            line_count as f64 * self.font_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intrinsic_size_scales_with_content() {
        let short = TextLayer::new("Hi", 10.0);
        let long = TextLayer::new("Hello world", 10.0);
        assert!(long.intrinsic_size().0 > short.intrinsic_size().0);
        assert_eq!(short.intrinsic_size().1, 10.0);
    }

    #[test]
    fn test_multiline_height() {
        let t = TextLayer::new("a\nbb\nccc", 12.0);
        assert_eq!(t.intrinsic_size().1, 36.0);
    }
}
