//! Merged text blocks and their style signatures.

use super::BBox;
use serde::{Deserialize, Serialize};

/// A merged, position- and style-tagged unit of text on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Page index (0-based)
    pub page: usize,
    /// Merged geometry (top-down coordinates)
    pub bbox: BBox,
    /// Concatenated, normalized text
    pub text: String,
    /// Run-weighted dominant font size
    pub font_size: f32,
    /// Whether the block is predominantly bold
    pub is_bold: bool,
    /// Document-wide font family id
    pub font_family: usize,
}

impl TextBlock {
    /// The style signature of this block.
    pub fn signature(&self) -> StyleSignature {
        StyleSignature::new(self.font_size, self.is_bold)
    }

    /// Number of characters in the text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Number of whitespace-separated words.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// A (font size, boldness) pair used to rank heading candidacy.
///
/// Sizes are bucketed to half points so that rounding noise from text
/// matrices does not split one visual style into several signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StyleSignature {
    /// Font size in half points
    pub half_points: i32,
    /// Boldness flag
    pub bold: bool,
}

impl StyleSignature {
    /// Build a signature from a raw font size.
    pub fn new(font_size: f32, bold: bool) -> Self {
        Self {
            half_points: (font_size * 2.0).round() as i32,
            bold,
        }
    }

    /// Font size in points.
    pub fn size(&self) -> f32 {
        self.half_points as f32 / 2.0
    }

    /// Whether this signature is visually more prominent than `other`.
    ///
    /// Larger wins; at equal size bold beats regular.
    pub fn is_more_prominent_than(&self, other: &StyleSignature) -> bool {
        self.half_points > other.half_points
            || (self.half_points == other.half_points && self.bold && !other.bold)
    }
}

impl std::fmt::Display for StyleSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.bold {
            write!(f, "{:.1}pt bold", self.size())
        } else {
            write!(f, "{:.1}pt", self.size())
        }
    }
}
