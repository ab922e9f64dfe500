//! Page-level input types: positioned text runs as delivered by a PDF backend.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in top-down page coordinates.
///
/// `y0` is the top edge and `y1` the bottom edge, so larger `y` values are
/// further down the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    /// Left edge
    pub x0: f32,
    /// Top edge
    pub y0: f32,
    /// Right edge
    pub x1: f32,
    /// Bottom edge
    pub y1: f32,
}

impl BBox {
    /// Create a new bounding box.
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Whether all four coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x0.is_finite() && self.y0.is_finite() && self.x1.is_finite() && self.y1.is_finite()
    }

    /// Return a copy with swapped edges fixed up so that `x0 <= x1` and `y0 <= y1`.
    pub fn normalized(&self) -> Self {
        Self {
            x0: self.x0.min(self.x1),
            y0: self.y0.min(self.y1),
            x1: self.x0.max(self.x1),
            y1: self.y0.max(self.y1),
        }
    }

    /// Box width.
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    /// Box height.
    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Vertical center.
    pub fn center_y(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BBox) -> Self {
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Length of the vertical overlap between two boxes (0 when disjoint).
    pub fn vertical_overlap(&self, other: &BBox) -> f32 {
        (self.y1.min(other.y1) - self.y0.max(other.y0)).max(0.0)
    }
}

/// A raw text run with geometry and font metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRun {
    /// The decoded text
    pub text: String,
    /// Run geometry
    pub bbox: BBox,
    /// Effective font size in points
    pub font_size: f32,
    /// Base font name (e.g., "Helvetica-Bold")
    pub font_name: String,
    /// Rendered with fill+stroke, which visually emboldens regular fonts
    pub synthetic_bold: bool,
}

impl RawRun {
    /// Create a new run.
    pub fn new(text: impl Into<String>, bbox: BBox, font_size: f32, font_name: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bbox,
            font_size,
            font_name: font_name.into(),
            synthetic_bold: false,
        }
    }

    /// Mark the run as synthetically emboldened.
    pub fn with_synthetic_bold(mut self, bold: bool) -> Self {
        self.synthetic_bold = bold;
        self
    }

    /// Whether the run appears bold, from its font name or render mode.
    pub fn is_bold(&self) -> bool {
        self.synthetic_bold || font_name_is_bold(&self.font_name)
    }

    /// Font family with subset prefix and style suffix removed.
    ///
    /// `"ABCDEF+Arial-BoldMT"` becomes `"arial"`.
    pub fn font_family(&self) -> String {
        let name = match self.font_name.split_once('+') {
            Some((prefix, rest)) if prefix.len() == 6 => rest,
            _ => self.font_name.as_str(),
        };
        let family = name.split([',', '-']).next().unwrap_or(name);
        family
            .trim_end_matches("MT")
            .trim_end_matches("PS")
            .to_lowercase()
    }
}

/// Check whether a font name indicates a heavy weight.
pub fn font_name_is_bold(font_name: &str) -> bool {
    let lower = font_name.to_lowercase();
    ["bold", "black", "heavy", "semibold", "demi", "extrab"]
        .iter()
        .any(|w| lower.contains(w))
}

/// The runs of a single page, in content-stream order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageRuns {
    /// Page index (0-based)
    pub index: usize,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Text runs
    pub runs: Vec<RawRun>,
}

impl PageRuns {
    /// Create an empty page.
    pub fn new(index: usize, width: f32, height: f32) -> Self {
        Self {
            index,
            width,
            height,
            runs: Vec::new(),
        }
    }

    /// Create a page with standard Letter size.
    pub fn letter(index: usize) -> Self {
        Self::new(index, 612.0, 792.0)
    }

    /// Add a run.
    pub fn push(&mut self, run: RawRun) {
        self.runs.push(run);
    }

    /// Check if the page has no runs.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_normalized() {
        let inverted = BBox::new(100.0, 50.0, 20.0, 10.0);
        let fixed = inverted.normalized();
        assert_eq!(fixed, BBox::new(20.0, 10.0, 100.0, 50.0));
        assert!((fixed.width() - 80.0).abs() < f32::EPSILON);
        assert!((fixed.height() - 40.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bbox_vertical_overlap() {
        let a = BBox::new(0.0, 10.0, 50.0, 22.0);
        let b = BBox::new(60.0, 12.0, 90.0, 24.0);
        let c = BBox::new(0.0, 30.0, 50.0, 42.0);
        assert!((a.vertical_overlap(&b) - 10.0).abs() < 1e-4);
        assert_eq!(a.vertical_overlap(&c), 0.0);
    }

    #[test]
    fn test_bold_detection() {
        let run = RawRun::new("Title", BBox::new(0.0, 0.0, 10.0, 10.0), 12.0, "Helvetica-Bold");
        assert!(run.is_bold());

        let run = RawRun::new("Body", BBox::new(0.0, 0.0, 10.0, 10.0), 12.0, "Helvetica-Oblique");
        assert!(!run.is_bold());
        assert!(run.clone().with_synthetic_bold(true).is_bold());
    }

    #[test]
    fn test_font_family() {
        let run = RawRun::new("x", BBox::new(0.0, 0.0, 1.0, 1.0), 10.0, "ABCDEF+Arial-BoldMT");
        assert_eq!(run.font_family(), "arial");

        let run = RawRun::new("x", BBox::new(0.0, 0.0, 1.0, 1.0), 10.0, "TimesNewRomanPS,Bold");
        assert_eq!(run.font_family(), "timesnewroman");
    }
}
