//! Heuristic thresholds for the heading inference engine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Every tunable constant used by the engine.
///
/// Any subset can be overridden from JSON; missing keys keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Two runs sit on the same line when their baselines differ by at most
    /// this fraction of the font size.
    pub line_tolerance_ratio: f32,
    /// Largest horizontal gap, in units of font size, bridged when merging runs.
    pub max_gap_ratio: f32,
    /// Largest font size difference (points) between runs merged into one block.
    pub size_tolerance: f32,

    /// Blocks shorter than this many characters do not feed style statistics.
    pub short_text_cutoff: usize,
    /// Below this many non-trivial blocks, styles are ranked by size alone.
    pub sparse_block_minimum: usize,
    /// Signatures whose mean block length exceeds this are paragraph styles.
    pub candidate_mean_chars: f32,

    /// Longest text accepted as a heading.
    pub max_heading_chars: usize,
    /// Fraction of pages a text must repeat on to count as a running header/footer.
    pub running_artifact_page_ratio: f32,
    /// Candidates with a larger share of stop-words are treated as prose.
    pub max_stop_word_ratio: f32,

    /// Minimum share of short (five words or fewer) blocks for a form.
    pub form_short_block_ratio: f32,
    /// Minimum share of field-like blocks for a form.
    pub form_field_ratio: f32,
    /// Maximum share of sentence blocks for a form.
    pub form_sentence_ratio: f32,
    /// Forms need at least this many blocks.
    pub form_min_blocks: usize,
    /// A form heading must span at least this fraction of the page text width.
    pub form_min_width_ratio: f32,

    /// Flyers have at most this many pages.
    pub flyer_max_pages: usize,
    /// Minimum share of blocks at candidate-heading styles for a flyer.
    pub flyer_candidate_ratio: f32,
    /// Flyers have at most this many body-text blocks.
    pub flyer_max_body_blocks: usize,

    /// Minimum numbered candidate blocks for a technical document.
    pub numbered_min_blocks: usize,
    /// Numbered blocks must recur across at least this many pages.
    pub numbered_min_pages: usize,
    /// Share of numbered blocks that must use the dominant numbered style.
    pub numbered_style_share: f32,
    /// Distinct administrative keywords needed for an RFP.
    pub rfp_min_keywords: usize,

    /// Blocks sharing a stage prefix must repeat at least this often.
    pub pathway_min_repeats: usize,
    /// Stage blocks must appear on at least this many pages.
    pub pathway_min_pages: usize,

    /// Number of leading blocks sampled for language detection.
    pub language_sample_blocks: usize,
    /// Sample is topped up with body text until it reaches this many characters.
    pub language_sample_chars: usize,

    /// Wrapped heading lines are joined when the vertical gap is at most
    /// this fraction of the font size.
    pub continuation_gap_ratio: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            line_tolerance_ratio: 0.3,
            max_gap_ratio: 1.5,
            size_tolerance: 1.0,
            short_text_cutoff: 2,
            sparse_block_minimum: 12,
            candidate_mean_chars: 110.0,
            max_heading_chars: 160,
            running_artifact_page_ratio: 0.5,
            max_stop_word_ratio: 0.6,
            form_short_block_ratio: 0.6,
            form_field_ratio: 0.3,
            form_sentence_ratio: 0.15,
            form_min_blocks: 6,
            form_min_width_ratio: 0.45,
            flyer_max_pages: 2,
            flyer_candidate_ratio: 0.15,
            flyer_max_body_blocks: 15,
            numbered_min_blocks: 3,
            numbered_min_pages: 2,
            numbered_style_share: 0.5,
            rfp_min_keywords: 2,
            pathway_min_repeats: 3,
            pathway_min_pages: 2,
            language_sample_blocks: 20,
            language_sample_chars: 400,
            continuation_gap_ratio: 0.8,
        }
    }
}

impl Thresholds {
    /// Load thresholds from a JSON file, falling back to defaults for missing keys.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let thresholds: Self = serde_json::from_str(&data)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Reject values that would make the heuristics meaningless.
    pub fn validate(&self) -> Result<()> {
        let ratios = [
            ("running_artifact_page_ratio", self.running_artifact_page_ratio),
            ("max_stop_word_ratio", self.max_stop_word_ratio),
            ("form_short_block_ratio", self.form_short_block_ratio),
            ("form_field_ratio", self.form_field_ratio),
            ("form_sentence_ratio", self.form_sentence_ratio),
            ("form_min_width_ratio", self.form_min_width_ratio),
            ("flyer_candidate_ratio", self.flyer_candidate_ratio),
            ("numbered_style_share", self.numbered_style_share),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("{} must be within 0..=1, got {}", name, value)));
            }
        }

        if self.max_heading_chars == 0 {
            return Err(Error::Config("max_heading_chars must be positive".into()));
        }
        if self.line_tolerance_ratio <= 0.0 || self.max_gap_ratio <= 0.0 {
            return Err(Error::Config("merge tolerances must be positive".into()));
        }
        if self.size_tolerance < 0.0 || self.continuation_gap_ratio < 0.0 {
            return Err(Error::Config("tolerances must not be negative".into()));
        }

        Ok(())
    }
}
