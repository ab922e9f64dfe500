//! Language-agnostic text patterns shared by the classifier and the assigner.

use regex::Regex;

/// Compiled structural patterns.
#[derive(Debug, Clone)]
pub struct StructuralPatterns {
    field_label: Regex,
    noise: Regex,
    sentence_break: Regex,
    sentence_end: Regex,
}

impl StructuralPatterns {
    pub fn new() -> Self {
        Self {
            // Colon endings, fill-in leaders, checkboxes, bare serial numbers
            field_label: Regex::new(
                r"(?x)
                [:：]\s*_*\s*$
                | _{3,}
                | \.{4,}
                | …{2,}
                | [☐☑☒□■▢◻✓✔]
                | \[\s?[xX✓]?\s?\]
                | ^\(\s?\)
                | ^\d{1,3}[.)]?$
                ",
            )
            .unwrap(),
            noise: Regex::new(
                r"(?ix)^(?:
                    page\s*\d+(?:\s*(?:of|/)\s*\d+)?
                    | \d+\s*(?:of|/)\s*\d+
                    | [\d\s.,:;/()\-–—]+
                    | [^\p{L}\p{N}]+
                    | (?:https?://|www\.)\S+
                    | \S+@\S+\.\S+
                    | (?:©|\(c\)|copyright\b).*
                )$",
            )
            .unwrap(),
            sentence_break: Regex::new(r"\p{L}{2,}[.!?]\s+\p{Lu}").unwrap(),
            sentence_end: Regex::new(r"[.!?。！？]$").unwrap(),
        }
    }

    /// Form field label: "Name:", "Date ______", "[ ] Yes".
    pub fn is_field_label(&self, text: &str) -> bool {
        self.field_label.is_match(text.trim())
    }

    /// Page labels, bare numbers, punctuation, URLs, e-mail addresses, copyright lines.
    pub fn is_noise(&self, text: &str) -> bool {
        self.noise.is_match(text.trim())
    }

    /// A full sentence: several words ending in terminal punctuation.
    pub fn is_sentence(&self, text: &str) -> bool {
        let text = text.trim();
        text.split_whitespace().count() >= 6 && self.sentence_end.is_match(text)
    }

    /// More than one sentence in a single block.
    pub fn is_multi_sentence(&self, text: &str) -> bool {
        self.sentence_break.is_match(text)
    }
}

impl Default for StructuralPatterns {
    fn default() -> Self {
        Self::new()
    }
}
