//! Document-level types: classification tags, heading candidates and the outline.

use serde::{Deserialize, Serialize};

/// Structural category used to select a heading-assignment policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentTypeTag {
    /// No special structure detected
    #[default]
    Plain,
    /// Fill-in form with field labels
    Form,
    /// Flyer or event page with few large blocks
    Flyer,
    /// Manual or specification with numbered sections
    Technical,
    /// Request for proposal or similar administrative document
    Rfp,
    /// Multi-section document of repeated stage/step blocks
    Pathway,
}

impl DocumentTypeTag {
    /// Lowercase name of the tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentTypeTag::Plain => "plain",
            DocumentTypeTag::Form => "form",
            DocumentTypeTag::Flyer => "flyer",
            DocumentTypeTag::Technical => "technical",
            DocumentTypeTag::Rfp => "rfp",
            DocumentTypeTag::Pathway => "pathway",
        }
    }
}

impl std::fmt::Display for DocumentTypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outline heading level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
}

impl HeadingLevel {
    /// Map a zero-based depth (style rank or numbering depth) to a level.
    ///
    /// Anything deeper than the third level collapses into `H3`.
    pub fn from_depth(depth: usize) -> Self {
        match depth {
            0 => HeadingLevel::H1,
            1 => HeadingLevel::H2,
            _ => HeadingLevel::H3,
        }
    }
}

impl std::fmt::Display for HeadingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HeadingLevel::H1 => "H1",
            HeadingLevel::H2 => "H2",
            HeadingLevel::H3 => "H3",
        };
        f.write_str(s)
    }
}

/// Level assigned to a block by the heading assigner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignedLevel {
    /// Promoted to the document title
    Title,
    /// An outline heading
    Heading(HeadingLevel),
    /// Rejected: body text or noise
    None,
}

impl AssignedLevel {
    /// Whether the block survives into the assembler.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, AssignedLevel::None)
    }
}

/// A block reference with its assigned level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadingCandidate {
    /// Index into the document's block list
    pub block: usize,
    /// Assigned level
    pub level: AssignedLevel,
    /// Confidence rank (0 is strongest)
    pub rank: usize,
}

impl HeadingCandidate {
    /// Create a new candidate.
    pub fn new(block: usize, level: AssignedLevel, rank: usize) -> Self {
        Self { block, level, rank }
    }

    /// Create a rejected candidate.
    pub fn rejected(block: usize) -> Self {
        Self {
            block,
            level: AssignedLevel::None,
            rank: usize::MAX,
        }
    }
}

/// A single heading in the emitted outline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Heading level
    pub level: HeadingLevel,
    /// Heading text
    pub text: String,
    /// Page index (0-based)
    pub page: usize,
}

impl OutlineEntry {
    /// Create a new entry.
    pub fn new(level: HeadingLevel, text: impl Into<String>, page: usize) -> Self {
        Self {
            level,
            text: text.into(),
            page,
        }
    }
}

/// Title plus ordered outline for one input PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineDocument {
    /// Document title (possibly empty)
    pub title: String,
    /// Ordered headings, excluding the title
    pub outline: Vec<OutlineEntry>,
}

impl OutlineDocument {
    /// An outline with no title and no headings.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check whether neither a title nor any heading was found.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.outline.is_empty()
    }
}
