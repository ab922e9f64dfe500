//! Data model shared by the parser and the heading inference engine.
//!
//! Raw runs come in from a PDF backend, merged blocks flow through the
//! engine, and an [`OutlineDocument`] comes out.

mod block;
mod document;
mod page;

pub use block::{StyleSignature, TextBlock};
pub use document::{
    AssignedLevel, DocumentTypeTag, HeadingCandidate, HeadingLevel, OutlineDocument, OutlineEntry,
};
pub use page::{font_name_is_bold, BBox, PageRuns, RawRun};
