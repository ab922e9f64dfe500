//! JSON rendering for extracted outlines.

use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::OutlineDocument;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize any value in the requested format.
pub fn to_json_value<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Convert an outline to JSON.
///
/// Non-ASCII text is written as UTF-8, not escaped.
pub fn to_json(doc: &OutlineDocument, format: JsonFormat) -> Result<String> {
    to_json_value(doc, format)
}

/// Write an outline as JSON to a file.
pub fn write_json<P: AsRef<Path>>(doc: &OutlineDocument, path: P, format: JsonFormat) -> Result<()> {
    let mut json = to_json(doc, format)?;
    json.push('\n');
    std::fs::write(path, json)?;
    Ok(())
}
