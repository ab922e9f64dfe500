//! Plain text rendering of an outline as an indented tree.

use crate::model::{HeadingLevel, OutlineDocument};

/// Render the outline as indented lines, one heading per line.
pub fn to_text(doc: &OutlineDocument) -> String {
    let mut output = String::new();
    if !doc.title.is_empty() {
        output.push_str(&doc.title);
        output.push('\n');
    }

    for entry in &doc.outline {
        let indent = match entry.level {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
        };
        output.push_str(&"  ".repeat(indent));
        output.push_str(&format!("{} {} (page {})\n", entry.level, entry.text, entry.page));
    }

    output
}
