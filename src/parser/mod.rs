//! PDF reading: turns a PDF file into per-page positioned text runs.

mod backend;
mod content;
mod options;

pub use backend::{decode_text_simple, has_pdf_header, read_pages, LopdfBackend, PdfBackend};
pub use content::is_spaceless_script_char;
pub use options::{ErrorMode, ExtractOptions};

use std::path::Path;

use crate::error::Result;
use crate::model::PageRuns;

/// Read the text runs of every selected page of a PDF file.
pub fn load_file<P: AsRef<Path>>(path: P, options: &ExtractOptions) -> Result<Vec<PageRuns>> {
    let backend = LopdfBackend::load_file(path)?;
    read_pages(&backend, options)
}

/// Read the text runs of every selected page of an in-memory PDF.
pub fn load_bytes(data: &[u8], options: &ExtractOptions) -> Result<Vec<PageRuns>> {
    let backend = LopdfBackend::load_bytes(data)?;
    read_pages(&backend, options)
}
