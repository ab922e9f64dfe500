//! # pdfoutline
//!
//! Offline extraction of a document title and an H1/H2/H3 outline from PDF files.
//!
//! Headings are inferred from layout alone: text runs are merged into blocks,
//! a document-wide style profile separates body text from heading styles, a
//! structural classifier picks a policy (form, flyer, technical, RFP, pathway
//! or plain), and per-language lexical rules refine the result.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfoutline::{extract_file, render, JsonFormat};
//!
//! fn main() -> pdfoutline::Result<()> {
//!     let outline = extract_file("document.pdf")?;
//!     println!("{}", render::to_json(&outline, JsonFormat::Pretty)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Batch processing
//!
//! ```no_run
//! use pdfoutline::{batch, ExtractOptions};
//!
//! let report = batch::process_directory("input", "output", &ExtractOptions::default(), |_| {})?;
//! println!("{} written, {} skipped", report.succeeded.len(), report.failed.len());
//! # Ok::<(), pdfoutline::Error>(())
//! ```

pub mod batch;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use engine::{LanguageDetector, OutlineEngine, OutlineReport, RuleRegistry, Thresholds};
pub use error::{Error, Result};
pub use model::{
    BBox, DocumentTypeTag, HeadingLevel, OutlineDocument, OutlineEntry, PageRuns, RawRun,
    StyleSignature, TextBlock,
};
pub use parser::{ErrorMode, ExtractOptions};
pub use render::JsonFormat;

use std::path::Path;

/// Extract the title and outline of a PDF file with default options.
///
/// # Example
///
/// ```no_run
/// use pdfoutline::extract_file;
///
/// let outline = extract_file("document.pdf").unwrap();
/// println!("{}: {} headings", outline.title, outline.outline.len());
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P) -> Result<OutlineDocument> {
    OutlineExtractor::new().extract_file(path)
}

/// Extract the title and outline of a PDF file with custom options.
///
/// # Example
///
/// ```no_run
/// use pdfoutline::{extract_file_with_options, ExtractOptions};
///
/// let options = ExtractOptions::new().strict().with_max_pages(50);
/// let outline = extract_file_with_options("document.pdf", options).unwrap();
/// ```
pub fn extract_file_with_options<P: AsRef<Path>>(
    path: P,
    options: ExtractOptions,
) -> Result<OutlineDocument> {
    OutlineExtractor::with_options(options).extract_file(path)
}

/// Extract the title and outline of an in-memory PDF.
pub fn extract_bytes(data: &[u8]) -> Result<OutlineDocument> {
    OutlineExtractor::new().extract_bytes(data)
}

/// Run the heading engine on text runs from any source.
///
/// Useful when pages come from a different PDF library.
pub fn extract_from_pages(pages: &[PageRuns]) -> OutlineDocument {
    OutlineEngine::default().extract(pages)
}

/// Convert a PDF file straight to outline JSON.
///
/// # Example
///
/// ```no_run
/// use pdfoutline::{to_json, JsonFormat};
///
/// let json = to_json("document.pdf", JsonFormat::Pretty).unwrap();
/// std::fs::write("document.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let outline = extract_file(path)?;
    render::to_json(&outline, format)
}

/// Reusable extractor: reading options plus a configured engine.
///
/// One extractor can be shared across threads.
///
/// # Example
///
/// ```no_run
/// use pdfoutline::{OutlineExtractor, Thresholds};
///
/// let extractor = OutlineExtractor::new()
///     .lenient()
///     .with_thresholds(Thresholds { max_heading_chars: 120, ..Thresholds::default() });
/// let report = extractor.analyze_file("document.pdf")?;
/// println!("{} ({})", report.document_type, report.language);
/// # Ok::<(), pdfoutline::Error>(())
/// ```
#[derive(Debug)]
pub struct OutlineExtractor {
    options: ExtractOptions,
    engine: OutlineEngine,
}

impl OutlineExtractor {
    /// Create an extractor with default options.
    pub fn new() -> Self {
        Self::with_options(ExtractOptions::default())
    }

    /// Create an extractor from options.
    pub fn with_options(options: ExtractOptions) -> Self {
        let engine = OutlineEngine::new(options.thresholds.clone());
        Self { options, engine }
    }

    /// Skip unreadable pages.
    pub fn lenient(mut self) -> Self {
        self.options = self.options.lenient();
        self
    }

    /// Fail on the first unreadable page.
    pub fn strict(mut self) -> Self {
        self.options = self.options.strict();
        self
    }

    /// Limit the number of pages read.
    pub fn with_max_pages(mut self, pages: usize) -> Self {
        self.options = self.options.with_max_pages(pages);
        self
    }

    /// Replace the engine thresholds.
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.options = self.options.with_thresholds(thresholds.clone());
        self.engine = std::mem::take(&mut self.engine).with_thresholds(thresholds);
        self
    }

    /// Replace the language detector.
    pub fn with_detector<D: LanguageDetector + 'static>(mut self, detector: D) -> Self {
        self.engine = self.engine.with_detector(detector);
        self
    }

    /// Options in use.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// The heading engine.
    pub fn engine(&self) -> &OutlineEngine {
        &self.engine
    }

    /// Extract the outline of a PDF file.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<OutlineDocument> {
        Ok(self.analyze_file(path)?.outline)
    }

    /// Extract the outline of an in-memory PDF.
    pub fn extract_bytes(&self, data: &[u8]) -> Result<OutlineDocument> {
        let pages = parser::load_bytes(data, &self.options)?;
        Ok(self.engine.extract(&pages))
    }

    /// Extract the outline of a PDF file with diagnostics.
    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> Result<OutlineReport> {
        let path = path.as_ref();
        let pages = parser::load_file(path, &self.options)?;
        log::debug!("{}: read {} pages", path.display(), pages.len());
        Ok(self.engine.analyze(&pages))
    }
}

impl Default for OutlineExtractor {
    fn default() -> Self {
        Self::new()
    }
}
