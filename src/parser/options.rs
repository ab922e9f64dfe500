//! Extraction options and configuration.

use crate::engine::Thresholds;

/// Options controlling how PDFs are read and outlines extracted.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Error handling mode for per-page failures
    pub error_mode: ErrorMode,

    /// Whether batch processing runs documents on a thread pool
    pub parallel: bool,

    /// Only read the first N pages (None = all pages)
    pub max_pages: Option<usize>,

    /// Engine heuristics
    pub thresholds: Thresholds,
}

impl ExtractOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Skip unreadable pages instead of failing the document.
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Fail the document on the first unreadable page.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Enable or disable parallel batch processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel batch processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Limit the number of pages read from each document.
    pub fn with_max_pages(mut self, pages: usize) -> Self {
        self.max_pages = Some(pages);
        self
    }

    /// Replace the engine thresholds.
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Whether a 0-based page index should be read.
    pub fn includes_page(&self, index: usize) -> bool {
        self.max_pages.map_or(true, |max| index < max)
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Lenient,
            parallel: true,
            max_pages: None,
            thresholds: Thresholds::default(),
        }
    }
}

/// Error handling mode during page extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any page error
    Strict,
    /// Log and skip unreadable pages
    #[default]
    Lenient,
}
