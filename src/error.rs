//! Error types for pdfoutline.

use std::io;
use thiserror::Error;

/// Result type alias for pdfoutline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting an outline.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading inputs or writing outputs.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file does not start with a PDF header.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF document is encrypted and cannot be read.
    #[error("Document is encrypted")]
    Encrypted,

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// A required PDF object is missing.
    #[error("Missing required object: {0}")]
    MissingObject(String),

    /// Error serializing the outline.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Invalid threshold or option configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller supplied an unusable path or argument.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Render(format!("JSON serialization error: {}", err))
    }
}
