//! Error types for the epe-core library.

use thiserror::Error;

/// Main error type for the epe library.
#[derive(Error, Debug)]
pub enum EpeError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Bill extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Price index error.
    #[error("CPI error: {0}")]
    Cpi(#[from] CpiError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to bill field extraction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// A field that gates the whole record is missing.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// The document produced no text at all.
    #[error("no bill data found")]
    NoData,
}

/// Errors related to price index data.
#[derive(Error, Debug)]
pub enum CpiError {
    /// An entry could not be understood.
    #[error("invalid CPI entry {key}: {reason}")]
    Parse { key: String, reason: String },

    /// The index contains no entries.
    #[error("CPI index is empty")]
    Empty,
}

/// Result type for the epe library.
pub type Result<T> = std::result::Result<T, EpeError>;
