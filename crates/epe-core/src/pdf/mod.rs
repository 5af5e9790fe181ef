//! PDF processing module.

mod extractor;

pub use extractor::PdfExtractor;

use tracing::{debug, warn};

use crate::error::PdfError;
use crate::layout::{LayoutReconstructor, PositionedFragment};
use crate::models::config::EpeConfig;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Text spans of one page (1-indexed) with their vertical positions.
    fn positioned_fragments(&self, page: u32) -> Result<Vec<PositionedFragment>>;

    /// Extract flat text from the entire PDF.
    fn extract_text(&self) -> Result<String>;
}

/// Turn PDF bytes into logical document text.
///
/// Lines are rebuilt from positioned fragments. When the document yields
/// no fragments at all, flat text extraction is used if the configuration
/// allows it.
pub fn extract_document_text(data: &[u8], config: &EpeConfig) -> crate::Result<String> {
    let mut extractor = PdfExtractor::new();
    extractor.load(data)?;

    let reconstructor = LayoutReconstructor::from_config(&config.layout);
    let text = reconstructor.reconstruct_source(&extractor, config.pdf.max_pages)?;

    if !text.trim().is_empty() {
        return Ok(text);
    }

    if !config.pdf.fallback_to_flat_text {
        warn!("No positioned text found and flat text fallback is disabled");
        return Ok(text);
    }

    debug!("No positioned text found, falling back to flat extraction");
    Ok(extractor.extract_text()?)
}
