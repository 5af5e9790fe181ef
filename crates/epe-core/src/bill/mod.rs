//! Bill field extraction module.

mod parser;
pub mod rules;

pub use parser::{BillParser, ExtractionResult, RuleBillParser};

use tracing::warn;

use crate::models::bill::BillRecord;

/// Extract a bill from logical document text with the default parser.
///
/// Returns `None` when the client name or the emission date is missing.
/// Every other field falls back to its default.
pub fn extract_bill_data(text: &str, filename: &str) -> Option<BillRecord> {
    match RuleBillParser::new().parse(text, filename) {
        Ok(result) => Some(result.bill),
        Err(e) => {
            warn!("Rejected {}: {}", filename, e);
            None
        }
    }
}
