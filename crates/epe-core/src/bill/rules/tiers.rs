//! Consumption tier lines.

use tracing::debug;

use super::amounts::{parse_count, parse_currency};
use super::basic::cascade_field;
use super::patterns::TIERS;
use super::{ExtractionMatch, FieldExtractor};
use crate::models::bill::TierEntry;

/// Extracts every tier printed on the bill.
///
/// Tiers are independent: a tier whose line is missing or malformed is
/// skipped and the rest are still returned, in canonical order.
#[derive(Debug, Clone, Copy, Default)]
pub struct TierExtractor;

impl FieldExtractor for TierExtractor {
    type Output = Vec<ExtractionMatch<TierEntry>>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let tiers = extract_tiers(text);
        if tiers.is_empty() { None } else { Some(tiers) }
    }
}

/// Extract the tier table in canonical order.
///
/// Each spelling is matched on its own, so a bill printing both `Ultimos`
/// and `Últimos` lines yields two `Ultimos` entries.
pub fn extract_tiers(text: &str) -> Vec<ExtractionMatch<TierEntry>> {
    let mut found = Vec::new();

    for (tier, cascade) in TIERS.iter() {
        let entry = cascade_field(cascade, text, tier.as_str(), |caps| {
            Some(TierEntry {
                tier: *tier,
                kwh: parse_count(&caps[1])?,
                price_per_kwh: parse_currency(&caps[2])?,
                amount: parse_currency(&caps[3])?,
            })
        });
        if let Some(entry) = entry {
            found.push(entry);
        }
    }

    debug!("Found {} tiers", found.len());
    found
}
