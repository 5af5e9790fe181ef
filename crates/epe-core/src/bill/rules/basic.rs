//! Identity and period fields.

use regex::Captures;
use tracing::{debug, warn};

use super::amounts::parse_count;
use super::client::ClientNameExtractor;
use super::patterns::{CONSUMPTION, DAYS, EMISSION_DATE, PERIOD};
use super::{Cascade, ExtractionMatch, FieldExtractor};
use crate::error::ExtractionError;

/// Fields from the bill header.
///
/// Client name and emission date are required. The rest are soft fields
/// and stay `None` when no pattern matched.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicInfo {
    pub client_name: String,
    pub emission_date: String,
    pub period: Option<ExtractionMatch<String>>,
    pub days: Option<ExtractionMatch<u32>>,
    pub consumption: Option<ExtractionMatch<u32>>,
}

/// Extract the header fields.
///
/// Fails with [`ExtractionError::MissingField`] when the client name or the
/// emission date cannot be found.
pub fn extract_basic_info(
    text: &str,
    client: &ClientNameExtractor,
) -> Result<BasicInfo, ExtractionError> {
    let client_name = client
        .extract(text)
        .ok_or_else(|| ExtractionError::MissingField("client name".to_string()))?;

    let emission_date = EMISSION_DATE
        .captures(text)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| ExtractionError::MissingField("emission date".to_string()))?;

    let period = cascade_field(&PERIOD, text, "period", |caps| Some(caps[1].to_string()));
    let days = cascade_field(&DAYS, text, "days", |caps| parse_count(&caps[1]));
    let consumption = cascade_field(&CONSUMPTION, text, "consumption", |caps| {
        parse_count(&caps[1])
    });

    Ok(BasicInfo {
        client_name,
        emission_date,
        period,
        days,
        consumption,
    })
}

/// Run a cascade and convert the captures of the first match.
pub(crate) fn cascade_field<T>(
    cascade: &Cascade,
    text: &str,
    field: &str,
    convert: impl FnOnce(&Captures<'_>) -> Option<T>,
) -> Option<ExtractionMatch<T>> {
    let (variant, caps) = cascade.captures(text)?;
    let source = caps.get(0).map_or("", |m| m.as_str());

    match convert(&caps) {
        Some(value) => {
            debug!("{} matched {:?} pattern", field, variant);
            Some(ExtractionMatch::new(value, variant, source))
        }
        None => {
            warn!("Malformed {} in {:?}, treating as absent", field, source);
            None
        }
    }
}
