//! Consumer price index (IPC) table.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CpiError;
use crate::Result;

/// Monthly price levels keyed by `MM/YYYY`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CpiIndex {
    values: BTreeMap<String, Decimal>,
}

/// Series API response, `{"data": [["2024-01-01", 1234.5], ...]}`.
#[derive(Debug, Deserialize)]
struct SeriesResponse {
    data: Vec<(String, Option<f64>)>,
}

impl CpiIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from a key/value map, validating every key.
    pub fn from_map(values: BTreeMap<String, Decimal>) -> std::result::Result<Self, CpiError> {
        for key in values.keys() {
            parse_key(key)?;
        }
        Ok(Self { values })
    }

    /// Parse a flat JSON object such as `{"01/2024": "4.21"}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let values: BTreeMap<String, Decimal> = serde_json::from_str(json)?;
        Ok(Self::from_map(values)?)
    }

    /// Parse a datos.gob.ar series response.
    ///
    /// Observations without a value are skipped.
    pub fn from_series_json(json: &str) -> Result<Self> {
        let response: SeriesResponse = serde_json::from_str(json)?;
        let mut index = Self::new();

        for (date, value) in response.data {
            let Some(value) = value else {
                warn!("Skipping CPI observation {} without value", date);
                continue;
            };
            let parsed = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
                CpiError::Parse {
                    key: date.clone(),
                    reason: e.to_string(),
                }
            })?;
            let level = Decimal::from_f64(value).ok_or_else(|| CpiError::Parse {
                key: date.clone(),
                reason: format!("value {} is not representable", value),
            })?;
            index
                .values
                .insert(format!("{:02}/{}", parsed.month(), parsed.year()), level);
        }

        if index.is_empty() {
            return Err(CpiError::Empty.into());
        }
        debug!("Loaded {} CPI observations", index.len());
        Ok(index)
    }

    /// Serialize as a flat JSON object.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: Decimal,
    ) -> std::result::Result<(), CpiError> {
        let key = key.into();
        parse_key(&key)?;
        self.values.insert(key, value);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<Decimal> {
        self.values.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entries in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> {
        let mut entries: Vec<_> = self
            .values
            .iter()
            .filter_map(|(k, v)| parse_key(k).ok().map(|ym| (ym, k.as_str(), *v)))
            .collect();
        entries.sort_by_key(|(ym, _, _)| *ym);
        entries.into_iter().map(|(_, k, v)| (k, v))
    }

    /// Chronologically greatest key.
    pub fn latest_key(&self) -> Option<&str> {
        self.values
            .keys()
            .filter_map(|k| parse_key(k).ok().map(|ym| (ym, k.as_str())))
            .max_by_key(|(ym, _)| *ym)
            .map(|(_, k)| k)
    }

    pub fn latest_value(&self) -> Option<Decimal> {
        self.latest_key().and_then(|k| self.get(k))
    }

    /// Express `nominal`, billed on `emission_date` (`DD/MM/YYYY`), in
    /// prices of the latest month.
    ///
    /// Returns `nominal` unchanged when either index value is missing or
    /// zero, or when the adjusted value does not fit a `Decimal`.
    pub fn adjust(&self, nominal: Decimal, emission_date: &str) -> Decimal {
        let bill_level = month_key(emission_date).and_then(|k| self.get(&k));
        match (bill_level, self.latest_value()) {
            (Some(bill), Some(latest)) if !bill.is_zero() && !latest.is_zero() => latest
                .checked_div(bill)
                .and_then(|ratio| nominal.checked_mul(ratio))
                .unwrap_or(nominal),
            _ => nominal,
        }
    }
}

/// Index key (`MM/YYYY`) for a `DD/MM/YYYY` date.
pub fn month_key(emission_date: &str) -> Option<String> {
    let mut parts = emission_date.split('/');
    let _day = parts.next()?;
    let month = parts.next()?;
    let year = parts.next()?;
    Some(format!("{}/{}", month, year))
}

fn parse_key(key: &str) -> std::result::Result<(i32, u32), CpiError> {
    let invalid = |reason: &str| CpiError::Parse {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let (month, year) = key
        .split_once('/')
        .ok_or_else(|| invalid("expected MM/YYYY"))?;
    if month.len() != 2 || year.len() != 4 {
        return Err(invalid("expected MM/YYYY"));
    }
    let month: u32 = month.parse().map_err(|_| invalid("bad month"))?;
    let year: i32 = year.parse().map_err(|_| invalid("bad year"))?;
    if !(1..=12).contains(&month) {
        return Err(invalid("month out of range"));
    }
    Ok((year, month))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn index(entries: &[(&str, &str)]) -> CpiIndex {
        let mut index = CpiIndex::new();
        for (k, v) in entries {
            index.insert(*k, dec(v)).unwrap();
        }
        index
    }

    #[test]
    fn test_latest_key_is_chronological() {
        // Lexical order would pick 12/2023.
        let cpi = index(&[("12/2023", "100"), ("02/2024", "120"), ("01/2024", "110")]);
        assert_eq!(cpi.latest_key(), Some("02/2024"));
        assert_eq!(cpi.latest_value(), Some(dec("120")));

        let order: Vec<_> = cpi.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["12/2023", "01/2024", "02/2024"]);
    }

    #[test]
    fn test_adjust() {
        let cpi = index(&[("01/2024", "100"), ("03/2024", "250")]);
        assert_eq!(cpi.adjust(dec("1000"), "15/01/2024"), dec("2500"));
        assert_eq!(cpi.adjust(dec("1000"), "15/03/2024"), dec("1000"));
    }

    #[test]
    fn test_adjust_passthrough() {
        let cpi = index(&[("01/2024", "0"), ("03/2024", "250")]);
        // Unknown month
        assert_eq!(cpi.adjust(dec("10"), "01/06/2022"), dec("10"));
        // Zero level
        assert_eq!(cpi.adjust(dec("10"), "01/01/2024"), dec("10"));
        // Malformed date
        assert_eq!(cpi.adjust(dec("10"), "garbage"), dec("10"));
        // Empty index
        assert_eq!(CpiIndex::new().adjust(dec("10"), "01/03/2024"), dec("10"));
    }

    #[test]
    fn test_adjust_overflow_keeps_nominal() {
        let cpi = index(&[("01/2024", "1"), ("03/2024", "1000")]);
        assert_eq!(cpi.adjust(Decimal::MAX, "15/01/2024"), Decimal::MAX);
        assert_eq!(cpi.adjust(dec("2"), "15/01/2024"), dec("2000"));
    }

    #[test]
    fn test_rejects_bad_keys() {
        let mut cpi = CpiIndex::new();
        assert!(cpi.insert("2024-01", Decimal::ONE).is_err());
        assert!(cpi.insert("13/2024", Decimal::ONE).is_err());
        assert!(cpi.insert("1/2024", Decimal::ONE).is_err());
        assert!(cpi.is_empty());
    }

    #[test]
    fn test_flat_json_roundtrip() {
        let cpi = CpiIndex::from_json(r#"{"01/2024": "4500.5", "02/2024": "4700"}"#).unwrap();
        assert_eq!(cpi.get("01/2024"), Some(dec("4500.5")));

        let back = CpiIndex::from_json(&cpi.to_json().unwrap()).unwrap();
        assert_eq!(back, cpi);
    }

    #[test]
    fn test_series_json() {
        let json = r#"{
            "data": [["2023-12-01", 3533.19], ["2024-01-01", 4261.53], ["2024-02-01", null]],
            "count": 3,
            "meta": []
        }"#;
        let cpi = CpiIndex::from_series_json(json).unwrap();

        assert_eq!(cpi.len(), 2);
        assert_eq!(cpi.get("12/2023").map(|v| v.round_dp(2)), Some(dec("3533.19")));
        assert_eq!(cpi.latest_key(), Some("01/2024"));
    }

    #[test]
    fn test_series_json_empty() {
        assert!(CpiIndex::from_series_json(r#"{"data": []}"#).is_err());
        assert!(CpiIndex::from_series_json(r#"{"data": [["not-a-date", 1.0]]}"#).is_err());
    }

    #[test]
    fn test_month_key() {
        assert_eq!(month_key("15/03/2024"), Some("03/2024".to_string()));
        assert_eq!(month_key("2024"), None);
    }
}
