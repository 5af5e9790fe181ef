//! Rule-based bill parser.

use std::collections::BTreeMap;
use std::time::Instant;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ExtractionError;
use crate::models::bill::{tier_consumption, BillRecord};
use crate::models::config::{ClientNameConfig, EpeConfig};

use super::rules::{
    extract_basic_info, extract_charges, extract_taxes, extract_tiers, extract_total,
    ClientNameExtractor, ExtractionMatch, TemplateVariant,
};

/// Result of bill extraction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    /// Assembled bill.
    pub bill: BillRecord,
    /// Soft fields that fell back to their defaults.
    pub warnings: Vec<String>,
    /// Template variant of the pattern that produced each field.
    pub variants: BTreeMap<String, TemplateVariant>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    /// The template most fields matched, if any field matched a cascade.
    pub fn dominant_variant(&self) -> Option<TemplateVariant> {
        let padded = self
            .variants
            .values()
            .filter(|v| **v == TemplateVariant::Padded)
            .count();
        let plain = self.variants.len() - padded;
        match (padded, plain) {
            (0, 0) => None,
            (p, q) if p >= q => Some(TemplateVariant::Padded),
            _ => Some(TemplateVariant::Plain),
        }
    }
}

/// Trait for bill parsing.
pub trait BillParser {
    /// Parse a bill from logical document text.
    fn parse(&self, text: &str, filename: &str) -> Result<ExtractionResult, ExtractionError>;
}

/// Parser built from the pattern cascades.
#[derive(Debug, Clone, Default)]
pub struct RuleBillParser {
    client: ClientNameExtractor,
}

impl RuleBillParser {
    /// Create a parser with default heuristics.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EpeConfig) -> Self {
        Self::new().with_client_name_config(config.client_name.clone())
    }

    /// Set the client name heuristic bounds.
    pub fn with_client_name_config(mut self, config: ClientNameConfig) -> Self {
        self.client = ClientNameExtractor::from_config(config);
        self
    }
}

/// Records which template produced a field, or a warning when it is absent.
struct Tally {
    warnings: Vec<String>,
    variants: BTreeMap<String, TemplateVariant>,
}

impl Tally {
    fn take<T>(&mut self, field: &str, m: Option<ExtractionMatch<T>>) -> Option<T> {
        match m {
            Some(m) => {
                self.variants.insert(field.to_string(), m.variant);
                Some(m.value)
            }
            None => {
                self.warnings.push(format!("Could not extract {}", field));
                None
            }
        }
    }
}

impl BillParser for RuleBillParser {
    fn parse(&self, text: &str, filename: &str) -> Result<ExtractionResult, ExtractionError> {
        let start = Instant::now();

        if text.trim().is_empty() {
            return Err(ExtractionError::NoData);
        }

        debug!("Parsing {} from {} characters of text", filename, text.len());

        let basic = extract_basic_info(text, &self.client)?;
        let mut tally = Tally {
            warnings: Vec::new(),
            variants: BTreeMap::new(),
        };

        let period = tally.take("period", basic.period).unwrap_or_default();
        let days = tally.take("days", basic.days).unwrap_or(0);
        let consumption = tally.take("consumptionKwh", basic.consumption);

        let tier_matches = extract_tiers(text);
        if tier_matches.is_empty() {
            tally.warnings.push("Could not extract any tier".to_string());
        }
        let tiers: Vec<_> = tier_matches
            .into_iter()
            .map(|m| {
                tally
                    .variants
                    .insert(format!("tier:{}", m.value.tier), m.variant);
                m.value
            })
            .collect();

        let charges = extract_charges(text);
        let cuota_servicio_rate = tally
            .take("cuotaServicioRate", charges.cuota_servicio)
            .unwrap_or(Decimal::ZERO);
        let importe_basico = tally
            .take("importeBasico", charges.importe_basico)
            .unwrap_or(Decimal::ZERO);

        let taxes = extract_taxes(text);
        let total = tally
            .take("total", extract_total(text))
            .unwrap_or(Decimal::ZERO);

        // A zero or missing consumption line is recovered from the tiers.
        let mut consumption_kwh = consumption.unwrap_or(0);
        if consumption_kwh == 0 && !tiers.is_empty() {
            consumption_kwh = tier_consumption(&tiers);
            debug!("Consumption reconciled from tiers: {} kWh", consumption_kwh);
        }

        let bill = BillRecord {
            filename: filename.to_string(),
            client_name: basic.client_name,
            emission_date: basic.emission_date,
            period,
            days,
            consumption_kwh,
            cuota_servicio_rate,
            tiers,
            importe_basico,
            taxes,
            total,
        };

        info!(
            "Parsed {}: {} kWh, total {}, {} taxes",
            filename,
            bill.consumption_kwh,
            bill.total,
            bill.taxes.len()
        );

        Ok(ExtractionResult {
            bill,
            warnings: tally.warnings,
            variants: tally.variants,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}
