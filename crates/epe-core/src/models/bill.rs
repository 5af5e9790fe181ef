//! Electricity bill data models.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A fully assembled bill.
///
/// Built once by the record assembler and only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillRecord {
    /// Name of the source document.
    pub filename: String,

    /// Account holder name, as printed (uppercase).
    pub client_name: String,

    /// Emission date exactly as printed, `DD/MM/YYYY`.
    pub emission_date: String,

    /// Billing period label (e.g. `3/24`), empty when not printed.
    pub period: String,

    /// Days covered by the bill, 0 when not printed.
    pub days: u32,

    /// Billed consumption in kWh.
    pub consumption_kwh: u32,

    /// Fixed service fee.
    pub cuota_servicio_rate: Decimal,

    /// Consumption tiers found on the bill, in canonical order.
    #[serde(default)]
    pub tiers: Vec<TierEntry>,

    /// Energy charge before taxes.
    pub importe_basico: Decimal,

    /// Taxes and surcharges that appear on the bill.
    #[serde(default)]
    pub taxes: TaxMap,

    /// Amount due.
    pub total: Decimal,
}

impl BillRecord {
    /// Sort key for chronological ordering: the date parts reversed and
    /// concatenated (`DD/MM/YYYY` becomes `YYYYMMDD`).
    ///
    /// No calendar parsing happens here, a malformed date simply sorts by
    /// its reversed literal parts.
    pub fn emission_sort_key(&self) -> String {
        self.emission_date.split('/').rev().collect()
    }

    /// Price index key for the emission month, `MM/YYYY`.
    pub fn cpi_key(&self) -> Option<String> {
        crate::aggregate::month_key(&self.emission_date)
    }

    /// Emission date as a calendar date, if it is a valid one.
    pub fn emission_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.emission_date, "%d/%m/%Y").ok()
    }

    /// Look up a tier by name.
    pub fn tier(&self, name: TierName) -> Option<&TierEntry> {
        self.tiers.iter().find(|t| t.tier == name)
    }

    /// Sum of all taxes present on the bill.
    pub fn total_taxes(&self) -> Decimal {
        self.taxes
            .values()
            .fold(Decimal::ZERO, |acc, v| acc.saturating_add(*v))
    }

    /// Sum of kWh over the tiers.
    pub fn tier_consumption(&self) -> u32 {
        tier_consumption(&self.tiers)
    }
}

pub(crate) fn tier_consumption(tiers: &[TierEntry]) -> u32 {
    tiers.iter().fold(0u32, |acc, t| acc.saturating_add(t.kwh))
}

/// A consumption bracket billed at its own price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierEntry {
    /// Canonical tier name.
    pub tier: TierName,

    /// kWh billed in this tier.
    pub kwh: u32,

    /// Unit price.
    pub price_per_kwh: Decimal,

    /// Line amount.
    pub amount: Decimal,
}

/// Consumption tier names as printed on EPE bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TierName {
    Primeros,
    Segundos,
    Terceros,
    /// Also printed as `Últimos`.
    #[serde(alias = "Últimos")]
    Ultimos,
}

impl TierName {
    /// All tiers in billing order.
    pub const ALL: [TierName; 4] = [
        TierName::Primeros,
        TierName::Segundos,
        TierName::Terceros,
        TierName::Ultimos,
    ];

    /// Canonical label.
    pub fn as_str(&self) -> &'static str {
        match self {
            TierName::Primeros => "Primeros",
            TierName::Segundos => "Segundos",
            TierName::Terceros => "Terceros",
            TierName::Ultimos => "Ultimos",
        }
    }

    /// Spellings that may appear in bill text. Each one is matched
    /// separately and every match becomes its own entry.
    pub fn spellings(&self) -> &'static [&'static str] {
        match self {
            TierName::Primeros => &["Primeros"],
            TierName::Segundos => &["Segundos"],
            TierName::Terceros => &["Terceros"],
            TierName::Ultimos => &["Ultimos", "Últimos"],
        }
    }
}

impl fmt::Display for TierName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed set of taxes and surcharges printed on EPE bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaxKey {
    #[serde(rename = "IVA 21%")]
    Iva21,
    #[serde(rename = "C.A.P.")]
    Cap,
    #[serde(rename = "Ley 7797")]
    Ley7797,
    #[serde(rename = "Ord. Mun. 1618/62")]
    OrdMun1618,
    #[serde(rename = "Ord. Mun. 1592/62")]
    OrdMun1592,
    #[serde(rename = "Ley 6604-FER")]
    Ley6604Fer,
    #[serde(rename = "Energías Renovables")]
    EnergiasRenovables,
}

impl TaxKey {
    /// All keys, in display order.
    pub const ALL: [TaxKey; 7] = [
        TaxKey::Iva21,
        TaxKey::Cap,
        TaxKey::Ley7797,
        TaxKey::OrdMun1618,
        TaxKey::OrdMun1592,
        TaxKey::Ley6604Fer,
        TaxKey::EnergiasRenovables,
    ];

    /// Label used as the map key in serialized output.
    pub fn label(&self) -> &'static str {
        match self {
            TaxKey::Iva21 => "IVA 21%",
            TaxKey::Cap => "C.A.P.",
            TaxKey::Ley7797 => "Ley 7797",
            TaxKey::OrdMun1618 => "Ord. Mun. 1618/62",
            TaxKey::OrdMun1592 => "Ord. Mun. 1592/62",
            TaxKey::Ley6604Fer => "Ley 6604-FER",
            TaxKey::EnergiasRenovables => "Energías Renovables",
        }
    }
}

impl fmt::Display for TaxKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Sparse tax mapping. A key is present only if the bill printed it.
pub type TaxMap = BTreeMap<TaxKey, Decimal>;
