//! Pattern tables for EPE bill extraction.

use lazy_static::lazy_static;
use regex::Regex;

use super::Cascade;
use super::TemplateVariant::{Padded, Plain};
use crate::models::bill::{TaxKey, TierName};

lazy_static! {
    // Basic info (case-sensitive, labels are printed in caps)
    pub static ref EMISSION_DATE: Regex = Regex::new(
        r"FECHA DE EMISION:\s*(\d{2}/\d{2}/\d{4})"
    ).unwrap();

    pub static ref PERIOD: Cascade = Cascade::new(&[
        (Padded, r"PERIODO\s*(\d+/\d+)"),
        // Meter reading row: R <5 numeric columns> <period>
        (Plain, r"R\s+\d+\s+\d+\s+\d+\s+\d+\s+\d+\s+(\d+/\d+)"),
    ]).unwrap();

    pub static ref DAYS: Cascade = Cascade::new(&[
        (Padded, r"CANT\. DIAS\s*(\d+)"),
        (Plain, r"D[ií]as:\s*(\d+)"),
    ]).unwrap();

    pub static ref CONSUMPTION: Cascade = Cascade::new(&[
        (Padded, r"Consumo Total:\s*(\d+)\s*kWh"),
        (Plain, r"CONSUMO.*?(\d+)\s*kWh"),
    ]).unwrap();

    // Client name shape
    pub static ref CLIENT_NAME_SHAPE: Regex = Regex::new(
        r"^[A-ZÁÉÍÓÚÑÜ ]+$"
    ).unwrap();

    pub static ref COMPANY_BOILERPLATE: Regex = Regex::new(
        r"Empresa Provincial.*"
    ).unwrap();

    pub static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();

    // Charges
    pub static ref CUOTA_SERVICIO: Cascade = Cascade::new(&[
        (Padded, r"(?i)Cuota\s+de\s+servicio\s*:\s*\$\*+([\d.,]+)"),
        (Plain, r"(?i)Cuota\s+Servicio.*?\$([\d.,]+)"),
    ]).unwrap();

    pub static ref IMPORTE_BASICO: Cascade = Cascade::new(&[
        (Padded, r"(?i)Importe Básico\s*:\s*\$\*+([\d.,]+)"),
        (Plain, r"(?i)IMPORTE BASICO.*?\$([\d.,]+)"),
    ]).unwrap();

    // Total
    pub static ref TOTAL: Cascade = Cascade::new(&[
        (Padded, r"(?i)TOTAL\s+\$\*+(\d[\d.,]*)"),
        (Padded, r"(?i)Importe Total.*?\$\*+(\d[\d.,]*)"),
        (Plain, r"(?i)TOTAL A PAGAR.*?\$([\d.,]+)"),
    ]).unwrap();

    // Tiers, one cascade per spelling in canonical order, each with the
    // padded layout first. Both `Ultimos` spellings can match one bill.
    pub static ref TIERS: Vec<(TierName, Cascade)> = TierName::ALL
        .iter()
        .flat_map(|tier| tier.spellings().iter().map(move |s| (*tier, *s)))
        .map(|(tier, spelling)| (tier, tier_cascade(spelling).unwrap()))
        .collect();

    // Taxes, one independent pattern per key
    pub static ref TAXES: Vec<(TaxKey, Regex)> = TaxKey::ALL
        .iter()
        .map(|key| (*key, Regex::new(tax_pattern(*key)).unwrap()))
        .collect();
}

fn tier_cascade(spelling: &str) -> Result<Cascade, regex::Error> {
    let name = regex::escape(spelling);
    let padded =
        format!(r"(?i){name}\s+(\d+)\s+KWh\s+\(\s*([\d.,]+)\s+\$/kWh\)\s+\$\*+([\d.,]+)");
    let plain = format!(r"(?i){name}\s+(\d+)\s+kWh\s+x\s+\$([\d.,]+)\s*=\s+\$([\d.,]+)");
    Cascade::new(&[(Padded, padded.as_str()), (Plain, plain.as_str())])
}

fn tax_pattern(key: TaxKey) -> &'static str {
    match key {
        TaxKey::Ley6604Fer => r"(?i)Ley N°?6604-FER.*?\$\*+(\d[\d.,]*)",
        TaxKey::OrdMun1592 => r"(?i)Ord\. Mun\. N\.?°?\s*1592/62.*?\$\*+(\d[\d.,]*)",
        TaxKey::OrdMun1618 => r"(?i)Ord\. Mun\. N\.?°?\s*1618/62.*?\$\*+(\d[\d.,]*)",
        TaxKey::Ley7797 => r"(?i)Ley N\.?°?\s*7797.*?\$\*+(\d[\d.,]*)",
        TaxKey::Cap => r"(?i)C\.A\.P\..*?\$\*+(\d[\d.,]*)",
        TaxKey::EnergiasRenovables => r"(?i)Energías Renovables.*?\$\*+(\d[\d.,]*)",
        TaxKey::Iva21 => r"(?i)IVA.*?\$\*+(\d[\d.,]*)",
    }
}
