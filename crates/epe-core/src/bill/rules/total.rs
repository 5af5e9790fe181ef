//! Amount due.

use rust_decimal::Decimal;

use super::amounts::parse_currency;
use super::basic::cascade_field;
use super::patterns::TOTAL;
use super::{ExtractionMatch, FieldExtractor};

#[derive(Debug, Clone, Copy, Default)]
pub struct TotalExtractor;

impl FieldExtractor for TotalExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        extract_total(text)
    }
}

pub fn extract_total(text: &str) -> Option<ExtractionMatch<Decimal>> {
    cascade_field(&TOTAL, text, "total", |caps| parse_currency(&caps[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bill::rules::TemplateVariant;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_total_cascade() {
        let padded = extract_total("TOTAL $***25.430,12\n").unwrap();
        assert_eq!(padded.value, dec("25430.12"));
        assert_eq!(padded.variant, TemplateVariant::Padded);

        let importe = extract_total("Importe Total a pagar $***1.000,00\n").unwrap();
        assert_eq!(importe.value, dec("1000.00"));
        assert_eq!(importe.variant, TemplateVariant::Padded);

        let plain = extract_total("TOTAL A PAGAR $18.250,75\n").unwrap();
        assert_eq!(plain.value, dec("18250.75"));
        assert_eq!(plain.variant, TemplateVariant::Plain);
    }

    #[test]
    fn test_missing_total() {
        assert!(extract_total("Consumo Total: 300 kWh").is_none());
        assert!(TotalExtractor.extract("").is_none());
    }
}
