//! Fixed service fee and energy charge.

use rust_decimal::Decimal;

use super::amounts::parse_currency;
use super::basic::cascade_field;
use super::patterns::{CUOTA_SERVICIO, IMPORTE_BASICO};
use super::ExtractionMatch;

/// Charges printed before taxes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Charges {
    pub cuota_servicio: Option<ExtractionMatch<Decimal>>,
    pub importe_basico: Option<ExtractionMatch<Decimal>>,
}

impl Charges {
    /// Service fee, 0 when absent.
    pub fn cuota_servicio_or_zero(&self) -> Decimal {
        self.cuota_servicio.as_ref().map_or(Decimal::ZERO, |m| m.value)
    }

    /// Energy charge, 0 when absent.
    pub fn importe_basico_or_zero(&self) -> Decimal {
        self.importe_basico.as_ref().map_or(Decimal::ZERO, |m| m.value)
    }
}

pub fn extract_charges(text: &str) -> Charges {
    Charges {
        cuota_servicio: cascade_field(&CUOTA_SERVICIO, text, "cuota de servicio", |caps| {
            parse_currency(&caps[1])
        }),
        importe_basico: cascade_field(&IMPORTE_BASICO, text, "importe basico", |caps| {
            parse_currency(&caps[1])
        }),
    }
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
    fn test_padded_charges() {
        let text = "Cuota de servicio: $***1.234,56\nImporte Básico: $***9.876,54\n";
        let charges = extract_charges(text);

        let cuota = charges.cuota_servicio.clone().unwrap();
        assert_eq!(cuota.value, dec("1234.56"));
        assert_eq!(cuota.variant, TemplateVariant::Padded);
        assert_eq!(charges.importe_basico_or_zero(), dec("9876.54"));
    }

    #[test]
    fn test_plain_charges() {
        let text = "CUOTA SERVICIO FIJA $800,00\nIMPORTE BASICO ENERGIA $5.000,00\n";
        let charges = extract_charges(text);

        let cuota = charges.cuota_servicio.clone().unwrap();
        assert_eq!(cuota.value, dec("800.00"));
        assert_eq!(cuota.variant, TemplateVariant::Plain);
        assert_eq!(charges.importe_basico_or_zero(), dec("5000.00"));
    }

    #[test]
    fn test_absent_charges_default_to_zero() {
        let charges = extract_charges("nothing relevant");
        assert_eq!(charges, Charges::default());
        assert_eq!(charges.cuota_servicio_or_zero(), Decimal::ZERO);
        assert_eq!(charges.importe_basico_or_zero(), Decimal::ZERO);
    }
}
