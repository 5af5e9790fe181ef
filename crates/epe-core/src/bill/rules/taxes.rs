//! Taxes and surcharges.

use tracing::{debug, warn};

use super::amounts::parse_currency;
use super::patterns::TAXES;
use super::FieldExtractor;
use crate::models::bill::TaxMap;

/// Extracts the sparse tax map.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaxExtractor;

impl FieldExtractor for TaxExtractor {
    type Output = TaxMap;

    fn extract(&self, text: &str) -> Option<TaxMap> {
        let taxes = extract_taxes(text);
        if taxes.is_empty() { None } else { Some(taxes) }
    }
}

/// Match every tax pattern independently.
///
/// Only taxes printed on the bill are present in the result. A tax whose
/// amount is malformed is left out.
pub fn extract_taxes(text: &str) -> TaxMap {
    let mut taxes = TaxMap::new();

    for (key, pattern) in TAXES.iter() {
        let Some(caps) = pattern.captures(text) else {
            continue;
        };
        match parse_currency(&caps[1]) {
            Some(amount) => {
                debug!("{}: {}", key, amount);
                taxes.insert(*key, amount);
            }
            None => warn!("Malformed amount for {}: {:?}", key, &caps[1]),
        }
    }

    taxes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bill::TaxKey;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_only_iva_yields_single_key() {
        let taxes = extract_taxes("IVA 21% $***1.234,56\n");
        assert_eq!(taxes.len(), 1);
        assert_eq!(taxes.get(&TaxKey::Iva21), Some(&dec("1234.56")));
    }

    #[test]
    fn test_all_taxes() {
        let text = "IVA 21% $***2.100,00\n\
                    C.A.P. $***150,00\n\
                    Ley N° 7797 $***35,10\n\
                    Ord. Mun. N.° 1618/62 $***420,00\n\
                    Ord. Mun. N° 1592/62 $***84,00\n\
                    Ley N°6604-FER $***120,00\n\
                    Energías Renovables $***12,50\n";
        let taxes = extract_taxes(text);

        assert_eq!(taxes.len(), 7);
        assert_eq!(taxes[&TaxKey::Cap], dec("150.00"));
        assert_eq!(taxes[&TaxKey::Ley7797], dec("35.10"));
        assert_eq!(taxes[&TaxKey::OrdMun1618], dec("420.00"));
        assert_eq!(taxes[&TaxKey::OrdMun1592], dec("84.00"));
        assert_eq!(taxes[&TaxKey::Ley6604Fer], dec("120.00"));
        assert_eq!(taxes[&TaxKey::EnergiasRenovables], dec("12.50"));
    }

    #[test]
    fn test_degree_sign_is_optional() {
        let taxes = extract_taxes("Ley N 7797 $***35,10\nOrd. Mun. N 1618/62 $***1,00\n");
        assert!(taxes.contains_key(&TaxKey::Ley7797));
        assert!(taxes.contains_key(&TaxKey::OrdMun1618));
    }

    #[test]
    fn test_zero_tax_is_present() {
        let taxes = extract_taxes("C.A.P. $***0,00\n");
        assert_eq!(taxes.get(&TaxKey::Cap), Some(&Decimal::ZERO));
        assert!(!taxes.contains_key(&TaxKey::Iva21));
    }

    #[test]
    fn test_extractor_trait() {
        assert!(TaxExtractor.extract("sin impuestos").is_none());
    }
}
