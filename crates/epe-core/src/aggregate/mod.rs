//! Multi-bill aggregation.
//!
//! Bills are ordered by emission date and summarized into KPIs and
//! per-period series. Money values can be expressed in nominal pesos or in
//! pesos of the latest price index month; consumption is never rescaled.

mod cpi;
mod dashboard;

pub use cpi::{month_key, CpiIndex};
pub use dashboard::{
    average_consumption, cost_per_kwh, daily_consumption, tax_composition, tier_price_evolution,
    total_billed, total_consumption, Dashboard, Kpis, PeriodPoint,
};

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::bill::BillRecord;

/// How money values are expressed.
#[derive(Debug, Clone, Copy, Default)]
pub enum Valuation<'a> {
    /// As printed on the bill.
    #[default]
    Nominal,
    /// Rescaled to the latest month of the index.
    Real(&'a CpiIndex),
}

impl Valuation<'_> {
    /// Value of `nominal`, billed on `emission_date`.
    pub fn value(&self, nominal: Decimal, emission_date: &str) -> Decimal {
        match self {
            Valuation::Nominal => nominal,
            Valuation::Real(index) => index.adjust(nominal, emission_date),
        }
    }

    pub fn is_real(&self) -> bool {
        matches!(self, Valuation::Real(_))
    }

    /// Index month values are expressed in, if any.
    pub fn reference_key(&self) -> Option<String> {
        match self {
            Valuation::Nominal => None,
            Valuation::Real(index) => index.latest_key().map(str::to_string),
        }
    }
}

/// Stable sort by emission date, ascending.
///
/// Compares the reversed date parts as text, so no calendar validation
/// happens and bills with equal dates keep their relative order.
pub fn sort_by_emission_date(bills: &mut [BillRecord]) {
    bills.sort_by_key(|b| b.emission_sort_key());
}

/// Sum that clamps at the `Decimal` bounds instead of overflowing.
pub(crate) fn saturating_sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values.into_iter().fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Round half away from zero.
pub(crate) fn round(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bill::TaxMap;

    fn bill(filename: &str, date: &str) -> BillRecord {
        BillRecord {
            filename: filename.to_string(),
            client_name: "GOMEZ MARIA".to_string(),
            emission_date: date.to_string(),
            period: String::new(),
            days: 0,
            consumption_kwh: 0,
            cuota_servicio_rate: Decimal::ZERO,
            tiers: Vec::new(),
            importe_basico: Decimal::ZERO,
            taxes: TaxMap::new(),
            total: Decimal::ZERO,
        }
    }

    #[test]
    fn test_sort_by_emission_date() {
        let mut bills = vec![
            bill("a", "15/03/2024"),
            bill("b", "01/01/2024"),
            bill("c", "20/12/2023"),
        ];
        sort_by_emission_date(&mut bills);

        let dates: Vec<_> = bills.iter().map(|b| b.emission_date.as_str()).collect();
        assert_eq!(dates, vec!["20/12/2023", "01/01/2024", "15/03/2024"]);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut bills = vec![
            bill("first", "01/01/2024"),
            bill("early", "01/12/2023"),
            bill("second", "01/01/2024"),
        ];
        sort_by_emission_date(&mut bills);

        let names: Vec<_> = bills.iter().map(|b| b.filename.as_str()).collect();
        assert_eq!(names, vec!["early", "first", "second"]);
    }

    #[test]
    fn test_valuation() {
        let mut index = CpiIndex::new();
        index.insert("01/2024", Decimal::from(100)).unwrap();
        index.insert("02/2024", Decimal::from(150)).unwrap();

        let nominal = Valuation::Nominal;
        let real = Valuation::Real(&index);

        assert_eq!(nominal.value(Decimal::from(10), "05/01/2024"), Decimal::from(10));
        assert_eq!(real.value(Decimal::from(10), "05/01/2024"), Decimal::from(15));
        assert_eq!(real.reference_key(), Some("02/2024".to_string()));
        assert_eq!(nominal.reference_key(), None);
    }

    #[test]
    fn test_saturating_sum() {
        assert_eq!(saturating_sum([Decimal::ONE, Decimal::TWO]), Decimal::from(3));
        assert_eq!(saturating_sum([Decimal::MAX, Decimal::MAX]), Decimal::MAX);
        assert_eq!(saturating_sum(Vec::new()), Decimal::ZERO);
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round(Decimal::new(125, 3), 2), Decimal::new(13, 2));
        assert_eq!(round(Decimal::new(-125, 3), 2), Decimal::new(-13, 2));
    }
}
