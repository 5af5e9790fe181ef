//! KPIs and per-period series.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::{round, saturating_sum, sort_by_emission_date, Valuation};
use crate::models::bill::{BillRecord, TaxKey, TierName};

/// Headline figures over a set of bills.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub bill_count: usize,
    /// kWh over every bill.
    pub total_consumption: u64,
    /// kWh per bill over every bill.
    pub average_consumption: Decimal,
    /// Sum of totals over the charted bills, or every bill when none has
    /// consumption.
    pub total_billed: Decimal,
    /// Total of the most recent bill in the same set.
    pub last_total: Option<Decimal>,
    pub last_period: Option<String>,
}

/// One billing period of the series. Only bills with consumption are
/// charted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodPoint {
    pub period: String,
    pub emission_date: String,
    pub filename: String,
    pub consumption_kwh: u32,
    pub total: Decimal,
    pub importe_basico: Decimal,
    /// kWh per day, 0 when the bill has no day count.
    pub daily_consumption: Decimal,
    pub cost_per_kwh: Decimal,
    /// Every tax key, 0 when the bill does not print it.
    pub taxes: BTreeMap<TaxKey, Decimal>,
    pub total_taxes: Decimal,
    /// Unit price per tier, `None` when the bill has no such tier.
    pub tier_prices: BTreeMap<TierName, Option<Decimal>>,
}

/// Everything the dashboard shows, for one valuation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub kpis: Kpis,
    pub series: Vec<PeriodPoint>,
    /// Whether money values are expressed in prices of `reference_month`.
    pub adjusted: bool,
    pub reference_month: Option<String>,
}

impl Dashboard {
    /// Build the dashboard from bills in any order.
    pub fn build(bills: &[BillRecord], valuation: Valuation<'_>) -> Self {
        let mut sorted = bills.to_vec();
        sort_by_emission_date(&mut sorted);

        let series: Vec<_> = charted(&sorted)
            .map(|b| period_point(b, valuation))
            .collect();

        let kpi_bills = kpi_bills(&sorted);
        let last = kpi_bills.last();
        let kpis = Kpis {
            bill_count: sorted.len(),
            total_consumption: total_consumption(&sorted),
            average_consumption: average_consumption(&sorted),
            total_billed: total_billed(&sorted, valuation),
            last_total: last.map(|b| valuation.value(b.total, &b.emission_date)),
            last_period: last.map(|b| b.period.clone()),
        };

        debug!(
            "Dashboard over {} bills, {} charted periods",
            kpis.bill_count,
            series.len()
        );

        Self {
            kpis,
            series,
            adjusted: valuation.is_real(),
            reference_month: valuation.reference_key(),
        }
    }

    pub fn periods(&self) -> impl Iterator<Item = &str> {
        self.series.iter().map(|p| p.period.as_str())
    }
}

fn charted(bills: &[BillRecord]) -> impl Iterator<Item = &BillRecord> {
    bills.iter().filter(|b| b.consumption_kwh > 0)
}

/// Bills behind the billed-total KPIs: the charted ones, as the chart KPI
/// panel counts them, or every bill when none is charted. A first render
/// that sums every bill nominally is not reproduced.
fn kpi_bills(bills: &[BillRecord]) -> Vec<&BillRecord> {
    let charted: Vec<_> = charted(bills).collect();
    if charted.is_empty() {
        bills.iter().collect()
    } else {
        charted
    }
}

fn period_point(bill: &BillRecord, valuation: Valuation<'_>) -> PeriodPoint {
    let taxes = bill_tax_composition(bill, valuation);
    let total_taxes = saturating_sum(
        bill.taxes
            .values()
            .map(|v| valuation.value(*v, &bill.emission_date)),
    );

    PeriodPoint {
        period: bill.period.clone(),
        emission_date: bill.emission_date.clone(),
        filename: bill.filename.clone(),
        consumption_kwh: bill.consumption_kwh,
        total: valuation.value(bill.total, &bill.emission_date),
        importe_basico: valuation.value(bill.importe_basico, &bill.emission_date),
        daily_consumption: bill_daily_consumption(bill),
        cost_per_kwh: bill_cost_per_kwh(bill, valuation),
        taxes,
        total_taxes,
        tier_prices: TierName::ALL
            .iter()
            .map(|t| (*t, bill_tier_price(bill, *t, valuation)))
            .collect(),
    }
}

fn bill_daily_consumption(bill: &BillRecord) -> Decimal {
    if bill.days == 0 {
        return Decimal::ZERO;
    }
    round(
        Decimal::from(bill.consumption_kwh) / Decimal::from(bill.days),
        2,
    )
}

fn bill_cost_per_kwh(bill: &BillRecord, valuation: Valuation<'_>) -> Decimal {
    if bill.consumption_kwh == 0 {
        return Decimal::ZERO;
    }
    let total = valuation.value(bill.total, &bill.emission_date);
    round(total / Decimal::from(bill.consumption_kwh), 2)
}

fn bill_tax_composition(bill: &BillRecord, valuation: Valuation<'_>) -> BTreeMap<TaxKey, Decimal> {
    TaxKey::ALL
        .iter()
        .map(|key| {
            let nominal = bill.taxes.get(key).copied().unwrap_or(Decimal::ZERO);
            (*key, valuation.value(nominal, &bill.emission_date))
        })
        .collect()
}

fn bill_tier_price(bill: &BillRecord, tier: TierName, valuation: Valuation<'_>) -> Option<Decimal> {
    let entry = bill.tier(tier)?;
    Some(match valuation {
        Valuation::Nominal => entry.price_per_kwh,
        Valuation::Real(_) => round(valuation.value(entry.price_per_kwh, &bill.emission_date), 5),
    })
}

/// kWh over every bill.
pub fn total_consumption(bills: &[BillRecord]) -> u64 {
    bills.iter().map(|b| u64::from(b.consumption_kwh)).sum()
}

/// kWh per bill over every bill, 0 for an empty set.
pub fn average_consumption(bills: &[BillRecord]) -> Decimal {
    if bills.is_empty() {
        return Decimal::ZERO;
    }
    Decimal::from(total_consumption(bills)) / Decimal::from(bills.len() as u64)
}

/// Sum of totals over the charted bills, or every bill when none has
/// consumption. Clamps at `Decimal::MAX`.
pub fn total_billed(bills: &[BillRecord], valuation: Valuation<'_>) -> Decimal {
    saturating_sum(
        kpi_bills(bills)
            .iter()
            .map(|b| valuation.value(b.total, &b.emission_date)),
    )
}

/// Total per kWh for each charted bill, in input order.
pub fn cost_per_kwh(bills: &[BillRecord], valuation: Valuation<'_>) -> Vec<Decimal> {
    charted(bills)
        .map(|b| bill_cost_per_kwh(b, valuation))
        .collect()
}

/// kWh per day for each charted bill, in input order.
pub fn daily_consumption(bills: &[BillRecord]) -> Vec<Decimal> {
    charted(bills).map(bill_daily_consumption).collect()
}

/// One series per tax key over the charted bills.
pub fn tax_composition(
    bills: &[BillRecord],
    valuation: Valuation<'_>,
) -> BTreeMap<TaxKey, Vec<Decimal>> {
    let mut composition: BTreeMap<TaxKey, Vec<Decimal>> =
        TaxKey::ALL.iter().map(|k| (*k, Vec::new())).collect();

    for bill in charted(bills) {
        for (key, value) in bill_tax_composition(bill, valuation) {
            composition.entry(key).or_default().push(value);
        }
    }
    composition
}

/// Unit price of one tier over the charted bills.
pub fn tier_price_evolution(
    bills: &[BillRecord],
    tier: TierName,
    valuation: Valuation<'_>,
) -> Vec<Option<Decimal>> {
    charted(bills)
        .map(|b| bill_tier_price(b, tier, valuation))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::CpiIndex;
    use crate::models::bill::{TaxMap, TierEntry};
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn bill(date: &str, period: &str, kwh: u32, days: u32, total: &str) -> BillRecord {
        BillRecord {
            filename: format!("{}.pdf", period.replace('/', "-")),
            client_name: "GOMEZ MARIA".to_string(),
            emission_date: date.to_string(),
            period: period.to_string(),
            days,
            consumption_kwh: kwh,
            cuota_servicio_rate: Decimal::ZERO,
            tiers: Vec::new(),
            importe_basico: dec(total) / Decimal::TWO,
            taxes: TaxMap::new(),
            total: dec(total),
        }
    }

    fn sample() -> Vec<BillRecord> {
        let mut march = bill("15/03/2024", "2/24", 300, 60, "30000");
        march.taxes.insert(TaxKey::Iva21, dec("5000"));
        march.tiers.push(TierEntry {
            tier: TierName::Primeros,
            kwh: 150,
            price_per_kwh: dec("40"),
            amount: dec("6000"),
        });

        let mut january = bill("10/01/2024", "1/24", 200, 61, "10000");
        january.taxes.insert(TaxKey::Iva21, dec("2000"));
        january.taxes.insert(TaxKey::Cap, dec("100"));
        january.tiers.push(TierEntry {
            tier: TierName::Primeros,
            kwh: 150,
            price_per_kwh: dec("20"),
            amount: dec("3000"),
        });

        let empty = bill("01/02/2024", "", 0, 0, "5000");

        vec![march, january, empty]
    }

    fn index() -> CpiIndex {
        let mut index = CpiIndex::new();
        index.insert("01/2024", dec("100")).unwrap();
        index.insert("03/2024", dec("200")).unwrap();
        index
    }

    #[test]
    fn test_nominal_dashboard() {
        let dashboard = Dashboard::build(&sample(), Valuation::Nominal);

        assert!(!dashboard.adjusted);
        assert_eq!(dashboard.reference_month, None);
        assert_eq!(dashboard.periods().collect::<Vec<_>>(), vec!["1/24", "2/24"]);

        let kpis = &dashboard.kpis;
        assert_eq!(kpis.bill_count, 3);
        assert_eq!(kpis.total_consumption, 500);
        assert_eq!(kpis.average_consumption.round_dp(2), dec("166.67"));
        // The bill without consumption is not charted.
        assert_eq!(kpis.total_billed, dec("40000"));
        assert_eq!(kpis.last_total, Some(dec("30000")));
        assert_eq!(kpis.last_period, Some("2/24".to_string()));

        let january = &dashboard.series[0];
        assert_eq!(january.daily_consumption, dec("3.28"));
        assert_eq!(january.cost_per_kwh, dec("50"));
        assert_eq!(january.taxes.len(), 7);
        assert_eq!(january.taxes[&TaxKey::Cap], dec("100"));
        assert_eq!(january.taxes[&TaxKey::Ley7797], Decimal::ZERO);
        assert_eq!(january.total_taxes, dec("2100"));
        assert_eq!(january.tier_prices[&TierName::Primeros], Some(dec("20")));
        assert_eq!(january.tier_prices[&TierName::Segundos], None);
    }

    #[test]
    fn test_real_dashboard() {
        let index = index();
        let dashboard = Dashboard::build(&sample(), Valuation::Real(&index));

        assert!(dashboard.adjusted);
        assert_eq!(dashboard.reference_month, Some("03/2024".to_string()));

        let january = &dashboard.series[0];
        assert_eq!(january.total, dec("20000"));
        assert_eq!(january.importe_basico, dec("10000"));
        assert_eq!(january.cost_per_kwh, dec("100"));
        assert_eq!(january.total_taxes, dec("4200"));
        assert_eq!(january.tier_prices[&TierName::Primeros], Some(dec("40")));

        // Latest month is already in reference prices.
        let march = &dashboard.series[1];
        assert_eq!(march.total, dec("30000"));

        assert_eq!(dashboard.kpis.total_billed, dec("50000"));
    }

    #[test]
    fn test_inflation_neutrality() {
        let bills = sample();
        let index = index();
        let nominal = Dashboard::build(&bills, Valuation::Nominal);
        let real = Dashboard::build(&bills, Valuation::Real(&index));

        // Disabled transform leaves money untouched.
        let mut sorted = bills.clone();
        sort_by_emission_date(&mut sorted);
        let charted_totals: Vec<_> = sorted
            .iter()
            .filter(|b| b.consumption_kwh > 0)
            .map(|b| b.total)
            .collect();
        let series_totals: Vec<_> = nominal.series.iter().map(|p| p.total).collect();
        assert_eq!(series_totals, charted_totals);

        // Consumption never moves.
        assert_eq!(nominal.kpis.total_consumption, real.kpis.total_consumption);
        assert_eq!(nominal.kpis.average_consumption, real.kpis.average_consumption);
        for (n, r) in nominal.series.iter().zip(&real.series) {
            assert_eq!(n.consumption_kwh, r.consumption_kwh);
            assert_eq!(n.daily_consumption, r.daily_consumption);
        }
    }

    #[test]
    fn test_kpis_fall_back_to_all_bills() {
        let bills = vec![
            bill("01/01/2024", "1/24", 0, 0, "100"),
            bill("01/03/2024", "2/24", 0, 0, "200"),
        ];
        let dashboard = Dashboard::build(&bills, Valuation::Nominal);

        assert!(dashboard.series.is_empty());
        assert_eq!(dashboard.kpis.total_billed, dec("300"));
        assert_eq!(dashboard.kpis.last_total, Some(dec("200")));
    }

    #[test]
    fn test_huge_totals_saturate() {
        let huge = "50000000000000000000000000000";
        let mut first = bill("10/01/2024", "1/24", 100, 30, huge);
        first.taxes.insert(TaxKey::Iva21, dec(huge));
        first.taxes.insert(TaxKey::Cap, dec(huge));
        let bills = vec![first, bill("15/03/2024", "2/24", 100, 30, huge)];

        let nominal = Dashboard::build(&bills, Valuation::Nominal);
        assert_eq!(nominal.kpis.total_billed, Decimal::MAX);
        assert_eq!(nominal.series[0].total_taxes, Decimal::MAX);
        assert_eq!(nominal.kpis.last_total, Some(dec(huge)));

        let index = index();
        let real = Dashboard::build(&bills, Valuation::Real(&index));
        assert_eq!(real.kpis.total_billed, Decimal::MAX);
        // January would double past the bound, so it stays nominal
        assert_eq!(real.series[0].total, dec(huge));
    }

    #[test]
    fn test_empty_dashboard() {
        let dashboard = Dashboard::build(&[], Valuation::Nominal);
        assert_eq!(dashboard.kpis.bill_count, 0);
        assert_eq!(dashboard.kpis.average_consumption, Decimal::ZERO);
        assert_eq!(dashboard.kpis.total_billed, Decimal::ZERO);
        assert_eq!(dashboard.kpis.last_total, None);
    }

    #[test]
    fn test_query_functions() {
        let mut bills = sample();
        sort_by_emission_date(&mut bills);
        let index = index();

        assert_eq!(total_consumption(&bills), 500);
        assert_eq!(daily_consumption(&bills), vec![dec("3.28"), dec("5")]);
        assert_eq!(cost_per_kwh(&bills, Valuation::Nominal), vec![dec("50"), dec("100")]);
        assert_eq!(
            tier_price_evolution(&bills, TierName::Primeros, Valuation::Real(&index)),
            vec![Some(dec("40")), Some(dec("40"))]
        );
        assert_eq!(
            tier_price_evolution(&bills, TierName::Ultimos, Valuation::Nominal),
            vec![None, None]
        );

        let taxes = tax_composition(&bills, Valuation::Nominal);
        assert_eq!(taxes.len(), 7);
        assert_eq!(taxes[&TaxKey::Iva21], vec![dec("2000"), dec("5000")]);
        assert_eq!(taxes[&TaxKey::Cap], vec![dec("100"), Decimal::ZERO]);
    }

    #[test]
    fn test_serialized_keys() {
        let dashboard = Dashboard::build(&sample(), Valuation::Nominal);
        let json = serde_json::to_value(&dashboard).unwrap();

        assert_eq!(json["kpis"]["totalConsumption"], 500);
        assert_eq!(json["series"][0]["taxes"]["IVA 21%"], "2000");
        assert!(json["series"][0]["tierPrices"]["Segundos"].is_null());
    }
}
