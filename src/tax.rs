//! Compound, location-ordered tax computation.
//!
//! A location's rate list is an ordered pipeline, not a set: non-compound
//! rates apply to the raw subtotal, compound rates to the subtotal plus all
//! non-compound tax already accumulated. Amounts stay at full precision;
//! rounding happens only when a total is emitted for display or payload.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::value_objects::round_display;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateKind {
    #[default]
    Percentage,
    Fixed,
}

/// One entry in a location's ordered rate pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaxRate {
    pub name: String,
    pub rate: Decimal,
    pub kind: RateKind,
    pub compound: bool,
}

impl TaxRate {
    pub fn percentage(name: impl Into<String>, rate: Decimal, compound: bool) -> Self {
        Self { name: name.into(), rate, kind: RateKind::Percentage, compound }
    }

    pub fn fixed(name: impl Into<String>, rate: Decimal, compound: bool) -> Self {
        Self { name: name.into(), rate, kind: RateKind::Fixed, compound }
    }

    fn amount_against(&self, base: Decimal) -> Decimal {
        match self.kind {
            RateKind::Percentage => base * self.rate / Decimal::ONE_HUNDRED,
            RateKind::Fixed => self.rate,
        }
    }
}

/// One receipt/audit breakdown entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaxLine {
    pub name: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxSummary {
    pub total_tax: Decimal,
    /// Ordered: non-compound entries first, then compound, each in the
    /// location's original order.
    pub breakdown: Vec<TaxLine>,
}

impl TaxSummary {
    pub fn rounded_total(&self) -> Decimal {
        round_display(self.total_tax)
    }
}

/// Computes total tax and its ordered breakdown for `subtotal`.
///
/// An empty rate list yields zero tax. That is a deliberate fallback (the
/// rate lookup may be unavailable) and is logged, because it understates the
/// customer's charge.
pub fn compute_tax(subtotal: Decimal, rates: &[TaxRate]) -> TaxSummary {
    if rates.is_empty() {
        warn!(%subtotal, "no tax rates available; charging zero tax");
        return TaxSummary::default();
    }

    let mut total_tax = Decimal::ZERO;
    let mut breakdown = Vec::with_capacity(rates.len());

    for rate in rates.iter().filter(|r| !r.compound) {
        let amount = rate.amount_against(subtotal);
        total_tax += amount;
        breakdown.push(TaxLine { name: rate.name.clone(), amount });
    }

    let compound_base = subtotal + total_tax;
    for rate in rates.iter().filter(|r| r.compound) {
        let amount = rate.amount_against(compound_base);
        total_tax += amount;
        breakdown.push(TaxLine { name: rate.name.clone(), amount });
    }

    TaxSummary { total_tax, breakdown }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_compound_ordering() {
        let rates = vec![
            TaxRate::percentage("State", dec("10"), false),
            TaxRate::percentage("City", dec("5"), true),
        ];
        let summary = compute_tax(dec("100.00"), &rates);
        assert_eq!(summary.breakdown[0].amount, dec("10.00"));
        // compound base = 110.00
        assert_eq!(summary.breakdown[1].amount, dec("5.50"));
        assert_eq!(summary.total_tax, dec("15.50"));
    }

    #[test]
    fn test_breakdown_sums_to_total() {
        let rates = vec![
            TaxRate::percentage("A", dec("8.25"), false),
            TaxRate::fixed("Bag fee", dec("0.10"), false),
            TaxRate::percentage("B", dec("2.5"), true),
        ];
        let summary = compute_tax(dec("42.37"), &rates);
        let sum: Decimal = summary.breakdown.iter().map(|l| l.amount).sum();
        assert_eq!(sum, summary.total_tax);
    }

    #[test]
    fn test_monotonic_in_subtotal() {
        let rates = vec![
            TaxRate::percentage("A", dec("7"), false),
            TaxRate::percentage("B", dec("3"), true),
        ];
        let mut last = Decimal::MIN;
        for subtotal in ["0", "9.99", "10.00", "55.55", "1000"] {
            let total = compute_tax(dec(subtotal), &rates).total_tax;
            assert!(total >= last);
            last = total;
        }
    }

    #[test]
    fn test_fixed_rate_ignores_subtotal() {
        let rates = vec![TaxRate::fixed("Fee", dec("1.50"), false)];
        assert_eq!(compute_tax(dec("10"), &rates).total_tax, dec("1.50"));
        assert_eq!(compute_tax(dec("9999"), &rates).total_tax, dec("1.50"));
    }

    #[test]
    fn test_empty_rates_yield_zero() {
        let summary = compute_tax(dec("70.00"), &[]);
        assert_eq!(summary.total_tax, Decimal::ZERO);
        assert!(summary.breakdown.is_empty());
    }

    #[test]
    fn test_no_intermediate_rounding() {
        // 8.25% of 70.00 = 5.7750; kept at full precision, rounds to 5.78.
        let rates = vec![TaxRate::percentage("Sales", dec("8.25"), false)];
        let summary = compute_tax(dec("70.00"), &rates);
        assert_eq!(summary.total_tax, dec("5.7750"));
        assert_eq!(summary.rounded_total(), dec("5.78"));
    }

    #[test]
    fn test_non_compound_order_preserved_within_partition() {
        let rates = vec![
            TaxRate::percentage("Second", dec("1"), true),
            TaxRate::percentage("First", dec("2"), false),
            TaxRate::percentage("Third", dec("3"), true),
        ];
        let summary = compute_tax(dec("100"), &rates);
        let names: Vec<&str> = summary
            .breakdown
            .iter()
            .map(|l| l.name.as_str())
            .collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }
}
