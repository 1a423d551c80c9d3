//! Value objects shared across the checkout pipeline.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Money value object. Full-precision decimal internally; rounding happens
/// only at the display/payload boundary via [`Money::rounded`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: String,
}

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self {
        Self { amount, currency: currency.to_string() }
    }
    pub fn usd(amount: Decimal) -> Self { Self::new(amount, "USD") }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }

    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch);
        }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }

    pub fn multiply(&self, qty: u32) -> Money {
        Money::new(self.amount * Decimal::from(qty), &self.currency)
    }

    /// Two decimal places, half away from zero.
    pub fn rounded(&self) -> Money {
        Money::new(round_display(self.amount), &self.currency)
    }
}

impl Default for Money {
    fn default() -> Self { Self::zero("USD") }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", round_display(self.amount), self.currency)
    }
}

/// Rounds a monetary amount for display or payload emission.
pub fn round_display(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone)]
pub enum MoneyError { CurrencyMismatch }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency mismatch")
    }
}

/// Customer-selected attribute options, built up one facet at a time.
///
/// Replaces the stringly `flavor-X|pack-Y` concatenation with a structured,
/// ordered mapping; [`Selection::signature`] is the stable key used for cart
/// deduplication and variation lookup.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection(BTreeMap<String, String>);

impl Selection {
    pub fn new() -> Self { Self::default() }

    /// Builder-style facet choice.
    pub fn choose(mut self, attribute: impl Into<String>, option: impl Into<String>) -> Self {
        self.set(attribute, option);
        self
    }

    pub fn set(&mut self, attribute: impl Into<String>, option: impl Into<String>) {
        self.0.insert(attribute.into(), option.into());
    }

    pub fn get(&self, attribute: &str) -> Option<&str> {
        self.0.get(attribute).map(String::as_str)
    }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Stable, order-independent key: `attr=option` pairs joined by `|`.
    pub fn signature(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("|")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_add() {
        let a = Money::usd(Decimal::new(100, 0));
        let b = Money::usd(Decimal::new(50, 0));
        assert_eq!(a.add(&b).unwrap().amount(), Decimal::new(150, 0));
    }

    #[test]
    fn test_money_currency_mismatch() {
        let a = Money::usd(Decimal::ONE);
        let b = Money::new(Decimal::ONE, "CAD");
        assert!(a.add(&b).is_err());
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        // 5.775 -> 5.78, only at the display boundary
        let m = Money::usd(Decimal::new(57750, 4));
        assert_eq!(m.rounded().amount(), Decimal::new(578, 2));
        assert_eq!(m.amount(), Decimal::new(57750, 4));
    }

    #[test]
    fn test_selection_signature_is_insertion_order_independent() {
        let a = Selection::new().choose("weight", "3.5g").choose("flavor", "og");
        let b = Selection::new().choose("flavor", "og").choose("weight", "3.5g");
        assert_eq!(a.signature(), b.signature());
        assert_eq!(a.signature(), "flavor=og|weight=3.5g");
    }

    #[test]
    fn test_selection_lookup() {
        let s = Selection::new().choose("weight", "1g");
        assert_eq!(s.get("weight"), Some("1g"));
        assert_eq!(s.get("flavor"), None);
        assert_eq!(s.len(), 1);
    }
}
