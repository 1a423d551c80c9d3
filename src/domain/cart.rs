//! Cart aggregate.
//!
//! Lines are keyed by (product id, selection signature); unit prices are
//! resolved at selection time and frozen — checkout never re-prices a line,
//! so the customer pays what they were shown.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::value_objects::{Money, Selection};

#[derive(Clone, Debug)]
pub struct CartLine {
    product_id: u64,
    variation_id: Option<u64>,
    name: String,
    selection_key: String,
    quantity: u32,
    unit_price: Money,
}

impl CartLine {
    pub fn new(
        product_id: u64,
        variation_id: Option<u64>,
        name: impl Into<String>,
        selection: &Selection,
        quantity: u32,
        unit_price: Money,
    ) -> Result<Self, CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        Ok(Self {
            product_id,
            variation_id,
            name: name.into(),
            selection_key: selection.signature(),
            quantity,
            unit_price,
        })
    }

    pub fn product_id(&self) -> u64 { self.product_id }
    pub fn variation_id(&self) -> Option<u64> { self.variation_id }
    pub fn name(&self) -> &str { &self.name }
    pub fn selection_key(&self) -> &str { &self.selection_key }
    pub fn quantity(&self) -> u32 { self.quantity }
    pub fn unit_price(&self) -> &Money { &self.unit_price }
    pub fn line_total(&self) -> Money { self.unit_price.multiply(self.quantity) }
}

#[derive(Clone, Debug)]
pub struct Cart {
    id: String,
    lines: Vec<CartLine>,
    subtotal: Money,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(currency: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            lines: vec![],
            subtotal: Money::zero(currency),
            currency: currency.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn subtotal(&self) -> &Money { &self.subtotal }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn line_count(&self) -> usize { self.lines.len() }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Adds a line, merging quantities when the same product + selection is
    /// already present. The existing line's frozen unit price wins.
    pub fn add_line(&mut self, line: CartLine) {
        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == line.product_id && l.selection_key == line.selection_key)
        {
            existing.quantity += line.quantity;
        } else {
            self.lines.push(line);
        }
        self.recalculate();
    }

    /// Quantity zero removes the line.
    pub fn update_quantity(
        &mut self,
        product_id: u64,
        selection_key: &str,
        quantity: u32,
    ) -> Result<(), CartError> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id && l.selection_key == selection_key)
            .ok_or(CartError::LineNotFound)?;
        if quantity == 0 {
            self.lines
                .retain(|l| !(l.product_id == product_id && l.selection_key == selection_key));
        } else {
            line.quantity = quantity;
        }
        self.recalculate();
        Ok(())
    }

    pub fn remove_line(&mut self, product_id: u64, selection_key: &str) -> Result<(), CartError> {
        let before = self.lines.len();
        self.lines
            .retain(|l| !(l.product_id == product_id && l.selection_key == selection_key));
        if self.lines.len() == before {
            return Err(CartError::LineNotFound);
        }
        self.recalculate();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.recalculate();
    }

    fn recalculate(&mut self) {
        self.subtotal = self
            .lines
            .iter()
            .fold(Money::zero(&self.currency), |acc, l| {
                acc.add(&l.line_total()).unwrap_or(acc)
            });
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone)]
pub enum CartError { LineNotFound, ZeroQuantity }
impl std::error::Error for CartError {}
impl std::fmt::Display for CartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LineNotFound => write!(f, "Cart line not found"),
            Self::ZeroQuantity => write!(f, "Quantity must be positive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: u64, selection: &Selection, qty: u32, cents: i64) -> CartLine {
        CartLine::new(product_id, None, "Widget", selection, qty, Money::usd(Decimal::new(cents, 2)))
            .unwrap()
    }

    #[test]
    fn test_add_merges_same_product_and_selection() {
        let sel = Selection::new().choose("weight", "1g");
        let mut cart = Cart::new("USD");
        cart.add_line(line(1, &sel, 2, 1000));
        cart.add_line(line(1, &sel, 1, 1000));
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.lines()[0].quantity(), 3);
        assert_eq!(cart.subtotal().amount(), Decimal::new(3000, 2));
    }

    #[test]
    fn test_different_selections_stay_separate() {
        let mut cart = Cart::new("USD");
        cart.add_line(line(1, &Selection::new().choose("weight", "1g"), 1, 1000));
        cart.add_line(line(1, &Selection::new().choose("weight", "3.5g"), 1, 2500));
        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn test_update_quantity_and_remove() {
        let sel = Selection::new();
        let mut cart = Cart::new("USD");
        cart.add_line(line(5, &sel, 2, 1500));
        let key = cart.lines()[0].selection_key().to_string();
        cart.update_quantity(5, &key, 4).unwrap();
        assert_eq!(cart.lines()[0].quantity(), 4);
        cart.update_quantity(5, &key, 0).unwrap();
        assert!(cart.is_empty());
        assert!(cart.remove_line(5, &key).is_err());
    }

    #[test]
    fn test_zero_quantity_line_rejected() {
        let sel = Selection::new();
        assert!(CartLine::new(1, None, "W", &sel, 0, Money::usd(Decimal::ONE)).is_err());
    }

    #[test]
    fn test_unit_price_frozen_on_merge() {
        let sel = Selection::new();
        let mut cart = Cart::new("USD");
        cart.add_line(line(1, &sel, 1, 1000));
        // Same line added later at a different (stale-catalog) price.
        cart.add_line(line(1, &sel, 1, 9900));
        assert_eq!(cart.lines()[0].unit_price().amount(), Decimal::new(1000, 2));
        assert_eq!(cart.subtotal().amount(), Decimal::new(2000, 2));
    }
}
