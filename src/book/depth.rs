//! Depth book: price level → remaining quantity per side
//!
//! Uses BTreeMap keyed on `Decimal` so wire values like "9610.40" keep
//! their exact decimal identity and levels stay price-ordered.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::{Level, Side};
use crate::error::{GeminiError, Result};

/// Price-level depth for one symbol.
///
/// A price exists in a side iff its remaining quantity is strictly
/// positive; a level reaching zero is removed, never kept at zero.
#[derive(Debug, Default)]
pub struct DepthBook {
    bids: BTreeMap<Decimal, Decimal>,
    asks: BTreeMap<Decimal, Decimal>,
}

impl DepthBook {
    /// Create a new empty depth book
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one change: zero remaining removes the level (no-op when
    /// absent), anything else overwrites the prior value at that price.
    pub fn apply(&mut self, side: Side, price: Decimal, remaining: Decimal) {
        let levels = match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        if remaining.is_zero() {
            levels.remove(&price);
        } else {
            levels.insert(price, remaining);
        }
    }

    /// Highest resting bid price.
    pub fn best_bid(&self) -> Result<Decimal> {
        self.bids
            .last_key_value()
            .map(|(p, _)| *p)
            .ok_or(GeminiError::EmptySide(Side::Bid))
    }

    /// Lowest resting ask price.
    pub fn best_ask(&self) -> Result<Decimal> {
        self.asks
            .first_key_value()
            .map(|(p, _)| *p)
            .ok_or(GeminiError::EmptySide(Side::Ask))
    }

    /// Remaining quantity at a price, if the level exists.
    pub fn remaining(&self, side: Side, price: Decimal) -> Option<Decimal> {
        match side {
            Side::Bid => self.bids.get(&price).copied(),
            Side::Ask => self.asks.get(&price).copied(),
        }
    }

    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Bids as levels, highest price first.
    pub fn bids(&self) -> Vec<Level> {
        self.bids
            .iter()
            .rev()
            .map(|(p, q)| Level {
                price: *p,
                remaining: *q,
            })
            .collect()
    }

    /// Asks as levels, lowest price first.
    pub fn asks(&self) -> Vec<Level> {
        self.asks
            .iter()
            .map(|(p, q)| Level {
                price: *p,
                remaining: *q,
            })
            .collect()
    }

    /// Replace both sides with empty containers. Idempotent.
    pub fn reset(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_upsert_overwrites() {
        let mut book = DepthBook::new();
        book.apply(Side::Ask, dec!(9610.40), dec!(1.7439));
        book.apply(Side::Ask, dec!(9610.40), dec!(0.5));
        assert_eq!(book.remaining(Side::Ask, dec!(9610.40)), Some(dec!(0.5)));
        assert_eq!(book.ask_levels(), 1);
    }

    #[test]
    fn test_zero_remaining_removes() {
        let mut book = DepthBook::new();
        book.apply(Side::Bid, dec!(9594.37), dec!(19.5));
        book.apply(Side::Bid, dec!(9594.37), dec!(0));
        assert_eq!(book.bid_levels(), 0);
        // Removing an absent level is idempotent
        book.apply(Side::Bid, dec!(9594.37), dec!(0));
        assert_eq!(book.bid_levels(), 0);
    }

    #[test]
    fn test_best_bid_ask() {
        let mut book = DepthBook::new();
        book.apply(Side::Bid, dec!(9500), dec!(1));
        book.apply(Side::Bid, dec!(9510), dec!(2));
        book.apply(Side::Ask, dec!(9520), dec!(1));
        book.apply(Side::Ask, dec!(9515), dec!(3));
        assert_eq!(book.best_bid().unwrap(), dec!(9510));
        assert_eq!(book.best_ask().unwrap(), dec!(9515));
    }

    #[test]
    fn test_best_price_on_empty_side_errors() {
        let book = DepthBook::new();
        assert!(matches!(
            book.best_bid(),
            Err(GeminiError::EmptySide(Side::Bid))
        ));
        assert!(matches!(
            book.best_ask(),
            Err(GeminiError::EmptySide(Side::Ask))
        ));
    }

    #[test]
    fn test_sides_are_independent() {
        let mut book = DepthBook::new();
        book.apply(Side::Bid, dec!(9610.40), dec!(1));
        book.apply(Side::Ask, dec!(9610.40), dec!(2));
        assert_eq!(book.remaining(Side::Bid, dec!(9610.40)), Some(dec!(1)));
        assert_eq!(book.remaining(Side::Ask, dec!(9610.40)), Some(dec!(2)));
    }

    #[test]
    fn test_reset() {
        let mut book = DepthBook::new();
        book.apply(Side::Bid, dec!(9500), dec!(1));
        book.reset();
        assert!(book.is_empty());
        book.reset();
        assert!(book.is_empty());
    }

    #[test]
    fn test_level_ordering() {
        let mut book = DepthBook::new();
        book.apply(Side::Bid, dec!(9500), dec!(1));
        book.apply(Side::Bid, dec!(9510), dec!(1));
        book.apply(Side::Ask, dec!(9520), dec!(1));
        book.apply(Side::Ask, dec!(9530), dec!(1));
        let bids = book.bids();
        let asks = book.asks();
        assert_eq!(bids[0].price, dec!(9510));
        assert_eq!(asks[0].price, dec!(9520));
    }
}
