//! Trade ledger and price-keyed trade records
//!
//! The ledger tape is append-only for the life of a connection. The
//! per-side record lists are the manual insertion/search surface: records
//! at the same price accumulate, they model repeated fills, not
//! remaining-quantity state.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::Side;
use crate::error::{GeminiError, Result};

/// One executed trade from the market data feed.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TradeRecord {
    pub event_id: u64,
    pub timestamp: u64,
    pub price: Decimal,
    pub amount: Decimal,
    pub maker_side: Side,
}

/// Ordered trade history plus per-side records keyed by price.
#[derive(Debug, Default)]
pub struct TradeLedger {
    trades: Vec<TradeRecord>,
    bids: BTreeMap<Decimal, Vec<TradeRecord>>,
    asks: BTreeMap<Decimal, Vec<TradeRecord>>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a decoded trade: appended to the tape and to the maker
    /// side's list at that price.
    pub fn record(&mut self, record: TradeRecord) {
        let levels = match record.maker_side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };
        levels
            .entry(record.price)
            .or_default()
            .push(record.clone());
        self.trades.push(record);
    }

    /// Manually insert a record into the bids, appending to any existing
    /// list at that price.
    pub fn add_to_bids(&mut self, price: Decimal, record: TradeRecord) -> Result<()> {
        Self::insert(&mut self.bids, price, record)
    }

    /// Manually insert a record into the asks, appending to any existing
    /// list at that price.
    pub fn add_to_asks(&mut self, price: Decimal, record: TradeRecord) -> Result<()> {
        Self::insert(&mut self.asks, price, record)
    }

    fn insert(
        levels: &mut BTreeMap<Decimal, Vec<TradeRecord>>,
        price: Decimal,
        record: TradeRecord,
    ) -> Result<()> {
        if record.price != price {
            return Err(GeminiError::InvalidRecord(format!(
                "record price {} does not match insertion price {}",
                record.price, price
            )));
        }
        levels.entry(price).or_default().push(record);
        Ok(())
    }

    /// Delete the whole entry at a price from the bids.
    pub fn remove_from_bids(&mut self, price: Decimal) -> Result<()> {
        self.bids
            .remove(&price)
            .map(|_| ())
            .ok_or(GeminiError::UnknownPrice(price))
    }

    /// Delete the whole entry at a price from the asks.
    pub fn remove_from_asks(&mut self, price: Decimal) -> Result<()> {
        self.asks
            .remove(&price)
            .map(|_| ())
            .ok_or(GeminiError::UnknownPrice(price))
    }

    /// All records at a price from whichever side(s) contain it, asks
    /// first. A price on neither side yields an empty list, not an error.
    pub fn search_price(&self, price: Decimal) -> Vec<TradeRecord> {
        let mut result = Vec::new();
        if let Some(records) = self.asks.get(&price) {
            result.extend(records.iter().cloned());
        }
        if let Some(records) = self.bids.get(&price) {
            result.extend(records.iter().cloned());
        }
        result
    }

    /// The append-only trade tape, in arrival order.
    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn bids(&self) -> &BTreeMap<Decimal, Vec<TradeRecord>> {
        &self.bids
    }

    pub fn asks(&self) -> &BTreeMap<Decimal, Vec<TradeRecord>> {
        &self.asks
    }

    /// Empty both record sides. The tape is append-only and survives.
    pub fn reset_sides(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }
}
