//! Market book reconstruction from decoded frames
//!
//! Single mutation entry point for the market data feed: change events
//! flow into the depth book, trade events into the ledger. Frames with
//! `socket_sequence == 0` are the feed's initial snapshot-equivalent and
//! are skipped wholesale.

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::{DepthBook, TradeLedger, TradeRecord};
use crate::decode::{decode_book_event, BookEvent, MarketMessage};
use crate::error::Result;

/// Reconstructed market state for one symbol.
#[derive(Debug, Default)]
pub struct MarketBook {
    depth: DepthBook,
    ledger: TradeLedger,
}

/// Point-in-time copy of the per-side trade records.
#[derive(Debug, Clone)]
pub struct MarketBookSnapshot {
    pub bids: BTreeMap<Decimal, Vec<TradeRecord>>,
    pub asks: BTreeMap<Decimal, Vec<TradeRecord>>,
}

impl MarketBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one decoded frame. Returns the number of inner events that
    /// could not be decoded; the caller logs and counts them, the loop
    /// never stops for them.
    pub fn apply(&mut self, msg: &MarketMessage) -> usize {
        if msg.socket_sequence == 0 {
            return 0;
        }

        let mut undecodable = 0;
        for raw in &msg.events {
            match decode_book_event(raw) {
                Ok(BookEvent::Change {
                    price,
                    side,
                    remaining,
                    ..
                }) => {
                    self.depth.apply(side, price, remaining);
                }
                Ok(BookEvent::Trade {
                    price,
                    amount,
                    maker_side,
                    ..
                }) => {
                    self.ledger.record(TradeRecord {
                        event_id: msg.event_id,
                        timestamp: msg.timestamp.unwrap_or_default(),
                        price,
                        amount,
                        maker_side,
                    });
                }
                Err(_) => undecodable += 1,
            }
        }
        undecodable
    }

    pub fn best_bid(&self) -> Result<Decimal> {
        self.depth.best_bid()
    }

    pub fn best_ask(&self) -> Result<Decimal> {
        self.depth.best_ask()
    }

    pub fn depth(&self) -> &DepthBook {
        &self.depth
    }

    pub fn ledger(&self) -> &TradeLedger {
        &self.ledger
    }

    /// Snapshot pairing both record sides.
    pub fn market_book(&self) -> MarketBookSnapshot {
        MarketBookSnapshot {
            bids: self.ledger.bids().clone(),
            asks: self.ledger.asks().clone(),
        }
    }

    pub fn search_price(&self, price: Decimal) -> Vec<TradeRecord> {
        self.ledger.search_price(price)
    }

    pub fn add_to_bids(&mut self, price: Decimal, record: TradeRecord) -> Result<()> {
        self.ledger.add_to_bids(price, record)
    }

    pub fn add_to_asks(&mut self, price: Decimal, record: TradeRecord) -> Result<()> {
        self.ledger.add_to_asks(price, record)
    }

    pub fn remove_from_bids(&mut self, price: Decimal) -> Result<()> {
        self.ledger.remove_from_bids(price)
    }

    pub fn remove_from_asks(&mut self, price: Decimal) -> Result<()> {
        self.ledger.remove_from_asks(price)
    }

    /// Replace the depth book and both record sides with empty
    /// containers. The trade tape is append-only and survives. Idempotent.
    pub fn reset(&mut self) {
        self.depth.reset();
        self.ledger.reset_sides();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Side;
    use crate::decode::decode_market_message;
    use rust_decimal_macros::dec;

    fn change_frame(sequence: u64, side: &str, price: &str, remaining: &str) -> MarketMessage {
        decode_market_message(&format!(
            r#"{{"type": "update", "eventId": 2364280145, "socket_sequence": {sequence},
                "timestamp": 1512076260, "timestampms": 1512076260185,
                "events": [{{"type": "change", "price": "{price}", "side": "{side}",
                             "reason": "place", "remaining": "{remaining}", "delta": "{remaining}"}}]}}"#
        ))
        .unwrap()
    }

    fn trade_frame(sequence: u64, maker_side: &str) -> MarketMessage {
        decode_market_message(&format!(
            r#"{{"type": "update", "eventId": 2364281810, "socket_sequence": {sequence},
                "timestamp": 1512076268, "timestampms": 1512076268486,
                "events": [{{"type": "trade", "tid": 2364281810, "price": "9610.40",
                             "amount": "0.3865", "makerSide": "{maker_side}"}},
                           {{"type": "change", "price": "9610.40", "side": "{maker_side}",
                             "reason": "trade", "remaining": "1.7439", "delta": "-0.3865"}}]}}"#
        ))
        .unwrap()
    }

    #[test]
    fn test_bootstrap_frame_is_skipped() {
        let mut book = MarketBook::new();
        book.apply(&change_frame(0, "bid", "9594.37", "19.52"));
        assert!(book.depth().is_empty());
        assert!(book.ledger().is_empty());
    }

    #[test]
    fn test_change_updates_depth() {
        let mut book = MarketBook::new();
        book.apply(&change_frame(1, "bid", "9594.37", "19.52"));
        assert_eq!(book.best_bid().unwrap(), dec!(9594.37));

        // Last write wins, values are not summed
        book.apply(&change_frame(2, "bid", "9594.37", "7.25"));
        assert_eq!(
            book.depth().remaining(Side::Bid, dec!(9594.37)),
            Some(dec!(7.25))
        );

        book.apply(&change_frame(3, "bid", "9594.37", "0"));
        assert!(book.depth().is_empty());
    }

    #[test]
    fn test_trade_feeds_ledger_and_depth() {
        let mut book = MarketBook::new();
        book.apply(&trade_frame(884, "ask"));
        assert_eq!(book.ledger().len(), 1);
        assert_eq!(book.market_book().asks.len(), 1);
        assert!(book.market_book().bids.is_empty());
        // The paired change event keeps the depth in step
        assert_eq!(
            book.depth().remaining(Side::Ask, dec!(9610.40)),
            Some(dec!(1.7439))
        );

        // Same trade on the other maker side: independent entries
        book.apply(&trade_frame(885, "bid"));
        assert_eq!(book.ledger().len(), 2);
        assert_eq!(book.market_book().asks.len(), 1);
        assert_eq!(book.market_book().bids.len(), 1);
    }

    #[test]
    fn test_undecodable_events_are_counted_not_fatal() {
        let mut book = MarketBook::new();
        let msg = decode_market_message(
            r#"{"type": "update", "eventId": 7, "socket_sequence": 9,
                "events": [{"type": "auction_result", "result": "failure"},
                           {"type": "change", "price": "100", "side": "ask",
                            "remaining": "2"}]}"#,
        )
        .unwrap();
        assert_eq!(book.apply(&msg), 1);
        assert_eq!(book.best_ask().unwrap(), dec!(100));
    }

    #[test]
    fn test_reset_empties_queries() {
        let mut book = MarketBook::new();
        book.apply(&trade_frame(884, "ask"));
        book.apply(&change_frame(885, "bid", "9500", "3"));
        book.reset();

        let snapshot = book.market_book();
        assert!(snapshot.bids.is_empty());
        assert!(snapshot.asks.is_empty());
        assert!(book.depth().is_empty());
        assert!(book.best_bid().is_err());
        assert!(book.search_price(dec!(9610.40)).is_empty());
        book.reset();
        assert!(book.depth().is_empty());
    }
}
