//! Local book state reconstructed from streaming events
//!
//! Holds the depth book (price level → remaining quantity), the trade
//! ledger, and the order-event buckets for the private feed.

mod depth;
mod market;
mod order_events;
mod trades;

pub use depth::DepthBook;
pub use market::{MarketBook, MarketBookSnapshot};
pub use order_events::{OrderEvent, OrderEventBook, OrderEventKind};
pub use trades::{TradeLedger, TradeRecord};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of the book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Bid,
    Ask,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => write!(f, "bid"),
            Side::Ask => write!(f, "ask"),
        }
    }
}

/// A single price level in the depth book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub price: Decimal,
    pub remaining: Decimal,
}
