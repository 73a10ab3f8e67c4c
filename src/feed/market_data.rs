//! Public market data feed
//!
//! One connection per (symbol, environment) streaming the incremental
//! depth/trade feed into a locally reconstructed [`MarketBook`]. The
//! listen loop is the book's only writer; queries take the read lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{trace, warn};

use super::connection::{Connection, ConnectionHooks, ConnectionState, NoopHooks};
use crate::book::{Level, MarketBook, MarketBookSnapshot, TradeRecord};
use crate::config::Config;
use crate::decode::decode_market_message;
use crate::error::Result;

/// Streaming client for `/v1/marketdata/{symbol}`.
pub struct MarketDataFeed {
    symbol: String,
    book: Arc<RwLock<MarketBook>>,
    decode_failures: Arc<AtomicU64>,
    conn: Connection,
}

impl MarketDataFeed {
    /// A feed for one trading pair, e.g. `btcusd`.
    pub fn new(symbol: &str, config: &Config) -> Self {
        Self::with_hooks(symbol, config, Arc::new(NoopHooks))
    }

    /// A feed with caller-supplied lifecycle hooks.
    pub fn with_hooks(symbol: &str, config: &Config, hooks: Arc<dyn ConnectionHooks>) -> Self {
        let url = format!("{}/v1/marketdata/{}", config.ws_endpoint, symbol);
        Self {
            symbol: symbol.to_string(),
            book: Arc::new(RwLock::new(MarketBook::new())),
            decode_failures: Arc::new(AtomicU64::new(0)),
            conn: Connection::new(url, hooks),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn state(&self) -> ConnectionState {
        self.conn.state()
    }

    /// Frames or inner events that failed to decode so far.
    pub fn decode_failures(&self) -> u64 {
        self.decode_failures.load(Ordering::Relaxed)
    }

    /// Connect and spawn the listen loop; returns without blocking on
    /// the connection. Transport errors surface through the hooks.
    pub async fn start(&self) -> Result<()> {
        let book = self.book.clone();
        let failures = self.decode_failures.clone();
        let symbol = self.symbol.clone();

        self.conn
            .start(None, move |raw| {
                let book = book.clone();
                let failures = failures.clone();
                let symbol = symbol.clone();
                async move {
                    match decode_market_message(&raw) {
                        Ok(msg) if msg.is_heartbeat() => {
                            trace!(symbol = %symbol, sequence = msg.socket_sequence, "Heartbeat");
                        }
                        Ok(msg) => {
                            let skipped = book.write().await.apply(&msg);
                            if skipped > 0 {
                                failures.fetch_add(skipped as u64, Ordering::Relaxed);
                                warn!(
                                    symbol = %symbol,
                                    skipped,
                                    sequence = msg.socket_sequence,
                                    "Skipped undecodable events in frame"
                                );
                            }
                        }
                        Err(e) => {
                            failures.fetch_add(1, Ordering::Relaxed);
                            warn!(symbol = %symbol, error = %e, "Failed to decode frame");
                        }
                    }
                }
            })
            .await
    }

    /// Stop the listen loop and wait for it to exit. After this returns
    /// no further callbacks fire and the feed is terminally closed.
    pub async fn close(&self) -> Result<()> {
        self.conn.close().await
    }

    /// Highest resting bid price.
    pub async fn best_bid(&self) -> Result<Decimal> {
        self.book.read().await.best_bid()
    }

    /// Lowest resting ask price.
    pub async fn best_ask(&self) -> Result<Decimal> {
        self.book.read().await.best_ask()
    }

    /// Depth levels, bids highest-first and asks lowest-first.
    pub async fn depth(&self) -> (Vec<Level>, Vec<Level>) {
        let book = self.book.read().await;
        (book.depth().bids(), book.depth().asks())
    }

    /// Snapshot of both record sides.
    pub async fn market_book(&self) -> MarketBookSnapshot {
        self.book.read().await.market_book()
    }

    /// The trade tape so far, in arrival order.
    pub async fn trades(&self) -> Vec<TradeRecord> {
        self.book.read().await.ledger().trades().to_vec()
    }

    pub async fn search_price(&self, price: Decimal) -> Vec<TradeRecord> {
        self.book.read().await.search_price(price)
    }

    pub async fn add_to_bids(&self, price: Decimal, record: TradeRecord) -> Result<()> {
        self.book.write().await.add_to_bids(price, record)
    }

    pub async fn add_to_asks(&self, price: Decimal, record: TradeRecord) -> Result<()> {
        self.book.write().await.add_to_asks(price, record)
    }

    pub async fn remove_from_bids(&self, price: Decimal) -> Result<()> {
        self.book.write().await.remove_from_bids(price)
    }

    pub async fn remove_from_asks(&self, price: Decimal) -> Result<()> {
        self.book.write().await.remove_from_asks(price)
    }

    /// Reset the reconstructed book to empty. Idempotent.
    pub async fn reset(&self) {
        self.book.write().await.reset();
    }
}
