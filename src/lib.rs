//! Gemini exchange client
//!
//! This crate wraps Gemini's public and private REST endpoints and its
//! two streaming feeds. The market data feed reconstructs a local depth
//! book and trade ledger from sequence-numbered delta events; the order
//! events feed groups order lifecycle records into fixed category
//! buckets. Each feed owns one persistent connection with a spawned
//! listen loop as the sole writer of its book.

pub mod auth;
pub mod book;
pub mod config;
pub mod decode;
pub mod error;
pub mod export;
pub mod feed;
pub mod rest;

pub use auth::{Credential, SignedRequest};
pub use book::{
    DepthBook, Level, MarketBook, MarketBookSnapshot, OrderEvent, OrderEventBook, OrderEventKind,
    Side, TradeLedger, TradeRecord,
};
pub use config::{Config, Environment};
pub use error::{GeminiError, Result};
pub use feed::{
    ConnectionHooks, ConnectionState, MarketDataFeed, MarketDataRegistry, NoopHooks,
    OrderEventFilters, OrderEventsFeed, OrderEventsRegistry,
};
pub use rest::{PrivateClient, PublicClient};
