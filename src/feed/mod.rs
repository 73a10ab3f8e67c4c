//! Streaming feeds: connection lifecycle, market data, order events

mod connection;
mod market_data;
mod order_events;
mod registry;

pub use connection::{ConnectionHooks, ConnectionState, NoopHooks};
pub use market_data::MarketDataFeed;
pub use order_events::{OrderEventFilters, OrderEventsFeed};
pub use registry::{MarketDataRegistry, OrderEventsRegistry, Registry};
