//! Private order events feed
//!
//! Authenticated stream of order lifecycle records, grouped locally into
//! the fixed category buckets of [`OrderEventBook`]. The subscription can
//! be narrowed server-side with symbol/event-type/API-session filters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Map;
use tokio::sync::RwLock;
use tracing::warn;

use super::connection::{Connection, ConnectionHooks, ConnectionState, NoopHooks};
use crate::auth::Credential;
use crate::book::{OrderEvent, OrderEventBook, OrderEventKind};
use crate::config::Config;
use crate::decode::{decode_order_frame, OrderFeedFrame};
use crate::error::Result;

const ORDER_EVENTS_PATH: &str = "/v1/order/events";

/// Server-side subscription filters for the order events feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OrderEventFilters {
    pub symbols: Vec<String>,
    pub event_types: Vec<String>,
    pub api_sessions: Vec<String>,
}

impl OrderEventFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbols<I: IntoIterator<Item = S>, S: Into<String>>(mut self, symbols: I) -> Self {
        self.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    pub fn event_types<I: IntoIterator<Item = S>, S: Into<String>>(mut self, types: I) -> Self {
        self.event_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn api_sessions<I: IntoIterator<Item = S>, S: Into<String>>(mut self, sessions: I) -> Self {
        self.api_sessions = sessions.into_iter().map(Into::into).collect();
        self
    }

    /// Query string in the feed's repeated-parameter form, empty when no
    /// filter is set.
    pub fn query_string(&self) -> String {
        let mut params = Vec::new();
        for symbol in &self.symbols {
            params.push(format!("symbolFilter={symbol}"));
        }
        for event_type in &self.event_types {
            params.push(format!("eventTypeFilter={event_type}"));
        }
        for session in &self.api_sessions {
            params.push(format!("apiSessionFilter={session}"));
        }
        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }
}

/// Streaming client for `/v1/order/events`.
pub struct OrderEventsFeed {
    credential: Credential,
    book: Arc<RwLock<OrderEventBook>>,
    decode_failures: Arc<AtomicU64>,
    hooks: Arc<dyn ConnectionHooks>,
    conn: Connection,
}

impl OrderEventsFeed {
    /// An authenticated feed; requires credentials in the config.
    pub fn new(config: &Config, filters: OrderEventFilters) -> Result<Self> {
        Self::with_hooks(config, filters, Arc::new(NoopHooks))
    }

    pub fn with_hooks(
        config: &Config,
        filters: OrderEventFilters,
        hooks: Arc<dyn ConnectionHooks>,
    ) -> Result<Self> {
        let (api_key, api_secret) = config.credentials()?;
        Ok(Self::from_credential(
            Credential::new(api_key, api_secret),
            config,
            &filters,
            hooks,
        ))
    }

    pub(crate) fn from_credential(
        credential: Credential,
        config: &Config,
        filters: &OrderEventFilters,
        hooks: Arc<dyn ConnectionHooks>,
    ) -> Self {
        let url = format!(
            "{}{}{}",
            config.ws_endpoint,
            ORDER_EVENTS_PATH,
            filters.query_string()
        );
        Self {
            credential,
            book: Arc::new(RwLock::new(OrderEventBook::new())),
            decode_failures: Arc::new(AtomicU64::new(0)),
            hooks: hooks.clone(),
            conn: Connection::new(url, hooks),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.conn.state()
    }

    pub fn url(&self) -> &str {
        self.conn.url()
    }

    pub fn decode_failures(&self) -> u64 {
        self.decode_failures.load(Ordering::Relaxed)
    }

    /// Connect with signed upgrade headers and spawn the listen loop.
    /// The signature covers the request path, not the filter query.
    pub async fn start(&self) -> Result<()> {
        let signed = self.credential.sign_request(ORDER_EVENTS_PATH, Map::new());
        let book = self.book.clone();
        let failures = self.decode_failures.clone();
        let hooks = self.hooks.clone();

        self.conn
            .start(Some(signed), move |raw| {
                let book = book.clone();
                let failures = failures.clone();
                let hooks = hooks.clone();
                async move {
                    let frame = match decode_order_frame(&raw) {
                        Ok(frame) => frame,
                        Err(e) => {
                            failures.fetch_add(1, Ordering::Relaxed);
                            warn!(error = %e, "Failed to decode order events frame");
                            return;
                        }
                    };
                    let events = match frame {
                        OrderFeedFrame::Batch(events) => events,
                        OrderFeedFrame::Single(event) => vec![event],
                    };
                    let mut book = book.write().await;
                    for event in events {
                        if let Err(e) = book.route(event) {
                            // The category set is closed; report rather
                            // than silently drop.
                            failures.fetch_add(1, Ordering::Relaxed);
                            warn!(error = %e, "Unroutable order event");
                            hooks.on_error(&e);
                        }
                    }
                }
            })
            .await
    }

    /// Stop the listen loop and wait for it to exit.
    pub async fn close(&self) -> Result<()> {
        self.conn.close().await
    }

    /// Records recorded under one category, in arrival order.
    pub async fn events(&self, kind: OrderEventKind) -> Vec<OrderEvent> {
        self.book.read().await.events(kind).to_vec()
    }

    /// Total records across all categories.
    pub async fn len(&self) -> usize {
        self.book.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.book.read().await.is_empty()
    }

    /// Remove the most recent record with this order id from a category.
    pub async fn remove_order(&self, kind: OrderEventKind, order_id: &str) -> Result<()> {
        self.book.write().await.remove_order(kind, order_id)
    }

    /// Re-empty all ten buckets. Idempotent.
    pub async fn reset(&self) {
        self.book.write().await.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    fn config() -> Config {
        let mut config = Config::new(Environment::Production);
        config.api_key = Some("mykey".to_string());
        config.api_secret = Some("1234abcd".to_string());
        config
    }

    #[test]
    fn test_url_without_filters() {
        let feed = OrderEventsFeed::new(&config(), OrderEventFilters::new()).unwrap();
        assert_eq!(feed.url(), "wss://api.gemini.com/v1/order/events");
    }

    #[test]
    fn test_url_with_all_filters() {
        let filters = OrderEventFilters::new()
            .symbols(["btcusd", "ethusd"])
            .event_types(["accepted"])
            .api_sessions(["lVTsC8CfoxkbkHVBKjEu"]);
        let feed = OrderEventsFeed::new(&config(), filters).unwrap();
        assert_eq!(
            feed.url(),
            "wss://api.gemini.com/v1/order/events?\
             symbolFilter=btcusd&symbolFilter=ethusd&\
             eventTypeFilter=accepted&\
             apiSessionFilter=lVTsC8CfoxkbkHVBKjEu"
        );
    }

    #[test]
    fn test_requires_credentials() {
        let config = Config::new(Environment::Production);
        assert!(OrderEventsFeed::new(&config, OrderEventFilters::new()).is_err());
    }

    #[tokio::test]
    async fn test_buckets_empty_on_construction() {
        let feed = OrderEventsFeed::new(&config(), OrderEventFilters::new()).unwrap();
        assert!(feed.is_empty().await);
        for kind in OrderEventKind::ALL {
            assert!(feed.events(kind).await.is_empty());
        }
    }
}
