//! Construct-or-fetch registry for feed instances
//!
//! Feeds are deduplicated by their identifying constructor parameters so
//! two callers asking for the same (symbol, environment) share one
//! connection. Entries are held weakly; a feed with no remaining strong
//! references is reclaimed and a later request constructs a fresh one.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use super::connection::NoopHooks;
use super::market_data::MarketDataFeed;
use super::order_events::{OrderEventFilters, OrderEventsFeed};
use crate::auth::Credential;
use crate::config::{Config, Environment};
use crate::error::Result;

/// Weak-reference registry keyed by constructor arguments.
pub struct Registry<K, T> {
    entries: Mutex<HashMap<K, Weak<T>>>,
}

impl<K: Eq + Hash, T> Registry<K, T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch the live instance for `key`, or construct one and cache it.
    pub fn obtain_with(&self, key: K, construct: impl FnOnce() -> T) -> Arc<T> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, weak| weak.strong_count() > 0);

        if let Some(existing) = entries.get(&key).and_then(Weak::upgrade) {
            return existing;
        }
        let created = Arc::new(construct());
        entries.insert(key, Arc::downgrade(&created));
        created
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        entries
            .values()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Eq + Hash, T> Default for Registry<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of market data feeds keyed by (symbol, environment).
#[derive(Default)]
pub struct MarketDataRegistry {
    inner: Registry<(String, Environment), MarketDataFeed>,
}

impl MarketDataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn obtain(&self, symbol: &str, config: &Config) -> Arc<MarketDataFeed> {
        self.inner
            .obtain_with((symbol.to_string(), config.environment), || {
                MarketDataFeed::new(symbol, config)
            })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

/// Registry of order events feeds keyed by (api key, environment,
/// filter set).
#[derive(Default)]
pub struct OrderEventsRegistry {
    inner: Registry<(String, Environment, OrderEventFilters), OrderEventsFeed>,
}

impl OrderEventsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn obtain(
        &self,
        config: &Config,
        filters: OrderEventFilters,
    ) -> Result<Arc<OrderEventsFeed>> {
        let (api_key, api_secret) = config.credentials()?;
        let key = (api_key.clone(), config.environment, filters.clone());
        Ok(self.inner.obtain_with(key, || {
            OrderEventsFeed::from_credential(
                Credential::new(api_key, api_secret),
                config,
                &filters,
                Arc::new(NoopHooks),
            )
        }))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }
}
