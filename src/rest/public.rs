//! Public REST API client

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::decode::decimal_from_str;
use crate::error::Result;

/// Recent trading activity for a symbol.
#[derive(Debug, Clone, Deserialize)]
pub struct Ticker {
    #[serde(deserialize_with = "decimal_from_str")]
    pub bid: Decimal,
    #[serde(deserialize_with = "decimal_from_str")]
    pub ask: Decimal,
    #[serde(deserialize_with = "decimal_from_str")]
    pub last: Decimal,
    /// Per-currency volume plus a timestamp; keys vary by symbol
    #[serde(default)]
    pub volume: Value,
}

/// One resting order in the REST book rendering.
#[derive(Debug, Clone, Deserialize)]
pub struct RestLevel {
    #[serde(deserialize_with = "decimal_from_str")]
    pub price: Decimal,
    #[serde(deserialize_with = "decimal_from_str")]
    pub amount: Decimal,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Current order book as two arrays.
#[derive(Debug, Clone, Deserialize)]
pub struct RestOrderBook {
    pub bids: Vec<RestLevel>,
    pub asks: Vec<RestLevel>,
}

/// One historical trade.
#[derive(Debug, Clone, Deserialize)]
pub struct PastTrade {
    pub timestamp: u64,
    #[serde(rename = "timestampms")]
    pub timestamp_ms: u64,
    pub tid: u64,
    #[serde(deserialize_with = "decimal_from_str")]
    pub price: Decimal,
    #[serde(deserialize_with = "decimal_from_str")]
    pub amount: Decimal,
    pub exchange: String,
    /// "buy" or "sell" from the taker's perspective
    #[serde(rename = "type")]
    pub trade_type: String,
}

/// Client for the public REST endpoints.
pub struct PublicClient {
    http: reqwest::Client,
    base_url: String,
}

impl PublicClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.rest_endpoint.clone(),
        }
    }

    /// All symbols available for trading.
    pub async fn symbols(&self) -> Result<Vec<String>> {
        self.get("/v1/symbols").await
    }

    /// Latest bid/ask/last and volume for a symbol.
    pub async fn ticker(&self, symbol: &str) -> Result<Ticker> {
        self.get(&format!("/v1/pubticker/{symbol}")).await
    }

    /// The current order book as two arrays of resting orders.
    pub async fn current_order_book(&self, symbol: &str) -> Result<RestOrderBook> {
        self.get(&format!("/v1/book/{symbol}")).await
    }

    /// Executed trades, optionally since an epoch timestamp
    /// (seconds or milliseconds). At most 500 records.
    pub async fn trade_history(&self, symbol: &str, since: Option<u64>) -> Result<Vec<PastTrade>> {
        let path = match since {
            Some(since) => format!("/v1/trades/{symbol}?since={since}"),
            None => format!("/v1/trades/{symbol}"),
        };
        self.get(&path).await
    }

    /// Auction events, optionally since an epoch timestamp. Without
    /// `since` this is the current auction state object; with it, a list
    /// of past events.
    pub async fn auction_history(&self, symbol: &str, since: Option<u64>) -> Result<Value> {
        let path = match since {
            Some(since) => format!("/v1/auction/{symbol}?since={since}"),
            None => format!("/v1/auction/{symbol}"),
        };
        self.get(&path).await
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).send().await?.error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}
