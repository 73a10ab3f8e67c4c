//! Private REST API client
//!
//! Order placement and account endpoints. Every call is a signed POST:
//! the payload is embedded in the headers, the body stays empty.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::auth::Credential;
use crate::config::Config;
use crate::decode::{decimal_from_str, opt_decimal_from_str};
use crate::error::Result;

/// Order state as returned by the order endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderStatus {
    pub order_id: String,
    #[serde(default)]
    pub id: Option<String>,
    pub symbol: String,
    pub exchange: String,
    #[serde(deserialize_with = "decimal_from_str")]
    pub avg_execution_price: Decimal,
    pub side: String,
    #[serde(rename = "type")]
    pub order_type: String,
    pub timestamp: String,
    #[serde(rename = "timestampms")]
    pub timestamp_ms: u64,
    pub is_live: bool,
    pub is_cancelled: bool,
    pub is_hidden: bool,
    #[serde(default)]
    pub was_forced: Option<bool>,
    #[serde(deserialize_with = "decimal_from_str")]
    pub executed_amount: Decimal,
    #[serde(deserialize_with = "decimal_from_str")]
    pub remaining_amount: Decimal,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(deserialize_with = "decimal_from_str")]
    pub price: Decimal,
    #[serde(deserialize_with = "decimal_from_str")]
    pub original_amount: Decimal,
}

/// One past fill on the account.
#[derive(Debug, Clone, Deserialize)]
pub struct MyTrade {
    #[serde(deserialize_with = "decimal_from_str")]
    pub price: Decimal,
    #[serde(deserialize_with = "decimal_from_str")]
    pub amount: Decimal,
    pub timestamp: u64,
    #[serde(rename = "timestampms")]
    pub timestamp_ms: u64,
    #[serde(rename = "type")]
    pub trade_type: String,
    #[serde(default)]
    pub aggressor: Option<bool>,
    #[serde(default)]
    pub fee_currency: Option<String>,
    #[serde(default, deserialize_with = "opt_decimal_from_str")]
    pub fee_amount: Option<Decimal>,
    pub tid: u64,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub is_auction_fill: Option<bool>,
}

/// One currency balance on the account.
#[derive(Debug, Clone, Deserialize)]
pub struct Balance {
    pub currency: String,
    #[serde(deserialize_with = "decimal_from_str")]
    pub amount: Decimal,
    #[serde(deserialize_with = "decimal_from_str")]
    pub available: Decimal,
    #[serde(
        rename = "availableForWithdrawal",
        deserialize_with = "decimal_from_str"
    )]
    pub available_for_withdrawal: Decimal,
    #[serde(rename = "type", default)]
    pub balance_type: Option<String>,
}

/// Client for the private REST endpoints.
pub struct PrivateClient {
    http: reqwest::Client,
    base_url: String,
    credential: Credential,
}

impl PrivateClient {
    /// Requires credentials in the config.
    pub fn new(config: &Config) -> Result<Self> {
        let (api_key, api_secret) = config.credentials()?;
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: config.rest_endpoint.clone(),
            credential: Credential::new(api_key, api_secret),
        })
    }

    /// Place a new exchange limit order.
    pub async fn new_order(
        &self,
        symbol: &str,
        amount: Decimal,
        price: Decimal,
        side: &str,
        options: &[&str],
    ) -> Result<OrderStatus> {
        let mut payload = Map::new();
        payload.insert("symbol".to_string(), Value::from(symbol));
        payload.insert("amount".to_string(), Value::from(amount.to_string()));
        payload.insert("price".to_string(), Value::from(price.to_string()));
        payload.insert("side".to_string(), Value::from(side));
        payload.insert(
            "options".to_string(),
            Value::from(options.iter().map(|o| Value::from(*o)).collect::<Vec<_>>()),
        );
        payload.insert("type".to_string(), Value::from("exchange limit"));
        self.post("/v1/order/new", payload).await
    }

    /// Cancel an order by id.
    pub async fn cancel_order(&self, order_id: &str) -> Result<OrderStatus> {
        let mut payload = Map::new();
        payload.insert("order_id".to_string(), Value::from(order_id));
        self.post("/v1/order/cancel", payload).await
    }

    /// Cancel all orders opened by this API session.
    pub async fn cancel_session_orders(&self) -> Result<Value> {
        self.post("/v1/order/cancel/session", Map::new()).await
    }

    /// Cancel all outstanding orders on the account.
    pub async fn cancel_all_orders(&self) -> Result<Value> {
        self.post("/v1/order/cancel/all", Map::new()).await
    }

    /// Status of a single order by id.
    pub async fn order_status(&self, order_id: &str) -> Result<OrderStatus> {
        let mut payload = Map::new();
        payload.insert("order_id".to_string(), Value::from(order_id));
        self.post("/v1/order/status", payload).await
    }

    /// All live orders on the account.
    pub async fn active_orders(&self) -> Result<Vec<OrderStatus>> {
        self.post("/v1/orders", Map::new()).await
    }

    /// Past fills for a symbol, newest first.
    pub async fn past_trades(&self, symbol: &str, limit_trades: Option<u32>) -> Result<Vec<MyTrade>> {
        let mut payload = Map::new();
        payload.insert("symbol".to_string(), Value::from(symbol));
        if let Some(limit) = limit_trades {
            payload.insert("limit_trades".to_string(), Value::from(limit));
        }
        self.post("/v1/mytrades", payload).await
    }

    /// 30-day trading volume data.
    pub async fn trade_volume(&self) -> Result<Value> {
        self.post("/v1/tradevolume", Map::new()).await
    }

    /// Available balances per currency.
    pub async fn balances(&self) -> Result<Vec<Balance>> {
        self.post("/v1/balances", Map::new()).await
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        request: &str,
        payload: Map<String, Value>,
    ) -> Result<T> {
        let signed = self.credential.sign_request(request, payload);
        let url = format!("{}{}", self.base_url, request);

        let mut builder = self
            .http
            .post(&url)
            .header("Content-Type", "text/plain")
            .header("Content-Length", "0")
            .header("Cache-Control", "no-cache");
        for (name, value) in signed.headers() {
            builder = builder.header(name, value);
        }

        let response = builder.send().await?.error_for_status()?;
        Ok(response.json::<T>().await?)
    }
}
