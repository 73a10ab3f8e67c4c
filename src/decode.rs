//! Decoder for inbound stream frames
//!
//! Classifies raw frames from the market data and order events feeds into
//! typed messages. Decode failures are surfaced as errors for the listen
//! loop to log and count, never to propagate.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

use crate::book::Side;
use crate::error::Result;

/// Market data frame wrapper.
///
/// Every frame carries `socket_sequence`; the `0`th frame is the feed's
/// initial snapshot-equivalent. `update` frames carry inner events,
/// heartbeats carry none.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketMessage {
    /// Frame type: "update" or "heartbeat"
    #[serde(rename = "type")]
    pub kind: String,

    /// Event id assigned by the exchange
    #[serde(rename = "eventId", default)]
    pub event_id: u64,

    /// Per-connection monotonic frame counter
    pub socket_sequence: u64,

    /// Frame timestamp in seconds (absent on the bootstrap frame)
    #[serde(default)]
    pub timestamp: Option<u64>,

    /// Frame timestamp in milliseconds
    #[serde(rename = "timestampms", default)]
    pub timestamp_ms: Option<u64>,

    /// Inner events, decoded individually via [`decode_book_event`]
    #[serde(default)]
    pub events: Vec<Value>,
}

impl MarketMessage {
    pub fn is_heartbeat(&self) -> bool {
        self.kind == "heartbeat"
    }
}

/// One event inside a market data frame.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum BookEvent {
    /// An executed trade
    #[serde(rename = "trade")]
    Trade {
        tid: u64,
        #[serde(deserialize_with = "decimal_from_str")]
        price: Decimal,
        #[serde(deserialize_with = "decimal_from_str")]
        amount: Decimal,
        #[serde(rename = "makerSide")]
        maker_side: Side,
    },

    /// A price-level change
    #[serde(rename = "change")]
    Change {
        #[serde(deserialize_with = "decimal_from_str")]
        price: Decimal,
        side: Side,
        #[serde(deserialize_with = "decimal_from_str")]
        remaining: Decimal,
        #[serde(default, deserialize_with = "opt_decimal_from_str")]
        delta: Option<Decimal>,
        #[serde(default)]
        reason: Option<String>,
    },
}

/// Parse a raw market data frame.
pub fn decode_market_message(raw: &str) -> Result<MarketMessage> {
    Ok(serde_json::from_str(raw)?)
}

/// Decode a single inner event. Events of a type outside the feed's
/// documented set (auction events, new additions) are decode errors.
pub fn decode_book_event(event: &Value) -> Result<BookEvent> {
    Ok(serde_json::from_value(event.clone())?)
}

/// One record from the order events feed.
///
/// The feed mixes three shapes under one roof: the subscription ack, the
/// five-second heartbeat, and order lifecycle records. Fields that do not
/// apply to a given shape are absent.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct OrderEvent {
    #[serde(rename = "type")]
    pub kind: String,

    // Order lifecycle fields
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub api_session: Option<String>,
    #[serde(default)]
    pub client_order_id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub behavior: Option<String>,
    #[serde(default)]
    pub order_type: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(rename = "timestampms", default)]
    pub timestamp_ms: Option<u64>,
    #[serde(default)]
    pub is_live: Option<bool>,
    #[serde(default)]
    pub is_cancelled: Option<bool>,
    #[serde(default)]
    pub is_hidden: Option<bool>,
    #[serde(default, deserialize_with = "opt_decimal_from_str")]
    pub avg_execution_price: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal_from_str")]
    pub executed_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal_from_str")]
    pub remaining_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal_from_str")]
    pub original_amount: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal_from_str")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "opt_decimal_from_str")]
    pub total_spend: Option<Decimal>,
    #[serde(default)]
    pub socket_sequence: Option<u64>,

    // Subscription ack fields
    #[serde(rename = "accountId", default)]
    pub account_id: Option<u64>,
    #[serde(rename = "subscriptionId", default)]
    pub subscription_id: Option<String>,
    #[serde(rename = "symbolFilter", default)]
    pub symbol_filter: Vec<String>,
    #[serde(rename = "apiSessionFilter", default)]
    pub api_session_filter: Vec<String>,
    #[serde(rename = "eventTypeFilter", default)]
    pub event_type_filter: Vec<String>,

    // Heartbeat fields
    #[serde(default)]
    pub sequence: Option<u64>,
    #[serde(default)]
    pub trace_id: Option<String>,
}

/// An order events frame: either a single ack/heartbeat object or a list
/// of lifecycle records.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OrderFeedFrame {
    Batch(Vec<OrderEvent>),
    Single(OrderEvent),
}

/// Parse a raw order events frame.
pub fn decode_order_frame(raw: &str) -> Result<OrderFeedFrame> {
    Ok(serde_json::from_str(raw)?)
}

/// Deserializer for Decimal from a wire string
pub(crate) fn decimal_from_str<'de, D>(deserializer: D) -> std::result::Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Decimal::from_str(&s).map_err(serde::de::Error::custom)
}

/// Deserializer for optional Decimal fields carried as wire strings
pub(crate) fn opt_decimal_from_str<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Deserialize::deserialize(deserializer)?;
    s.map(|s| Decimal::from_str(&s).map_err(serde::de::Error::custom))
        .transpose()
}
