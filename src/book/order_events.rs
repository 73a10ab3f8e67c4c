//! Order event buckets for the private order events feed
//!
//! Every lifecycle category always has a bucket, empty or not; the
//! category set is closed, so routing an unrecognized type is a reported
//! error rather than a silent drop.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub use crate::decode::OrderEvent;
use crate::error::{GeminiError, Result};

/// The fixed set of order lifecycle categories on the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEventKind {
    SubscriptionAck,
    Heartbeat,
    Initial,
    Accepted,
    Rejected,
    Booked,
    Fill,
    Cancelled,
    CancelRejected,
    Closed,
}

impl OrderEventKind {
    pub const ALL: [OrderEventKind; 10] = [
        OrderEventKind::SubscriptionAck,
        OrderEventKind::Heartbeat,
        OrderEventKind::Initial,
        OrderEventKind::Accepted,
        OrderEventKind::Rejected,
        OrderEventKind::Booked,
        OrderEventKind::Fill,
        OrderEventKind::Cancelled,
        OrderEventKind::CancelRejected,
        OrderEventKind::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderEventKind::SubscriptionAck => "subscription_ack",
            OrderEventKind::Heartbeat => "heartbeat",
            OrderEventKind::Initial => "initial",
            OrderEventKind::Accepted => "accepted",
            OrderEventKind::Rejected => "rejected",
            OrderEventKind::Booked => "booked",
            OrderEventKind::Fill => "fill",
            OrderEventKind::Cancelled => "cancelled",
            OrderEventKind::CancelRejected => "cancel_rejected",
            OrderEventKind::Closed => "closed",
        }
    }
}

impl fmt::Display for OrderEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderEventKind {
    type Err = GeminiError;

    fn from_str(s: &str) -> Result<Self> {
        OrderEventKind::ALL
            .iter()
            .find(|kind| kind.as_str() == s)
            .copied()
            .ok_or_else(|| GeminiError::UnknownEventType(s.to_string()))
    }
}

/// Order events grouped by lifecycle category.
#[derive(Debug)]
pub struct OrderEventBook {
    buckets: BTreeMap<OrderEventKind, Vec<OrderEvent>>,
}

impl OrderEventBook {
    /// A book with all ten buckets present and empty.
    pub fn new() -> Self {
        let mut buckets = BTreeMap::new();
        for kind in OrderEventKind::ALL {
            buckets.insert(kind, Vec::new());
        }
        Self { buckets }
    }

    /// Route one inbound record into its category bucket. An
    /// unrecognized type is an error for the caller to report.
    pub fn route(&mut self, event: OrderEvent) -> Result<OrderEventKind> {
        let kind: OrderEventKind = event.kind.parse()?;
        self.bucket_mut(kind).push(event);
        Ok(kind)
    }

    /// The records recorded under a category, in arrival order.
    pub fn events(&self, kind: OrderEventKind) -> &[OrderEvent] {
        self.buckets
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn bucket_mut(&mut self, kind: OrderEventKind) -> &mut Vec<OrderEvent> {
        self.buckets.entry(kind).or_default()
    }

    /// Remove the most recent record in a category matching `order_id`.
    /// A missing id is a reported, non-fatal error.
    pub fn remove_order(&mut self, kind: OrderEventKind, order_id: &str) -> Result<()> {
        let bucket = self.bucket_mut(kind);
        let position = bucket
            .iter()
            .rposition(|event| event.order_id.as_deref() == Some(order_id));
        match position {
            Some(index) => {
                bucket.remove(index);
                Ok(())
            }
            None => Err(GeminiError::UnknownOrderId {
                kind: kind.to_string(),
                order_id: order_id.to_string(),
            }),
        }
    }

    /// Total records across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Re-empty all ten buckets. Idempotent.
    pub fn reset(&mut self) {
        for bucket in self.buckets.values_mut() {
            bucket.clear();
        }
    }
}

impl Default for OrderEventBook {
    fn default() -> Self {
        Self::new()
    }
}
