//! Error types for the Gemini client

use rust_decimal::Decimal;
use thiserror::Error;

use crate::book::Side;

/// Gemini client errors
#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("WebSocket connection error: {0}")]
    WebSocketConnection(String),

    #[error("WebSocket message error: {0}")]
    WebSocketMessage(String),

    #[error("Failed to decode frame: {0}")]
    Decode(String),

    #[error("Unrecognized order event type: {0}")]
    UnknownEventType(String),

    #[error("REST API error: {0}")]
    RestApi(String),

    #[error("Connection already started")]
    AlreadyStarted,

    #[error("Connection is not running")]
    NotRunning,

    #[error("No resting orders on the {0} side")]
    EmptySide(Side),

    #[error("No order with price {0} found")]
    UnknownPrice(Decimal),

    #[error("No {kind} event with order_id {order_id}")]
    UnknownOrderId { kind: String, order_id: String },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for GeminiError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        GeminiError::WebSocketConnection(err.to_string())
    }
}

impl From<serde_json::Error> for GeminiError {
    fn from(err: serde_json::Error) -> Self {
        GeminiError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for GeminiError {
    fn from(err: reqwest::Error) -> Self {
        GeminiError::RestApi(err.to_string())
    }
}

impl From<std::io::Error> for GeminiError {
    fn from(err: std::io::Error) -> Self {
        GeminiError::Export(err.to_string())
    }
}

impl From<csv::Error> for GeminiError {
    fn from(err: csv::Error) -> Self {
        GeminiError::Export(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeminiError>;
