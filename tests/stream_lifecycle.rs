//! End-to-end feed tests against an in-process WebSocket server

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use rust_decimal_macros::dec;
use tokio::net::TcpListener;
use tokio::time::sleep;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::protocol::Message;

use gemini_client::{
    Config, ConnectionHooks, ConnectionState, Environment, GeminiError, MarketDataFeed,
    OrderEventFilters, OrderEventKind, OrderEventsFeed, Side,
};

const BOOTSTRAP_FRAME: &str = r#"{"type": "update", "eventId": 2364280145,
    "socket_sequence": 0,
    "events": [{"type": "change", "price": "9594.37", "side": "bid",
                "reason": "initial", "remaining": "19.52358571"}]}"#;

const TRADE_FRAME: &str = r#"{"type": "update", "eventId": 2364281810,
    "socket_sequence": 884, "timestamp": 1512076268, "timestampms": 1512076268486,
    "events": [{"type": "trade", "tid": 2364281810, "price": "9610.40",
                "amount": "0.3865", "makerSide": "ask"},
               {"type": "change", "price": "9610.40", "side": "ask",
                "reason": "trade", "remaining": "1.7439", "delta": "-0.3865"}]}"#;

#[derive(Default)]
struct CountingHooks {
    opens: AtomicUsize,
    messages: AtomicUsize,
    errors: AtomicUsize,
    closes: AtomicUsize,
}

impl ConnectionHooks for CountingHooks {
    fn on_open(&self) {
        self.opens.fetch_add(1, Ordering::SeqCst);
    }

    fn on_message(&self, _raw: &str) {
        self.messages.fetch_add(1, Ordering::SeqCst);
    }

    fn on_error(&self, _err: &GeminiError) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }

    fn on_close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool, what: &str) {
    for _ in 0..250 {
        if condition() {
            return;
        }
        sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for {what}");
}

/// Serve one WebSocket connection that sends the given frames, then
/// stays open until the peer closes.
async fn serve_frames(listener: TcpListener, frames: Vec<String>) {
    let (stream, _) = listener.accept().await.expect("accept failed");
    let mut ws = accept_async(stream).await.expect("handshake failed");
    for frame in frames {
        ws.send(Message::Text(frame)).await.expect("send failed");
    }
    while let Some(message) = ws.next().await {
        match message {
            Ok(Message::Close(_)) | Err(_) => break,
            _ => {}
        }
    }
}

#[tokio::test]
async fn test_feed_reconstructs_book_and_close_joins() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_frames(
        listener,
        vec![BOOTSTRAP_FRAME.to_string(), TRADE_FRAME.to_string()],
    ));

    let hooks = Arc::new(CountingHooks::default());
    let config = Config::new(Environment::Sandbox).with_ws_endpoint(&format!("ws://{addr}"));
    let feed = MarketDataFeed::with_hooks("btcusd", &config, hooks.clone());

    feed.start().await.unwrap();
    wait_until(
        || hooks.messages.load(Ordering::SeqCst) >= 2,
        "both frames to arrive",
    )
    .await;

    // The bootstrap frame was skipped, the trade frame applied
    let trades = feed.trades().await;
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].price, dec!(9610.40));
    assert_eq!(trades[0].maker_side, Side::Ask);
    assert_eq!(feed.best_ask().await.unwrap(), dec!(9610.40));
    assert!(feed.best_bid().await.is_err());
    assert_eq!(feed.market_book().await.asks.len(), 1);
    assert_eq!(feed.decode_failures(), 0);

    // A started feed rejects a second start
    assert!(matches!(
        feed.start().await,
        Err(GeminiError::AlreadyStarted)
    ));

    feed.close().await.unwrap();
    assert_eq!(feed.state(), ConnectionState::Closed);
    assert_eq!(hooks.closes.load(Ordering::SeqCst), 1);

    // No callback fires after close() has returned
    let frozen = hooks.messages.load(Ordering::SeqCst);
    sleep(Duration::from_millis(150)).await;
    assert_eq!(hooks.messages.load(Ordering::SeqCst), frozen);
    assert_eq!(hooks.closes.load(Ordering::SeqCst), 1);

    server.await.unwrap();

    // Closed is terminal
    assert!(matches!(feed.close().await, Err(GeminiError::NotRunning)));
}

#[tokio::test]
async fn test_connect_failure_reports_through_error_hook() {
    // Bind then drop to get a port with no listener behind it
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let hooks = Arc::new(CountingHooks::default());
    let config = Config::new(Environment::Sandbox).with_ws_endpoint(&format!("ws://{addr}"));
    let feed = MarketDataFeed::with_hooks("btcusd", &config, hooks.clone());

    // start() itself succeeds; the failure arrives via the hooks
    feed.start().await.unwrap();
    wait_until(
        || feed.state() == ConnectionState::Closed,
        "connection to fail",
    )
    .await;

    assert_eq!(hooks.errors.load(Ordering::SeqCst), 1);
    assert_eq!(hooks.opens.load(Ordering::SeqCst), 0);
    // No disconnect to report: the connection was never established
    assert_eq!(hooks.closes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_order_events_feed_routes_over_the_wire() {
    let ack = r#"{"type": "subscription_ack", "accountId": 2117,
        "subscriptionId": "ws-order-events-2117-b01s1aqlv776oceke7t0",
        "symbolFilter": [], "apiSessionFilter": [], "eventTypeFilter": []}"#;
    let batch = r#"[{"type": "accepted", "order_id": "372456298",
        "event_id": "372456299", "symbol": "btcusd", "side": "buy",
        "order_type": "exchange limit", "timestamp": "1478203017",
        "timestampms": 1478203017455, "is_live": true, "price": "1059.54",
        "socket_sequence": 13}]"#;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_frames(
        listener,
        vec![ack.to_string(), batch.to_string()],
    ));

    let hooks = Arc::new(CountingHooks::default());
    let mut config = Config::new(Environment::Sandbox).with_ws_endpoint(&format!("ws://{addr}"));
    config.api_key = Some("mykey".to_string());
    config.api_secret = Some("1234abcd".to_string());
    let feed =
        OrderEventsFeed::with_hooks(&config, OrderEventFilters::new(), hooks.clone()).unwrap();

    feed.start().await.unwrap();
    wait_until(
        || hooks.messages.load(Ordering::SeqCst) >= 2,
        "both frames to arrive",
    )
    .await;

    assert_eq!(feed.events(OrderEventKind::SubscriptionAck).await.len(), 1);
    let accepted = feed.events(OrderEventKind::Accepted).await;
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].order_id.as_deref(), Some("372456298"));
    for kind in [
        OrderEventKind::Heartbeat,
        OrderEventKind::Booked,
        OrderEventKind::Fill,
        OrderEventKind::Cancelled,
    ] {
        assert!(feed.events(kind).await.is_empty());
    }

    feed.close().await.unwrap();
    assert_eq!(feed.state(), ConnectionState::Closed);
    assert_eq!(hooks.closes.load(Ordering::SeqCst), 1);
    server.await.unwrap();
}
