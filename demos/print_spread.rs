//! Stream market data for ETH/USD and print the spread once a second.

use std::time::Duration;

use anyhow::Result;
use gemini_client::{Config, MarketDataFeed};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load()?;
    let feed = MarketDataFeed::new("ethusd", &config);
    feed.start().await?;

    // The book needs a moment to populate past the bootstrap frame
    tokio::time::sleep(Duration::from_secs(5)).await;

    loop {
        match (feed.best_bid().await, feed.best_ask().await) {
            (Ok(bid), Ok(ask)) => println!("Spread: {}", ask - bid),
            _ => println!("Book not populated yet"),
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
