//! Follow BTC/USD trades where the maker was on the ask side, then stop
//! after one hundred trades and close the connection.

use std::time::Duration;

use anyhow::Result;
use gemini_client::{Config, MarketDataFeed, Side};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::load()?;
    let feed = MarketDataFeed::new("btcusd", &config);
    feed.start().await?;

    let mut seen = 0;
    while seen < 100 {
        let trades = feed.trades().await;
        for trade in &trades[seen..] {
            if trade.maker_side == Side::Ask {
                println!("{}  {} @ {}", trade.timestamp, trade.amount, trade.price);
            }
        }
        seen = trades.len();
        tokio::time::sleep(Duration::from_millis(250)).await;
    }

    feed.close().await?;
    Ok(())
}
