//! Benchmarks for book reconstruction

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gemini_client::decode::{decode_market_message, MarketMessage};
use gemini_client::MarketBook;

fn change_frame(sequence: u64, price: u64, remaining: &str) -> MarketMessage {
    decode_market_message(&format!(
        r#"{{"type": "update", "eventId": {sequence}, "socket_sequence": {sequence},
            "timestamp": 1512076260, "timestampms": 1512076260185,
            "events": [{{"type": "change", "price": "{price}.50", "side": "bid",
                         "reason": "place", "remaining": "{remaining}"}}]}}"#
    ))
    .expect("static frame decodes")
}

fn trade_frame(sequence: u64, price: u64) -> MarketMessage {
    decode_market_message(&format!(
        r#"{{"type": "update", "eventId": {sequence}, "socket_sequence": {sequence},
            "timestamp": 1512076268, "timestampms": 1512076268486,
            "events": [{{"type": "trade", "tid": {sequence}, "price": "{price}.40",
                         "amount": "0.3865", "makerSide": "ask"}},
                       {{"type": "change", "price": "{price}.40", "side": "ask",
                         "reason": "trade", "remaining": "1.7439", "delta": "-0.3865"}}]}}"#
    ))
    .expect("static frame decodes")
}

fn benchmark_apply_changes(c: &mut Criterion) {
    let frames: Vec<MarketMessage> = (1..=100)
        .map(|i| change_frame(i, 9500 + i, "1.5"))
        .collect();

    c.bench_function("apply_change_100_levels", |b| {
        b.iter(|| {
            let mut book = MarketBook::new();
            for frame in &frames {
                book.apply(black_box(frame));
            }
            book
        })
    });
}

fn benchmark_apply_trades(c: &mut Criterion) {
    let frames: Vec<MarketMessage> = (1..=100).map(|i| trade_frame(i, 9600 + i)).collect();

    c.bench_function("apply_trade_100_frames", |b| {
        b.iter(|| {
            let mut book = MarketBook::new();
            for frame in &frames {
                book.apply(black_box(frame));
            }
            book
        })
    });
}

fn benchmark_best_prices(c: &mut Criterion) {
    let mut book = MarketBook::new();
    for i in 1..=100 {
        book.apply(&change_frame(i, 9500 + i, "1.5"));
    }

    c.bench_function("best_bid_100_levels", |b| {
        b.iter(|| black_box(&book).best_bid())
    });
}

criterion_group!(
    benches,
    benchmark_apply_changes,
    benchmark_apply_trades,
    benchmark_best_prices
);
criterion_main!(benches);
