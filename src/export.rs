//! Export adapters for recorded state
//!
//! Flat CSV and hierarchical XML renderings of the trade ledger or one
//! order-event category. Field sets are fixed per format.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::book::{OrderEvent, OrderEventKind, TradeRecord};
use crate::error::{GeminiError, Result};

const TRADE_HEADERS: [&str; 5] = ["event_id", "timestamp", "price", "amount", "maker_side"];

const ORDER_EVENT_HEADERS: [&str; 14] = [
    "type",
    "order_id",
    "event_id",
    "api_session",
    "client_order_id",
    "symbol",
    "side",
    "order_type",
    "timestamp",
    "timestampms",
    "is_live",
    "is_cancelled",
    "avg_execution_price",
    "price",
];

/// Write the trade ledger as delimited text. An empty ledger still gets
/// its header row.
pub fn trades_to_csv<W: Write>(trades: &[TradeRecord], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(TRADE_HEADERS)?;
    for trade in trades {
        csv.write_record([
            trade.event_id.to_string(),
            trade.timestamp.to_string(),
            trade.price.to_string(),
            trade.amount.to_string(),
            trade.maker_side.to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Write the trade ledger as a tree of records.
pub fn trades_to_xml<W: Write>(trades: &[TradeRecord], mut writer: W) -> Result<()> {
    writeln!(writer, "<trades>")?;
    for trade in trades {
        writeln!(writer, "  <trade>")?;
        write_element(&mut writer, "event_id", &trade.event_id.to_string())?;
        write_element(&mut writer, "timestamp", &trade.timestamp.to_string())?;
        write_element(&mut writer, "price", &trade.price.to_string())?;
        write_element(&mut writer, "amount", &trade.amount.to_string())?;
        write_element(&mut writer, "maker_side", &trade.maker_side.to_string())?;
        writeln!(writer, "  </trade>")?;
    }
    writeln!(writer, "</trades>")?;
    Ok(())
}

/// Write one order-event category as delimited text. Exporting a
/// category with nothing recorded is an error, matching the feed's
/// closed category set.
pub fn order_events_to_csv<W: Write>(
    kind: OrderEventKind,
    events: &[OrderEvent],
    writer: W,
) -> Result<()> {
    if events.is_empty() {
        return Err(GeminiError::Export(format!(
            "no {kind} events recorded"
        )));
    }
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(ORDER_EVENT_HEADERS)?;
    for event in events {
        csv.write_record(order_event_fields(event))?;
    }
    csv.flush()?;
    Ok(())
}

/// Write one order-event category as a tree of records.
pub fn order_events_to_xml<W: Write>(
    kind: OrderEventKind,
    events: &[OrderEvent],
    mut writer: W,
) -> Result<()> {
    if events.is_empty() {
        return Err(GeminiError::Export(format!(
            "no {kind} events recorded"
        )));
    }
    writeln!(writer, "<{kind}_orders>")?;
    for event in events {
        writeln!(writer, "  <{kind}>")?;
        for (name, value) in ORDER_EVENT_HEADERS.iter().copied().zip(order_event_fields(event)) {
            write_element(&mut writer, name, &value)?;
        }
        writeln!(writer, "  </{kind}>")?;
    }
    writeln!(writer, "</{kind}_orders>")?;
    Ok(())
}

/// Write `gemini_market_data.csv` into a directory.
pub fn trades_to_csv_file(trades: &[TradeRecord], dir: &Path) -> Result<PathBuf> {
    let path = dir.join("gemini_market_data.csv");
    trades_to_csv(trades, File::create(&path)?)?;
    Ok(path)
}

/// Write `gemini_market_data.xml` into a directory.
pub fn trades_to_xml_file(trades: &[TradeRecord], dir: &Path) -> Result<PathBuf> {
    let path = dir.join("gemini_market_data.xml");
    trades_to_xml(trades, File::create(&path)?)?;
    Ok(path)
}

/// Write `gemini_order_events.csv` into a directory.
pub fn order_events_to_csv_file(
    kind: OrderEventKind,
    events: &[OrderEvent],
    dir: &Path,
) -> Result<PathBuf> {
    let path = dir.join("gemini_order_events.csv");
    order_events_to_csv(kind, events, File::create(&path)?)?;
    Ok(path)
}

/// Write `gemini_order_events.xml` into a directory.
pub fn order_events_to_xml_file(
    kind: OrderEventKind,
    events: &[OrderEvent],
    dir: &Path,
) -> Result<PathBuf> {
    let path = dir.join("gemini_order_events.xml");
    order_events_to_xml(kind, events, File::create(&path)?)?;
    Ok(path)
}

fn order_event_fields(event: &OrderEvent) -> Vec<String> {
    fn opt(value: &Option<String>) -> String {
        value.clone().unwrap_or_default()
    }
    fn opt_display<T: ToString>(value: &Option<T>) -> String {
        value.as_ref().map(T::to_string).unwrap_or_default()
    }

    vec![
        event.kind.clone(),
        opt(&event.order_id),
        opt(&event.event_id),
        opt(&event.api_session),
        opt(&event.client_order_id),
        opt(&event.symbol),
        opt(&event.side),
        opt(&event.order_type),
        opt(&event.timestamp),
        opt_display(&event.timestamp_ms),
        opt_display(&event.is_live),
        opt_display(&event.is_cancelled),
        opt_display(&event.avg_execution_price),
        opt_display(&event.price),
    ]
}

fn write_element<W: Write>(writer: &mut W, name: &str, value: &str) -> Result<()> {
    writeln!(writer, "    <{name}>{}</{name}>", xml_escape(value))?;
    Ok(())
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
