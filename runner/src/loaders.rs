//! Reference data loaders: instruments, calendar, cash flows, equity.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use log::info;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tradeops::{AllocatedEquity, CashFlow, EquityPoint, InstrumentMeta, InstrumentRegistry, TradingCalendar};

use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
struct InstrumentEntry {
    exchange: String,
    multiplier: Decimal,
    tick: Decimal,
    #[serde(default)]
    night_session: bool,
}

/// Parse an instrument registry from TOML text, one table per product.
pub fn parse_instruments(text: &str) -> Result<InstrumentRegistry> {
    let entries: BTreeMap<String, InstrumentEntry> = toml::from_str(text)?;
    let registry = InstrumentRegistry::new(entries.into_iter().map(|(product, e)| InstrumentMeta {
        product,
        exchange: e.exchange,
        multiplier: e.multiplier,
        tick: e.tick,
        night_session: e.night_session,
    }))?;
    Ok(registry)
}

pub fn load_instruments(path: &Path) -> Result<InstrumentRegistry> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let registry = parse_instruments(&text)?;
    info!("loaded {} instruments from {}", registry.len(), path.display());
    Ok(registry)
}

#[derive(Debug, Deserialize)]
struct CalendarRow {
    #[serde(with = "crate::dates::yyyymmdd")]
    trade_date: NaiveDate,
}

/// Load the trading calendar from a CSV with a `trade_date` column.
pub fn load_calendar(path: &Path) -> Result<TradingCalendar> {
    let rows: Vec<CalendarRow> = read_rows(path)?;
    let calendar = TradingCalendar::new(rows.into_iter().map(|r| r.trade_date));
    if calendar.is_empty() {
        return Err(Error::Config(format!(
            "calendar {} has no trading dates",
            path.display()
        )));
    }
    Ok(calendar)
}

#[derive(Debug, Deserialize)]
struct CashFlowRow {
    #[serde(with = "crate::dates::yyyymmdd")]
    trade_date: NaiveDate,
    cash_flow: Decimal,
}

pub fn load_cash_flows(path: &Path) -> Result<Vec<CashFlow>> {
    let rows: Vec<CashFlowRow> = read_rows(path)?;
    Ok(rows
        .into_iter()
        .map(|r| CashFlow {
            trade_date: r.trade_date,
            cash_flow: r.cash_flow,
        })
        .collect())
}

#[derive(Debug, Serialize, Deserialize)]
struct EquityRow {
    #[serde(with = "crate::dates::yyyymmdd")]
    trade_date: NaiveDate,
    cash_flow: Decimal,
    equity: Decimal,
}

pub fn save_equity_series(path: &Path, points: &[EquityPoint]) -> Result<()> {
    write_rows(
        path,
        points.iter().map(|p| EquityRow {
            trade_date: p.trade_date,
            cash_flow: p.cash_flow,
            equity: p.equity,
        }),
        &["trade_date", "cash_flow", "equity"],
    )
}

pub fn load_allocated_equity(path: &Path) -> Result<AllocatedEquity> {
    if !path.exists() {
        return Err(tradeops::Error::NotFound(path.display().to_string()).into());
    }
    let rows: Vec<EquityRow> = read_rows(path)?;
    Ok(AllocatedEquity::new(rows.into_iter().map(|r| EquityPoint {
        trade_date: r.trade_date,
        cash_flow: r.cash_flow,
        equity: r.equity,
    })))
}

/// Deserialize every row of a headed CSV file.
pub(crate) fn read_rows<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| Error::csv(path, e))?;
    reader
        .deserialize()
        .collect::<std::result::Result<Vec<T>, csv::Error>>()
        .map_err(|e| Error::csv(path, e))
}

/// Write rows to a CSV file, creating parent directories. The header is
/// written even when there are no rows.
pub(crate) fn write_rows<T: Serialize>(
    path: &Path,
    rows: impl IntoIterator<Item = T>,
    header: &[&str],
) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| Error::csv(path, e))?;
    writer
        .write_record(header)
        .map_err(|e| Error::csv(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| Error::csv(path, e))?;
    }
    writer.flush().map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}
