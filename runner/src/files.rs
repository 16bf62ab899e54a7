//! File-backed collaborators.
//!
//! Every artefact lives under `<data_dir>/<kind>/YYYY/MM/` as CSV:
//!
//! | kind       | file                                                   |
//! |------------|--------------------------------------------------------|
//! | signals    | `signals_sig-date_{date}_{sess}.csv`                   |
//! | positions  | `positions_sig-date_{date}_{sess}.csv`                 |
//! | positions  | `positions-actual_exe-date_{date}_{sess}.csv`          |
//! | trades     | `trades_sig-date_{date}_{sess}.csv`                    |
//! | quotes     | `quotes_{realtime,settle}_{date}.csv`                  |
//! | orders     | `orders_sig-date_{sig}_exe-date_{exe}_{sess}-{apm}.csv` |

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use log::{info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tradeops::{
    Direction, InstrumentRegistry, Offset, OrderBatch, OrderRecord, OrderSink, Position,
    PositionBook, PositionKey, PositionStore, PriceBounds, QuoteBook, QuoteRequest, QuoteSource,
    SessionType, SignalRow, SignalSource, Trade, TradeStore,
};

use crate::dates::format_date;
use crate::error::{Error, Result};
use crate::loaders::{read_rows, write_rows};

/// Directory of `kind` artefacts for `date`.
pub fn dated_dir(root: &Path, kind: &str, date: NaiveDate) -> PathBuf {
    root.join(kind)
        .join(format!("{:04}", date.year()))
        .join(format!("{:02}", date.month()))
}

pub fn signals_path(root: &Path, date: NaiveDate, session: SessionType) -> PathBuf {
    dated_dir(root, "signals", date).join(format!(
        "signals_sig-date_{}_{session}.csv",
        format_date(date)
    ))
}

pub fn positions_path(root: &Path, date: NaiveDate, session: SessionType) -> PathBuf {
    dated_dir(root, "positions", date).join(format!(
        "positions_sig-date_{}_{session}.csv",
        format_date(date)
    ))
}

pub fn actual_positions_path(root: &Path, date: NaiveDate, session: SessionType) -> PathBuf {
    dated_dir(root, "positions", date).join(format!(
        "positions-actual_exe-date_{}_{session}.csv",
        format_date(date)
    ))
}

pub fn trades_path(root: &Path, date: NaiveDate, session: SessionType) -> PathBuf {
    dated_dir(root, "trades", date).join(format!(
        "trades_sig-date_{}_{session}.csv",
        format_date(date)
    ))
}

pub fn quotes_path(root: &Path, mode: &str, date: NaiveDate) -> PathBuf {
    dated_dir(root, "quotes", date).join(format!("quotes_{mode}_{}.csv", format_date(date)))
}

pub fn orders_file_name(batch: &OrderBatch) -> String {
    format!(
        "orders_sig-date_{}_exe-date_{}_{}.csv",
        format_date(batch.signal_date),
        format_date(batch.execution_date),
        batch.window
    )
}

pub fn orders_path(root: &Path, batch: &OrderBatch) -> PathBuf {
    dated_dir(root, "orders", batch.signal_date).join(orders_file_name(batch))
}

// ============================================================================
// Row layouts
// ============================================================================

#[derive(Debug, Deserialize)]
struct SignalCsvRow {
    contract: String,
    weight: Decimal,
    close: Decimal,
}

#[derive(Debug, Serialize, Deserialize)]
struct PositionCsvRow {
    contract: String,
    direction: String,
    quantity: u64,
    reference_price: Option<Decimal>,
}

const POSITION_HEADER: [&str; 4] = ["contract", "direction", "quantity", "reference_price"];

impl PositionCsvRow {
    fn into_position(self) -> Result<Position> {
        let direction: Direction = self.direction.parse()?;
        Ok(Position::new(
            PositionKey::new(self.contract, direction),
            self.quantity,
            self.reference_price,
        ))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TradeCsvRow {
    contract: String,
    direction: String,
    offset: String,
    quantity: u64,
    reference_price: Option<Decimal>,
    order_price: Option<Decimal>,
}

const TRADE_HEADER: [&str; 6] = [
    "contract",
    "direction",
    "offset",
    "quantity",
    "reference_price",
    "order_price",
];

impl TradeCsvRow {
    fn into_trade(self) -> Result<Trade> {
        let direction: Direction = self.direction.parse()?;
        let offset: Offset = self.offset.parse()?;
        let mut trade = Trade::new(
            PositionKey::new(self.contract, direction),
            offset,
            self.quantity,
            self.reference_price,
        );
        trade.order_price = self.order_price;
        Ok(trade)
    }
}

#[derive(Debug, Deserialize)]
struct RealtimeQuoteRow {
    contract: String,
    last: Decimal,
    upper_limit: Decimal,
    lower_limit: Decimal,
}

#[derive(Debug, Deserialize)]
struct SettleQuoteRow {
    contract: String,
    settle: Decimal,
    change_limit_pct: Decimal,
}

fn read_book(path: &Path) -> Result<Option<PositionBook>> {
    if !path.exists() {
        return Ok(None);
    }
    let rows: Vec<PositionCsvRow> = read_rows(path)?;
    let mut book = PositionBook::new();
    for row in rows {
        let position = row.into_position()?;
        if book.contains(&position.key) {
            return Err(tradeops::Error::DuplicatePosition(format!(
                "{} in {}",
                position.key,
                path.display()
            ))
            .into());
        }
        book.insert(position);
    }
    Ok(Some(book))
}

// ============================================================================
// Storage
// ============================================================================

/// Signals, positions, trades and orders under one data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    outbox: Option<PathBuf>,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            outbox: None,
        }
    }

    /// Enable dispatch into `outbox`.
    pub fn with_outbox(mut self, outbox: impl Into<PathBuf>) -> Self {
        self.outbox = Some(outbox.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_signals(&self, date: NaiveDate, session: SessionType) -> Result<Vec<SignalRow>> {
        let path = signals_path(&self.root, date, session);
        if !path.exists() {
            return Err(tradeops::Error::NotFound(path.display().to_string()).into());
        }
        let rows: Vec<SignalCsvRow> = read_rows(&path)?;
        Ok(rows
            .into_iter()
            .map(|r| SignalRow::new(r.contract, r.weight, r.close))
            .collect())
    }

    fn write_positions(&self, path: &Path, book: &PositionBook) -> Result<()> {
        write_rows(
            path,
            book.sorted().into_iter().map(|p| PositionCsvRow {
                contract: p.key.contract.clone(),
                direction: p.key.direction.to_string(),
                quantity: p.quantity,
                reference_price: p.reference_price,
            }),
            &POSITION_HEADER,
        )?;
        info!("positions saved to {}", path.display());
        Ok(())
    }

    fn write_trades(&self, path: &Path, trades: &[Trade]) -> Result<()> {
        write_rows(
            path,
            trades.iter().map(|t| TradeCsvRow {
                contract: t.key.contract.clone(),
                direction: t.key.direction.to_string(),
                offset: t.offset.to_string(),
                quantity: t.quantity,
                reference_price: t.reference_price,
                order_price: t.order_price,
            }),
            &TRADE_HEADER,
        )?;
        info!("trades saved to {}", path.display());
        Ok(())
    }

    fn read_trades(&self, date: NaiveDate, session: SessionType) -> Result<Vec<Trade>> {
        let path = trades_path(&self.root, date, session);
        if !path.exists() {
            return Err(tradeops::Error::NotFound(path.display().to_string()).into());
        }
        let rows: Vec<TradeCsvRow> = read_rows(&path)?;
        rows.into_iter().map(TradeCsvRow::into_trade).collect()
    }

    fn write_orders(&self, batch: &OrderBatch) -> Result<()> {
        let path = orders_path(&self.root, batch);
        write_rows(&path, &batch.records, &OrderRecord::HEADERS)?;
        info!("{} orders saved to {}", batch.len(), path.display());
        Ok(())
    }

    fn copy_to_outbox(&self, batch: &OrderBatch) -> Result<()> {
        let outbox = self
            .outbox
            .as_deref()
            .ok_or_else(|| Error::Config("no dispatch outbox configured".into()))?;
        fs::create_dir_all(outbox).map_err(|e| Error::Write {
            path: outbox.to_path_buf(),
            source: e,
        })?;

        let name = orders_file_name(batch);
        let src = orders_path(&self.root, batch);
        let dst = outbox.join(&name);
        fs::copy(&src, &dst).map_err(|e| Error::Write {
            path: dst.clone(),
            source: e,
        })?;

        let manifest = serde_json::json!({
            "file": name,
            "window": batch.window.to_string(),
            "signal_date": format_date(batch.signal_date),
            "execution_date": format_date(batch.execution_date),
            "schedule_time": batch.schedule_time().format("%Y-%m-%d %H:%M:%S").to_string(),
            "orders": batch.len(),
            "volume": batch.total_volume(),
        });
        let manifest_path = outbox.join(format!("{name}.json"));
        fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?).map_err(|e| {
            Error::Write {
                path: manifest_path.clone(),
                source: e,
            }
        })?;
        info!("dispatched {} to {}", name, outbox.display());
        Ok(())
    }
}

impl SignalSource for FileStore {
    fn read(&self, date: NaiveDate, session: SessionType) -> tradeops::Result<Vec<SignalRow>> {
        Ok(self.read_signals(date, session)?)
    }
}

impl PositionStore for FileStore {
    fn load(&self, date: NaiveDate, session: SessionType) -> tradeops::Result<Option<PositionBook>> {
        Ok(read_book(&positions_path(&self.root, date, session))?)
    }

    fn save(&self, date: NaiveDate, session: SessionType, book: &PositionBook) -> tradeops::Result<()> {
        Ok(self.write_positions(&positions_path(&self.root, date, session), book)?)
    }

    fn load_actual(
        &self,
        date: NaiveDate,
        session: SessionType,
    ) -> tradeops::Result<Option<PositionBook>> {
        Ok(read_book(&actual_positions_path(&self.root, date, session))?)
    }
}

impl TradeStore for FileStore {
    fn save(&self, date: NaiveDate, session: SessionType, trades: &[Trade]) -> tradeops::Result<()> {
        Ok(self.write_trades(&trades_path(&self.root, date, session), trades)?)
    }

    fn load(&self, date: NaiveDate, session: SessionType) -> tradeops::Result<Vec<Trade>> {
        Ok(self.read_trades(date, session)?)
    }
}

impl OrderSink for FileStore {
    fn save(&self, batch: &OrderBatch) -> tradeops::Result<()> {
        Ok(self.write_orders(batch)?)
    }

    fn dispatch(&self, batch: &OrderBatch) -> tradeops::Result<()> {
        Ok(self.copy_to_outbox(batch)?)
    }
}

// ============================================================================
// Market data
// ============================================================================

/// Quote files under `<data_dir>/quotes/`.
///
/// Realtime snapshots are looked up by the `as_of` date; settlement files
/// by the requested date. Settlement rows carry only a percentage limit, so
/// bands are derived with each product's tick.
pub struct FileQuoteSource<'a> {
    root: PathBuf,
    registry: &'a InstrumentRegistry,
    as_of: NaiveDate,
}

impl<'a> FileQuoteSource<'a> {
    pub fn new(root: impl Into<PathBuf>, registry: &'a InstrumentRegistry, as_of: NaiveDate) -> Self {
        Self {
            root: root.into(),
            registry,
            as_of,
        }
    }

    fn read_book(&self, request: QuoteRequest) -> Result<QuoteBook> {
        match request {
            QuoteRequest::Realtime => {
                let path = quotes_path(&self.root, "realtime", self.as_of);
                if !path.exists() {
                    return Ok(QuoteBook::new());
                }
                let rows: Vec<RealtimeQuoteRow> = read_rows(&path)?;
                Ok(rows
                    .into_iter()
                    .map(|r| {
                        (
                            r.contract,
                            PriceBounds::new(r.last, r.upper_limit, r.lower_limit),
                        )
                    })
                    .collect())
            }
            QuoteRequest::Settlement(date) => {
                let path = quotes_path(&self.root, "settle", date);
                if !path.exists() {
                    return Ok(QuoteBook::new());
                }
                let rows: Vec<SettleQuoteRow> = read_rows(&path)?;
                let mut book = QuoteBook::new();
                let mut skipped = 0;
                for r in rows {
                    let Ok(meta) = self.registry.for_contract(&r.contract) else {
                        skipped += 1;
                        continue;
                    };
                    let bounds =
                        PriceBounds::from_settlement(r.settle, r.change_limit_pct, meta.tick)?;
                    book.insert(r.contract, bounds);
                }
                if skipped > 0 {
                    warn!(
                        "{}: {skipped} rows skipped, instrument not in registry",
                        path.display()
                    );
                }
                Ok(book)
            }
        }
    }
}

impl QuoteSource for FileQuoteSource<'_> {
    fn fetch(&self, contracts: &[String], request: QuoteRequest) -> tradeops::Result<QuoteBook> {
        for contract in contracts {
            self.registry.for_contract(contract)?;
        }
        let all = self.read_book(request)?;
        all.require_all(contracts.iter().map(String::as_str))?;
        let mut book = QuoteBook::new();
        for contract in contracts {
            book.insert(contract.clone(), *all.get(contract)?);
        }
        Ok(book)
    }
}
