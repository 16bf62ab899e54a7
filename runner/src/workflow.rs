//! One function per CLI command.
//!
//! Each command opens the audit log, loads reference data, wires the
//! file-backed collaborators into a [`Pipeline`] and prints a short report.

use chrono::NaiveDate;
use log::{error, info};
use tradeops::{
    Calendar, EquityPoint, InstrumentRegistry, OrderRun, Pipeline, PositionBook, PositionCheck,
    PrevSource, QuoteRequest, QuoteSource, SessionType, Trade, TradingCalendar, equity_series,
};

use crate::audit::{self, AuditLog};
use crate::config::Config;
use crate::dates::format_date;
use crate::error::Result;
use crate::files::{FileQuoteSource, FileStore, orders_path};
use crate::loaders;

/// Market data used to price orders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum QuoteMode {
    /// Latest prices and the exchange limit band.
    Realtime,
    /// Settlement prices of the signal date.
    Settle,
}

impl QuoteMode {
    pub fn request(self, signal_date: NaiveDate) -> QuoteRequest {
        match self {
            QuoteMode::Realtime => QuoteRequest::Realtime,
            QuoteMode::Settle => QuoteRequest::Settlement(signal_date),
        }
    }
}

/// Reference data and storage shared by the pipeline commands.
pub struct Desk {
    pub registry: InstrumentRegistry,
    pub calendar: TradingCalendar,
    pub store: FileStore,
}

impl Desk {
    pub fn load(config: &Config) -> Result<Self> {
        let registry = loaders::load_instruments(&config.paths.instruments)?;
        let calendar = loaders::load_calendar(&config.paths.calendar)?;
        let mut store = FileStore::new(&config.paths.data_dir);
        if let Some(outbox) = &config.dispatch.outbox {
            store = store.with_outbox(outbox);
        }
        Ok(Self {
            registry,
            calendar,
            store,
        })
    }

    fn pipeline<'a>(&'a self, quotes: &'a dyn QuoteSource) -> Pipeline<'a> {
        Pipeline {
            registry: &self.registry,
            calendar: &self.calendar,
            signals: &self.store,
            positions: &self.store,
            trades: &self.store,
            quotes,
            sink: &self.store,
        }
    }

    fn quotes(&self, as_of: NaiveDate) -> FileQuoteSource<'_> {
        FileQuoteSource::new(self.store.root(), &self.registry, as_of)
    }
}

/// Run `f` between `run_started` and `run_completed` audit events.
fn audited<T>(
    config: &Config,
    command: &str,
    date: NaiveDate,
    f: impl FnOnce(&mut AuditLog) -> Result<T>,
) -> Result<T> {
    let mut audit = AuditLog::open(&config.audit_path())?;
    audit::run_started(&mut audit, command, date)?;
    let result = f(&mut audit);
    let completed = audit::run_completed(&mut audit, command, result.is_ok());
    finish(command, result, completed)
}

/// A failed stage keeps its own error even when the closing audit event
/// cannot be written.
fn finish<T>(command: &str, result: Result<T>, completed: Result<()>) -> Result<T> {
    match (result, completed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(audit_err)) => {
            error!("{command}: audit run_completed not written: {audit_err}");
            Err(e)
        }
    }
}

/// Write the allocated-equity series over `[bgn, next trading date after date)`.
pub fn allocate(config: &Config, date: NaiveDate, bgn: Option<NaiveDate>) -> Result<Vec<EquityPoint>> {
    audited(config, "allocated", date, |log| {
        let calendar = loaders::load_calendar(&config.paths.calendar)?;
        let flows = loaders::load_cash_flows(&config.paths.cash_flow)?;
        let bgn = match bgn {
            Some(d) => d,
            None => calendar.first().unwrap_or(date),
        };
        let stp = calendar.next_trade_date(date, 1)?;

        let series = equity_series(&flows, &calendar, bgn, stp);
        loaders::save_equity_series(&config.paths.allocated_equity, &series)?;
        audit::equity_allocated(log, bgn, stp, series.len())?;

        info!(
            "allocated equity {}..{}: {} rows -> {}",
            format_date(bgn),
            format_date(stp),
            series.len(),
            config.paths.allocated_equity.display()
        );
        if let Some(last) = series.last() {
            println!("Allocated equity on {}: {}", format_date(last.trade_date), last.equity);
        }
        Ok(series)
    })
}

/// Build the target snapshot of both session types for `date`.
pub fn build_positions(config: &Config, date: NaiveDate) -> Result<Vec<PositionBook>> {
    audited(config, "positions", date, |log| {
        let desk = Desk::load(config)?;
        let allocated = loaders::load_allocated_equity(&config.paths.allocated_equity)?;
        let quotes = desk.quotes(date);
        let pipeline = desk.pipeline(&quotes);

        let mut books = Vec::with_capacity(SessionType::ALL.len());
        for session in SessionType::ALL {
            let equity = allocated.share_of(date, config.execution.equity_share)?;
            let book = pipeline.build_positions(date, session, equity)?;
            audit::positions_built(log, session, equity, &book)?;
            println!("{session}: {} positions (equity {equity})", book.len());
            books.push(book);
        }
        Ok(books)
    })
}

/// Diff today's snapshots against the holdings selected by `source`.
pub fn generate_trades(
    config: &Config,
    date: NaiveDate,
    source: PrevSource,
) -> Result<Vec<Vec<Trade>>> {
    audited(config, "trades", date, |log| {
        let desk = Desk::load(config)?;
        let quotes = desk.quotes(date);
        let pipeline = desk.pipeline(&quotes);

        let mut all = Vec::with_capacity(SessionType::ALL.len());
        for session in SessionType::ALL {
            let trades = pipeline.generate_trades(date, session, source)?;
            audit::trades_generated(log, session, &trades)?;
            println!("{session}: {} trades", trades.len());
            for t in &trades {
                println!(
                    "  {:<10} {:<5} {:<5} {:>6}",
                    t.contract(),
                    t.key.direction.to_string(),
                    t.offset.to_string(),
                    t.quantity
                );
            }
            all.push(trades);
        }
        Ok(all)
    })
}

/// Price, adjust, assemble and save the orders of one session type.
pub fn generate_orders(
    config: &Config,
    date: NaiveDate,
    session: SessionType,
    mode: QuoteMode,
    dispatch: bool,
) -> Result<OrderRun> {
    audited(config, "orders", date, |log| {
        let desk = Desk::load(config)?;
        let settings = config.order_settings()?;
        let quotes = desk.quotes(date);
        let pipeline = desk.pipeline(&quotes);

        let dispatch = dispatch && config.dispatch.outbox.is_some();
        if !dispatch {
            info!("dispatch disabled for this run");
        }

        let run = pipeline.generate_orders(date, session, mode.request(date), &settings, dispatch)?;
        audit::orders_generated(log, session, &run)?;
        if dispatch {
            audit::orders_dispatched(log, &run)?;
        }

        for batch in &run.batches {
            println!(
                "{:<7} {} orders, {} lots -> {}",
                batch.window.to_string(),
                batch.len(),
                batch.total_volume(),
                orders_path(desk.store.root(), batch).display()
            );
        }
        if run.dispatch_failures > 0 {
            println!("{} batch(es) failed to dispatch", run.dispatch_failures);
        }
        Ok(run)
    })
}

/// Compare target snapshots of `signal_date` with actual broker snapshots
/// of `execution_date`.
pub fn check_positions(
    config: &Config,
    signal_date: NaiveDate,
    execution_date: NaiveDate,
) -> Result<Vec<PositionCheck>> {
    audited(config, "check", signal_date, |log| {
        let desk = Desk::load(config)?;
        let quotes = desk.quotes(signal_date);
        let pipeline = desk.pipeline(&quotes);

        let mut checks = Vec::with_capacity(SessionType::ALL.len());
        for session in SessionType::ALL {
            let check = pipeline.check_positions(signal_date, execution_date, session)?;
            audit::positions_checked(log, &check)?;
            println!("{check}");
            checks.push(check);
        }
        Ok(checks)
    })
}
