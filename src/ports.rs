//! Collaborator contracts consumed by the pipeline.
//!
//! Storage, market data and transmission live behind these traits. The
//! file-backed implementations are in the runner crate; [`crate::mock`]
//! provides in-memory ones for tests.

use chrono::NaiveDate;

use crate::assembler::OrderBatch;
use crate::builder::SignalRow;
use crate::error::Result;
use crate::position::PositionBook;
use crate::pricing::QuoteBook;
use crate::session::SessionType;
use crate::trade::Trade;

/// Target-weight signals per (signal date, session type).
pub trait SignalSource {
    /// Fails with [`crate::Error::NotFound`] if the signal is absent.
    fn read(&self, date: NaiveDate, session: SessionType) -> Result<Vec<SignalRow>>;
}

/// Position snapshots per (date, session type).
pub trait PositionStore {
    /// Target snapshot built for `date`. `None` when never written.
    fn load(&self, date: NaiveDate, session: SessionType) -> Result<Option<PositionBook>>;

    fn save(&self, date: NaiveDate, session: SessionType, book: &PositionBook) -> Result<()>;

    /// Snapshot actually held at the broker after executing on `date`.
    fn load_actual(&self, date: NaiveDate, session: SessionType) -> Result<Option<PositionBook>>;
}

/// Trade lists per (signal date, session type).
pub trait TradeStore {
    fn save(&self, date: NaiveDate, session: SessionType, trades: &[Trade]) -> Result<()>;

    /// Fails with [`crate::Error::NotFound`] if no trades were generated.
    fn load(&self, date: NaiveDate, session: SessionType) -> Result<Vec<Trade>>;
}

/// Which market data to price against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuoteRequest {
    /// Latest prices and today's limit band.
    Realtime,
    /// Settlement prices of the given date; bands derived from the
    /// percentage price limit.
    Settlement(NaiveDate),
}

/// Price bounds per contract.
pub trait QuoteSource {
    /// Fails with [`crate::Error::MissingQuote`] listing every contract it
    /// could not resolve.
    fn fetch(&self, contracts: &[String], request: QuoteRequest) -> Result<QuoteBook>;
}

/// Destination of assembled order batches.
pub trait OrderSink {
    /// Persist a batch. Empty batches are saved too.
    fn save(&self, batch: &OrderBatch) -> Result<()>;

    /// Hand a saved batch to downstream transmission. Callers treat this as
    /// fire-and-forget and only log failures.
    fn dispatch(&self, batch: &OrderBatch) -> Result<()>;
}

/// Exchange trading calendar.
pub trait Calendar {
    /// The `|shift|`-th trading date after (`shift > 0`) or before
    /// (`shift < 0`) `date`; `date` itself for `shift == 0`.
    fn next_trade_date(&self, date: NaiveDate, shift: i32) -> Result<NaiveDate>;

    fn is_trade_date(&self, date: NaiveDate) -> bool;
}
