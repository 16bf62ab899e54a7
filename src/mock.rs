//! In-memory collaborators for tests.
//!
//! ```
//! use chrono::NaiveDate;
//! use rust_decimal::Decimal;
//! use tradeops::mock::MockDesk;
//! use tradeops::{PriceBounds, SessionType, SignalRow};
//!
//! let sig = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
//! let desk = MockDesk::builder()
//!     .with_trade_dates([sig])
//!     .with_signal(sig, SessionType::Open, vec![
//!         SignalRow::new("RB2505", Decimal::new(4, 1), Decimal::from(4000)),
//!     ])
//!     .with_quote("RB2505", PriceBounds::new(
//!         Decimal::from(4000), Decimal::from(4200), Decimal::from(3800),
//!     ))
//!     .build();
//! assert!(desk.saved_batches().is_empty());
//! ```

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::NaiveDate;
use rustc_hash::FxHashMap;

use crate::assembler::OrderBatch;
use crate::builder::SignalRow;
use crate::calendar::TradingCalendar;
use crate::error::{Error, Result};
use crate::ports::{
    Calendar, OrderSink, PositionStore, QuoteRequest, QuoteSource, SignalSource, TradeStore,
};
use crate::position::PositionBook;
use crate::pricing::{PriceBounds, QuoteBook};
use crate::session::SessionType;
use crate::trade::Trade;

type Slot = (NaiveDate, SessionType);

/// How the mock handles `OrderSink::dispatch`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchMode {
    /// Dispatch succeeds and the batch is recorded.
    Accept,
    /// Every dispatch fails with a storage error.
    Fail,
}

/// Builder for [`MockDesk`].
pub struct MockDeskBuilder {
    trade_dates: Vec<NaiveDate>,
    signals: FxHashMap<Slot, Vec<SignalRow>>,
    positions: FxHashMap<Slot, PositionBook>,
    actual: FxHashMap<Slot, PositionBook>,
    trades: FxHashMap<Slot, Vec<Trade>>,
    quotes: FxHashMap<String, PriceBounds>,
    dispatch_mode: DispatchMode,
}

impl MockDeskBuilder {
    pub fn with_trade_dates(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.trade_dates.extend(dates);
        self
    }

    pub fn with_signal(mut self, date: NaiveDate, session: SessionType, rows: Vec<SignalRow>) -> Self {
        self.signals.insert((date, session), rows);
        self
    }

    pub fn with_positions(mut self, date: NaiveDate, session: SessionType, book: PositionBook) -> Self {
        self.positions.insert((date, session), book);
        self
    }

    pub fn with_actual_positions(
        mut self,
        date: NaiveDate,
        session: SessionType,
        book: PositionBook,
    ) -> Self {
        self.actual.insert((date, session), book);
        self
    }

    pub fn with_trades(mut self, date: NaiveDate, session: SessionType, trades: Vec<Trade>) -> Self {
        self.trades.insert((date, session), trades);
        self
    }

    pub fn with_quote(mut self, contract: impl Into<String>, bounds: PriceBounds) -> Self {
        self.quotes.insert(contract.into(), bounds);
        self
    }

    pub fn dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.dispatch_mode = mode;
        self
    }

    pub fn build(self) -> MockDesk {
        MockDesk {
            calendar: TradingCalendar::new(self.trade_dates),
            signals: self.signals,
            positions: Mutex::new(self.positions),
            actual: self.actual,
            trades: Mutex::new(self.trades),
            quotes: self.quotes,
            dispatch_mode: self.dispatch_mode,
            saved: Mutex::new(Vec::new()),
            dispatched: Mutex::new(Vec::new()),
            quote_requests: Mutex::new(Vec::new()),
        }
    }
}

/// Every collaborator in one in-memory object. Records what was saved and
/// dispatched for assertion in tests.
pub struct MockDesk {
    calendar: TradingCalendar,
    signals: FxHashMap<Slot, Vec<SignalRow>>,
    positions: Mutex<FxHashMap<Slot, PositionBook>>,
    actual: FxHashMap<Slot, PositionBook>,
    trades: Mutex<FxHashMap<Slot, Vec<Trade>>>,
    quotes: FxHashMap<String, PriceBounds>,
    dispatch_mode: DispatchMode,
    saved: Mutex<Vec<OrderBatch>>,
    dispatched: Mutex<Vec<OrderBatch>>,
    quote_requests: Mutex<Vec<QuoteRequest>>,
}

fn locked<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockDesk {
    pub fn builder() -> MockDeskBuilder {
        MockDeskBuilder {
            trade_dates: Vec::new(),
            signals: FxHashMap::default(),
            positions: FxHashMap::default(),
            actual: FxHashMap::default(),
            trades: FxHashMap::default(),
            quotes: FxHashMap::default(),
            dispatch_mode: DispatchMode::Accept,
        }
    }

    pub fn calendar(&self) -> &TradingCalendar {
        &self.calendar
    }

    /// Order batches passed to `save`, in call order.
    pub fn saved_batches(&self) -> Vec<OrderBatch> {
        locked(&self.saved).clone()
    }

    /// Order batches successfully dispatched, in call order.
    pub fn dispatched_batches(&self) -> Vec<OrderBatch> {
        locked(&self.dispatched).clone()
    }

    pub fn quote_requests(&self) -> Vec<QuoteRequest> {
        locked(&self.quote_requests).clone()
    }

    /// Saved target snapshot, if any.
    pub fn stored_positions(&self, date: NaiveDate, session: SessionType) -> Option<PositionBook> {
        locked(&self.positions).get(&(date, session)).cloned()
    }

    pub fn stored_trades(&self, date: NaiveDate, session: SessionType) -> Option<Vec<Trade>> {
        locked(&self.trades).get(&(date, session)).cloned()
    }
}

impl SignalSource for MockDesk {
    fn read(&self, date: NaiveDate, session: SessionType) -> Result<Vec<SignalRow>> {
        self.signals
            .get(&(date, session))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("signal {}-{session}", date.format("%Y%m%d"))))
    }
}

impl PositionStore for MockDesk {
    fn load(&self, date: NaiveDate, session: SessionType) -> Result<Option<PositionBook>> {
        Ok(self.stored_positions(date, session))
    }

    fn save(&self, date: NaiveDate, session: SessionType, book: &PositionBook) -> Result<()> {
        locked(&self.positions).insert((date, session), book.clone());
        Ok(())
    }

    fn load_actual(&self, date: NaiveDate, session: SessionType) -> Result<Option<PositionBook>> {
        Ok(self.actual.get(&(date, session)).cloned())
    }
}

impl TradeStore for MockDesk {
    fn save(&self, date: NaiveDate, session: SessionType, trades: &[Trade]) -> Result<()> {
        locked(&self.trades).insert((date, session), trades.to_vec());
        Ok(())
    }

    fn load(&self, date: NaiveDate, session: SessionType) -> Result<Vec<Trade>> {
        self.stored_trades(date, session)
            .ok_or_else(|| Error::NotFound(format!("trades {}-{session}", date.format("%Y%m%d"))))
    }
}

impl QuoteSource for MockDesk {
    fn fetch(&self, contracts: &[String], request: QuoteRequest) -> Result<QuoteBook> {
        locked(&self.quote_requests).push(request);
        let book: QuoteBook = contracts
            .iter()
            .filter_map(|c| self.quotes.get(c).map(|b| (c.clone(), *b)))
            .collect();
        book.require_all(contracts.iter().map(String::as_str))?;
        Ok(book)
    }
}

impl OrderSink for MockDesk {
    fn save(&self, batch: &OrderBatch) -> Result<()> {
        locked(&self.saved).push(batch.clone());
        Ok(())
    }

    fn dispatch(&self, batch: &OrderBatch) -> Result<()> {
        match self.dispatch_mode {
            DispatchMode::Fail => Err(Error::Storage("mock: dispatch rejected".into())),
            DispatchMode::Accept => {
                locked(&self.dispatched).push(batch.clone());
                Ok(())
            }
        }
    }
}

impl Calendar for MockDesk {
    fn next_trade_date(&self, date: NaiveDate, shift: i32) -> Result<NaiveDate> {
        self.calendar.next_trade_date(date, shift)
    }

    fn is_trade_date(&self, date: NaiveDate) -> bool {
        self.calendar.is_trade_date(date)
    }
}

/// Sorted view of saved batches keyed by window tag, handy in assertions.
pub fn batches_by_tag(batches: &[OrderBatch]) -> BTreeMap<String, &OrderBatch> {
    batches.iter().map(|b| (b.window.to_string(), b)).collect()
}
