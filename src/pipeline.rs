//! Daily run orchestration: signal → positions → trades → orders.
//!
//! Each stage reads its inputs through the collaborator traits in
//! [`crate::ports`], runs the pure core, and persists its output. A stage
//! either completes or fails without writing anything partial.

use std::fmt;

use chrono::NaiveDate;
use log::{info, warn};
use rust_decimal::Decimal;

use crate::assembler::{self, BrokerForm, OrderBatch};
use crate::builder;
use crate::diff::diff_positions;
use crate::error::{Error, Result};
use crate::instrument::InstrumentRegistry;
use crate::order::price_trades;
use crate::ports::{
    Calendar, OrderSink, PositionStore, QuoteRequest, QuoteSource, SignalSource, TradeStore,
};
use crate::position::PositionBook;
use crate::pricing::{OrderPricer, QuoteBook};
use crate::reconcile::{self, PositionCheck};
use crate::regulatory::LotRuleTable;
use crate::session::{SessionType, classify};
use crate::trade::Trade;

/// Holdings the trades stage diffs today's target against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PrevSource {
    /// The broker's actual snapshot dated on the signal date.
    #[default]
    Actual,
    /// The target snapshot of the previous trading date.
    Target,
}

impl fmt::Display for PrevSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrevSource::Actual => "actual",
            PrevSource::Target => "target",
        })
    }
}

/// Settings for the order stage.
#[derive(Clone, Debug)]
pub struct OrderSettings {
    pub pricer: OrderPricer,
    pub strategy_open: String,
    pub strategy_close: String,
    pub form: BrokerForm,
    pub lot_rules: LotRuleTable,
}

impl OrderSettings {
    /// Standard lot rules and broker-form defaults.
    pub fn new(drift: Decimal) -> Result<Self> {
        Ok(Self {
            pricer: OrderPricer::new(drift)?,
            strategy_open: "opn".to_string(),
            strategy_close: "cls".to_string(),
            form: BrokerForm::default(),
            lot_rules: LotRuleTable::standard(),
        })
    }

    pub fn strategy_for(&self, session: SessionType) -> &str {
        match session {
            SessionType::Open => &self.strategy_open,
            SessionType::Close => &self.strategy_close,
        }
    }
}

/// Outcome of the order stage.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderRun {
    pub batches: Vec<OrderBatch>,
    pub dispatched: usize,
    pub dispatch_failures: usize,
}

impl OrderRun {
    pub fn total_orders(&self) -> usize {
        self.batches.iter().map(OrderBatch::len).sum()
    }
}

/// The collaborators a run needs, borrowed for its duration.
pub struct Pipeline<'a> {
    pub registry: &'a InstrumentRegistry,
    pub calendar: &'a dyn Calendar,
    pub signals: &'a dyn SignalSource,
    pub positions: &'a dyn PositionStore,
    pub trades: &'a dyn TradeStore,
    pub quotes: &'a dyn QuoteSource,
    pub sink: &'a dyn OrderSink,
}

impl Pipeline<'_> {
    /// Build and save the target snapshot for `date`.
    pub fn build_positions(
        &self,
        date: NaiveDate,
        session: SessionType,
        allocated_equity: Decimal,
    ) -> Result<PositionBook> {
        let rows = self.signals.read(date, session)?;
        let book = builder::build_positions(&rows, allocated_equity, self.registry)?;
        self.positions.save(date, session, &book)?;
        info!(
            "positions {}-{}: {} signal rows -> {} positions (equity {})",
            date.format("%Y%m%d"),
            session,
            rows.len(),
            book.len(),
            allocated_equity
        );
        Ok(book)
    }

    /// Diff the target snapshot of `date` against the previous holdings and
    /// save the trades.
    ///
    /// The target snapshot is mandatory. With [`PrevSource::Actual`] the
    /// broker snapshot dated `date` must exist too; with
    /// [`PrevSource::Target`] a missing previous target is treated as flat.
    pub fn generate_trades(
        &self,
        date: NaiveDate,
        session: SessionType,
        source: PrevSource,
    ) -> Result<Vec<Trade>> {
        let this = self.positions.load(date, session)?.ok_or_else(|| {
            Error::NotFound(format!("positions {}-{session}", date.format("%Y%m%d")))
        })?;
        let (prev, prev_date) = match source {
            PrevSource::Actual => {
                let book = self.positions.load_actual(date, session)?.ok_or_else(|| {
                    Error::NotFound(format!(
                        "actual positions {}-{session}",
                        date.format("%Y%m%d")
                    ))
                })?;
                (book, date)
            }
            PrevSource::Target => {
                let prev_date = self.calendar.next_trade_date(date, -1)?;
                let book = match self.positions.load(prev_date, session)? {
                    Some(book) => book,
                    None => {
                        info!(
                            "positions {}-{} not available, treated as flat",
                            prev_date.format("%Y%m%d"),
                            session
                        );
                        PositionBook::new()
                    }
                };
                (book, prev_date)
            }
        };

        let trades = diff_positions(&this, &prev);
        self.trades.save(date, session, &trades)?;
        info!(
            "trades {}-{}: {} trades vs {} {}",
            date.format("%Y%m%d"),
            session,
            trades.len(),
            source,
            prev_date.format("%Y%m%d")
        );
        Ok(trades)
    }

    /// Price, adjust and assemble every window of a session, then save.
    ///
    /// All batches are computed before the first save, so a failure (for
    /// example a missing quote) leaves no order file behind. The trades are
    /// saved again with their computed `order_price`. Dispatch
    /// failures are logged and counted, never returned.
    pub fn generate_orders(
        &self,
        date: NaiveDate,
        session: SessionType,
        request: QuoteRequest,
        settings: &OrderSettings,
        dispatch: bool,
    ) -> Result<OrderRun> {
        let trades = self.trades.load(date, session)?;

        let mut contracts: Vec<String> = trades
            .iter()
            .filter(|t| t.quantity > 0)
            .map(|t| t.key.contract.clone())
            .collect();
        contracts.sort();
        contracts.dedup();
        let quotes = if contracts.is_empty() {
            QuoteBook::new()
        } else {
            self.quotes.fetch(&contracts, request)?
        };

        let strategy = settings.strategy_for(session);
        let mut batches = Vec::new();
        let mut priced = Vec::new();
        for mut window_batch in classify(session, trades, self.registry) {
            let execution_date = assembler::execution_date(window_batch.window, date, self.calendar)?;
            let orders = price_trades(
                &mut window_batch.trades,
                &quotes,
                self.registry,
                &settings.pricer,
                strategy,
            )?;
            let orders = settings.lot_rules.adjust(orders);
            priced.extend(window_batch.trades);
            batches.push(assembler::assemble(
                &orders,
                window_batch.window,
                date,
                execution_date,
                &settings.form,
            ));
        }

        priced.sort_by(|a, b| a.key.cmp(&b.key));
        self.trades.save(date, session, &priced)?;
        for batch in &batches {
            self.sink.save(batch)?;
            info!(
                "orders {} sig {} exe {}: {} orders, volume {}",
                batch.window,
                batch.signal_date.format("%Y%m%d"),
                batch.execution_date.format("%Y%m%d"),
                batch.len(),
                batch.total_volume()
            );
        }

        let mut dispatched = 0;
        let mut dispatch_failures = 0;
        if dispatch {
            for batch in batches.iter().filter(|b| !b.is_empty()) {
                match self.sink.dispatch(batch) {
                    Ok(()) => dispatched += 1,
                    Err(e) => {
                        warn!("dispatch of {} orders failed: {e}", batch.window);
                        dispatch_failures += 1;
                    }
                }
            }
        }

        Ok(OrderRun {
            batches,
            dispatched,
            dispatch_failures,
        })
    }

    /// Compare the target snapshot of `signal_date` with the broker's
    /// snapshot after executing on `execution_date`. Missing snapshots count
    /// as flat.
    pub fn check_positions(
        &self,
        signal_date: NaiveDate,
        execution_date: NaiveDate,
        session: SessionType,
    ) -> Result<PositionCheck> {
        let target = self.positions.load(signal_date, session)?.unwrap_or_else(|| {
            info!("target positions {}-{session} not available", signal_date.format("%Y%m%d"));
            PositionBook::new()
        });
        let actual = self
            .positions
            .load_actual(execution_date, session)?
            .unwrap_or_else(|| {
                info!(
                    "actual positions {}-{session} not available",
                    execution_date.format("%Y%m%d")
                );
                PositionBook::new()
            });
        Ok(reconcile::check_positions(
            &target,
            &actual,
            signal_date,
            execution_date,
            session,
        ))
    }
}
