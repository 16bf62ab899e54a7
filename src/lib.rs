//! # tradeops
//!
//! Position reconciliation and order generation for a daily futures
//! trading workflow.
//!
//! ## Features
//!
//! - **Position builder**: target weights + allocated equity -> contract counts
//! - **Position differ**: two snapshots -> one trade per changed key, no netting
//! - **Session classifier**: evening / morning / closing execution windows
//! - **Order pricer**: drifted limit prices, floored to the tick, clamped to the limit band
//! - **Lot rules**: per-product volume multiples as a data table
//! - **Order assembler**: broker-form records, header-only when empty
//! - **Exact decimals**: prices and weights are [`rust_decimal::Decimal`]
//!
//! ## Quick Start
//!
//! ```
//! use rust_decimal::Decimal;
//! use tradeops::{
//!     InstrumentMeta, InstrumentRegistry, Offset, PositionBook, SignalRow, build_positions,
//!     diff_positions,
//! };
//!
//! let registry = InstrumentRegistry::new([InstrumentMeta {
//!     product: "RB".into(),
//!     exchange: "SHFE".into(),
//!     multiplier: Decimal::from(10),
//!     tick: Decimal::ONE,
//!     night_session: true,
//! }])
//! .unwrap();
//!
//! // 1,000,000 * 0.4 / (10 * 4000) = 10 lots long
//! let rows = [SignalRow::new("RB2505", Decimal::new(4, 1), Decimal::from(4000))];
//! let target = build_positions(&rows, Decimal::from(1_000_000), &registry).unwrap();
//!
//! let trades = diff_positions(&target, &PositionBook::new());
//! assert_eq!(trades.len(), 1);
//! assert_eq!(trades[0].offset, Offset::Open);
//! assert_eq!(trades[0].quantity, 10);
//! ```
//!
//! ## Pricing
//!
//! | side | raw price             | clamp           |
//! |------|-----------------------|-----------------|
//! | Buy  | `last * (1 + drift)`  | `<= upper_limit` |
//! | Sell | `last * (1 - drift)`  | `>= lower_limit` |
//!
//! Both sides floor to the tick before clamping.
//!
//! ```
//! use rust_decimal::Decimal;
//! use tradeops::{OrderPricer, PriceBounds, Side};
//!
//! let bounds = PriceBounds::new(Decimal::from(4000), Decimal::from(4200), Decimal::from(3800));
//! let pricer = OrderPricer::new(Decimal::new(10, 2)).unwrap(); // 10%
//! assert_eq!(pricer.limit_price(Side::Buy, &bounds, Decimal::ONE)?, Decimal::from(4200));
//! # Ok::<(), tradeops::Error>(())
//! ```
//!
//! ## Running a day
//!
//! [`Pipeline`] ties the stages to the collaborator traits in [`ports`];
//! [`mock::MockDesk`] implements all of them in memory.

pub mod assembler;
pub mod builder;
pub mod calendar;
pub mod diff;
pub mod equity;
mod error;
mod instrument;
pub mod mock;
mod order;
pub mod pipeline;
mod position;
pub mod ports;
pub mod pricing;
pub mod reconcile;
pub mod regulatory;
pub mod session;
mod side;
mod trade;
mod types;

// Re-export public API
pub use assembler::{BrokerForm, OrderBatch, OrderRecord, assemble, execution_date};
pub use builder::{SignalRow, build_positions};
pub use calendar::TradingCalendar;
pub use diff::diff_positions;
pub use equity::{AllocatedEquity, CashFlow, EquityPoint, equity_series};
pub use error::{Error, Result};
pub use instrument::{InstrumentMeta, InstrumentRegistry, product_code};
pub use order::{Order, price_trades};
pub use pipeline::{OrderRun, OrderSettings, Pipeline, PrevSource};
pub use ports::{
    Calendar, OrderSink, PositionStore, QuoteRequest, QuoteSource, SignalSource, TradeStore,
};
pub use position::{Position, PositionBook, PositionKey};
pub use pricing::{OrderPricer, PriceBounds, QuoteBook};
pub use reconcile::{CheckEntry, PositionCheck, check_positions};
pub use regulatory::{LotRule, LotRuleTable};
pub use session::{ExecutionWindow, SessionType, WindowBatch, classify};
pub use side::{Direction, Offset, Side};
pub use trade::Trade;
pub use types::{Price, Quantity};
