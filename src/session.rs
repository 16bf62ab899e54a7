//! Session types and execution windows.
//!
//! A daily order batch is split into sub-batches aligned with the wall-clock
//! time each contract starts trading.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::Error;
use crate::instrument::InstrumentRegistry;
use crate::trade::Trade;

/// Which signal a batch was derived from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SessionType {
    /// Targets traded at the next trading day's opening.
    #[cfg_attr(feature = "serde", serde(rename = "opn"))]
    Open,
    /// Targets traded at the close.
    #[cfg_attr(feature = "serde", serde(rename = "cls"))]
    Close,
}

impl SessionType {
    pub const ALL: [SessionType; 2] = [SessionType::Open, SessionType::Close];

    pub fn tag(self) -> &'static str {
        match self {
            SessionType::Open => "opn",
            SessionType::Close => "cls",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for SessionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opn" => Ok(SessionType::Open),
            "cls" => Ok(SessionType::Close),
            other => Err(Error::InvalidConfig(format!("unknown session type: {other}"))),
        }
    }
}

/// One sub-batch of a daily order batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ExecutionWindow {
    /// Opening trades for night-session products, placed the same evening.
    Evening,
    /// Opening trades for day-only products, placed next morning.
    Morning,
    /// Closing-session trades.
    Closing,
}

impl ExecutionWindow {
    /// Session type the window belongs to.
    pub fn session(self) -> SessionType {
        match self {
            ExecutionWindow::Evening | ExecutionWindow::Morning => SessionType::Open,
            ExecutionWindow::Closing => SessionType::Close,
        }
    }

    /// Half-day tag used in order file names.
    pub fn half_day(self) -> &'static str {
        match self {
            ExecutionWindow::Morning => "am",
            ExecutionWindow::Evening | ExecutionWindow::Closing => "pm",
        }
    }

    /// Evening orders execute before midnight on the signal date itself.
    pub fn executes_on_signal_date(self) -> bool {
        self == ExecutionWindow::Evening
    }

    /// When the broker should release the batch.
    pub fn schedule_time(self, signal_date: NaiveDate, execution_date: NaiveDate) -> NaiveDateTime {
        let (date, h, m) = match self {
            ExecutionWindow::Evening => (signal_date, 21, 0),
            ExecutionWindow::Morning => (execution_date, 9, 0),
            ExecutionWindow::Closing => (execution_date, 14, 59),
        };
        date.and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default())
    }
}

impl fmt::Display for ExecutionWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.session(), self.half_day())
    }
}

/// Trades assigned to one execution window.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowBatch {
    pub window: ExecutionWindow,
    pub trades: Vec<Trade>,
}

/// Split opening-session trades into (evening, morning) by night-session
/// eligibility. Unknown products count as day-only.
pub fn split_opening(trades: Vec<Trade>, registry: &InstrumentRegistry) -> (Vec<Trade>, Vec<Trade>) {
    trades
        .into_iter()
        .partition(|t| registry.has_night_session(t.product()))
}

/// Partition a session's trades into execution windows.
///
/// Opening sessions always yield an evening and a morning batch (either may
/// be empty); closing sessions yield a single closing batch. Never fails.
pub fn classify(
    session: SessionType,
    trades: Vec<Trade>,
    registry: &InstrumentRegistry,
) -> Vec<WindowBatch> {
    match session {
        SessionType::Open => {
            let (evening, morning) = split_opening(trades, registry);
            vec![
                WindowBatch {
                    window: ExecutionWindow::Evening,
                    trades: evening,
                },
                WindowBatch {
                    window: ExecutionWindow::Morning,
                    trades: morning,
                },
            ]
        }
        SessionType::Close => vec![WindowBatch {
            window: ExecutionWindow::Closing,
            trades,
        }],
    }
}
