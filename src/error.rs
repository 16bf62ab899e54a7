//! Error taxonomy for the order generation pipeline.

use chrono::NaiveDate;

use crate::position::PositionKey;

/// All errors raised by the pipeline core and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A mandatory input (signal file, equity entry, snapshot) is absent.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    /// No price bounds were supplied for one or more contracts.
    #[error("missing quote for {}", .0.join(", "))]
    MissingQuote(Vec<String>),

    #[error("insufficient position for {key}: held {held}, close requested {requested}")]
    InsufficientPosition {
        key: PositionKey,
        held: u64,
        requested: u64,
    },

    #[error("invalid direction: {0}")]
    InvalidDirection(String),

    #[error("invalid offset: {0}")]
    InvalidOffset(String),

    #[error("invalid signal: {0}")]
    InvalidSignal(String),

    /// A snapshot lists the same contract and direction twice.
    #[error("duplicate position {0}")]
    DuplicatePosition(String),

    /// Price arithmetic left the representable decimal range.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("date {date} shifted by {shift} leaves the trading calendar")]
    CalendarOutOfRange { date: NaiveDate, shift: i32 },

    /// A collaborator failed to read or write its backing storage.
    #[error("storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::side::Direction;

    #[test]
    fn missing_quote_lists_contracts() {
        let err = Error::MissingQuote(vec!["RB2505".into(), "M2505".into()]);
        assert_eq!(err.to_string(), "missing quote for RB2505, M2505");
    }

    #[test]
    fn insufficient_position_display() {
        let err = Error::InsufficientPosition {
            key: PositionKey::new("RB2505", Direction::Long),
            held: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "insufficient position for RB2505/LONG: held 3, close requested 5"
        );
    }

    #[test]
    fn is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(Error::UnknownInstrument("ZZ".into()));
        assert!(err.to_string().contains("ZZ"));
    }
}
