//! Position direction, trade offset, and operational side.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Which side of a contract a position is held on.
///
/// Long and short holdings of the same contract are tracked independently
/// and never netted against each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum Direction {
    Long,
    Short,
}

/// Whether a trade opens new lots or closes existing ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum Offset {
    Open,
    Close,
}

/// Operational direction of an order: what the broker actually does.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Derive the operational side from a position direction and an offset.
    ///
    /// | direction | offset | side |
    /// |-----------|--------|------|
    /// | Long      | Open   | Buy  |
    /// | Long      | Close  | Sell |
    /// | Short     | Open   | Sell |
    /// | Short     | Close  | Buy  |
    #[inline]
    pub fn of(direction: Direction, offset: Offset) -> Self {
        match (direction, offset) {
            (Direction::Long, Offset::Open) | (Direction::Short, Offset::Close) => Side::Buy,
            (Direction::Long, Offset::Close) | (Direction::Short, Offset::Open) => Side::Sell,
        }
    }

    /// Label used in the broker order form.
    pub fn broker_label(self) -> &'static str {
        match self {
            Side::Buy => "买",
            Side::Sell => "卖",
        }
    }
}

impl Offset {
    /// Offset of a trade moving a quantity by a signed delta.
    /// A non-negative delta opens, a negative one closes.
    #[inline]
    pub fn of_delta(delta: i128) -> Self {
        if delta >= 0 { Offset::Open } else { Offset::Close }
    }

    /// Label used in the broker order form.
    pub fn broker_label(self) -> &'static str {
        match self {
            Offset::Open => "开仓",
            Offset::Close => "平仓",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Offset::Open => write!(f, "OPEN"),
            Offset::Close => write!(f, "CLOSE"),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    /// Accepts `LONG`/`SHORT` in any case, and the legacy `L`/`S` tags.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LONG" | "L" => Ok(Direction::Long),
            "SHORT" | "S" => Ok(Direction::Short),
            _ => Err(Error::InvalidDirection(s.to_string())),
        }
    }
}

impl FromStr for Offset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(Offset::Open),
            "CLOSE" => Ok(Offset::Close),
            _ => Err(Error::InvalidOffset(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_table() {
        assert_eq!(Side::of(Direction::Long, Offset::Open), Side::Buy);
        assert_eq!(Side::of(Direction::Long, Offset::Close), Side::Sell);
        assert_eq!(Side::of(Direction::Short, Offset::Open), Side::Sell);
        assert_eq!(Side::of(Direction::Short, Offset::Close), Side::Buy);
    }

    #[test]
    fn offset_of_delta() {
        assert_eq!(Offset::of_delta(5), Offset::Open);
        assert_eq!(Offset::of_delta(0), Offset::Open);
        assert_eq!(Offset::of_delta(-3), Offset::Close);
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", Direction::Short), "SHORT");
        assert_eq!(format!("{}", Offset::Close), "CLOSE");
        assert_eq!(format!("{}", Side::Buy), "BUY");
    }

    #[test]
    fn broker_labels() {
        assert_eq!(Side::Sell.broker_label(), "卖");
        assert_eq!(Offset::Open.broker_label(), "开仓");
    }

    #[test]
    fn parse_direction_and_offset() {
        assert_eq!("long".parse::<Direction>().unwrap(), Direction::Long);
        assert_eq!("S".parse::<Direction>().unwrap(), Direction::Short);
        assert_eq!("Close".parse::<Offset>().unwrap(), Offset::Close);
        assert!(matches!(
            "FLAT".parse::<Direction>(),
            Err(Error::InvalidDirection(_))
        ));
        assert!(matches!("hold".parse::<Offset>(), Err(Error::InvalidOffset(_))));
    }
}
