//! Position snapshots keyed by (contract, direction).

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::side::{Direction, Offset};
use crate::trade::Trade;
use crate::types::Quantity;

/// Identity of one side of one contract's position.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionKey {
    pub contract: String,
    pub direction: Direction,
}

impl PositionKey {
    pub fn new(contract: impl Into<String>, direction: Direction) -> Self {
        Self {
            contract: contract.into(),
            direction,
        }
    }
}

impl fmt::Display for PositionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.contract, self.direction)
    }
}

/// Held quantity of one key at a point in time.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub key: PositionKey,
    pub quantity: Quantity,
    /// Price the quantity was sized at, when known.
    pub reference_price: Option<Decimal>,
}

impl Position {
    pub fn new(key: PositionKey, quantity: Quantity, reference_price: Option<Decimal>) -> Self {
        Self {
            key,
            quantity,
            reference_price,
        }
    }

    /// A flat (zero-quantity) position for `key`.
    pub fn flat(key: PositionKey) -> Self {
        Self::new(key, 0, None)
    }

    /// Apply one trade to this position in place.
    ///
    /// Opening adds to the held quantity. Closing subtracts, and fails with
    /// [`Error::InsufficientPosition`] if more is closed than is held; the
    /// position is left untouched in that case.
    pub fn apply_trade(&mut self, trade: &Trade) -> Result<()> {
        if trade.key != self.key {
            return Err(Error::InvalidDirection(format!(
                "trade for {} applied to position {}",
                trade.key, self.key
            )));
        }
        match trade.offset {
            Offset::Open => self.quantity += trade.quantity,
            Offset::Close => {
                if self.quantity < trade.quantity {
                    return Err(Error::InsufficientPosition {
                        key: self.key.clone(),
                        held: self.quantity,
                        requested: trade.quantity,
                    });
                }
                self.quantity -= trade.quantity;
            }
        }
        Ok(())
    }

    #[inline]
    pub fn is_flat(&self) -> bool {
        self.quantity == 0
    }
}

/// A position snapshot: every key not present is flat.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PositionBook {
    positions: FxHashMap<PositionKey, Position>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a position, replacing any previous one for the same key.
    pub fn insert(&mut self, position: Position) -> Option<Position> {
        self.positions.insert(position.key.clone(), position)
    }

    pub fn get(&self, key: &PositionKey) -> Option<&Position> {
        self.positions.get(key)
    }

    /// Held quantity for `key`, zero when absent.
    pub fn quantity(&self, key: &PositionKey) -> Quantity {
        self.positions.get(key).map_or(0, |p| p.quantity)
    }

    pub fn contains(&self, key: &PositionKey) -> bool {
        self.positions.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &PositionKey> {
        self.positions.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    /// Positions ordered by key, for stable output.
    pub fn sorted(&self) -> Vec<&Position> {
        let mut out: Vec<&Position> = self.positions.values().collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        out
    }

    /// Non-zero quantities by key. Two books describing the same holdings
    /// compare equal here regardless of reference prices or flat entries.
    pub fn quantities(&self) -> BTreeMap<PositionKey, Quantity> {
        self.positions
            .values()
            .filter(|p| !p.is_flat())
            .map(|p| (p.key.clone(), p.quantity))
            .collect()
    }

    /// Incrementally apply a trade to the running book.
    ///
    /// Positions closed down to zero are removed so the book stays a
    /// snapshot of held quantity.
    pub fn apply_trade(&mut self, trade: &Trade) -> Result<()> {
        let position = self
            .positions
            .entry(trade.key.clone())
            .or_insert_with(|| Position::flat(trade.key.clone()));
        let outcome = position.apply_trade(trade);
        if position.is_flat() {
            self.positions.remove(&trade.key);
        }
        outcome
    }

    /// Apply a batch of trades, stopping at the first failure.
    pub fn apply_trades<'a>(&mut self, trades: impl IntoIterator<Item = &'a Trade>) -> Result<()> {
        for trade in trades {
            self.apply_trade(trade)?;
        }
        Ok(())
    }
}

impl FromIterator<Position> for PositionBook {
    fn from_iter<I: IntoIterator<Item = Position>>(iter: I) -> Self {
        let mut book = PositionBook::new();
        for position in iter {
            book.insert(position);
        }
        book
    }
}
