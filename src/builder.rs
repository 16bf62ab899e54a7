//! Target weights -> target position snapshot.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{Error, Result};
use crate::instrument::InstrumentRegistry;
use crate::position::{Position, PositionBook, PositionKey};
use crate::side::Direction;

/// One row of a target-weight signal.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalRow {
    pub contract: String,
    /// Signed fraction of allocated equity; negative means short.
    pub weight: Decimal,
    /// Price used to size the position (usually the signal-date close).
    pub reference_price: Decimal,
}

impl SignalRow {
    pub fn new(contract: impl Into<String>, weight: Decimal, reference_price: Decimal) -> Self {
        Self {
            contract: contract.into(),
            weight,
            reference_price,
        }
    }
}

/// Unrounded signed contract count for one signal row.
///
/// `equity * weight / (multiplier * reference_price)`
pub fn raw_quantity(
    row: &SignalRow,
    allocated_equity: Decimal,
    registry: &InstrumentRegistry,
) -> Result<Decimal> {
    let meta = registry.for_contract(&row.contract)?;
    if row.reference_price <= Decimal::ZERO {
        return Err(Error::InvalidSignal(format!(
            "reference price for {} must be positive, got {}",
            row.contract, row.reference_price
        )));
    }
    let overflow = || Error::InvalidSignal(format!("quantity overflow for {}", row.contract));
    let notional = allocated_equity.checked_mul(row.weight).ok_or_else(overflow)?;
    let per_contract = meta.multiplier.checked_mul(row.reference_price).ok_or_else(overflow)?;
    notional.checked_div(per_contract).ok_or_else(overflow)
}

/// Build the target position snapshot for one signal.
///
/// Quantities are rounded half-to-even. Rows whose raw quantity is exactly
/// zero produce no position. Fails fast on the first bad row, so a partial
/// snapshot is never returned.
pub fn build_positions(
    rows: &[SignalRow],
    allocated_equity: Decimal,
    registry: &InstrumentRegistry,
) -> Result<PositionBook> {
    let mut book = PositionBook::new();

    for row in rows {
        let raw = raw_quantity(row, allocated_equity, registry)?;
        if raw.is_zero() {
            continue;
        }

        let direction = if raw > Decimal::ZERO {
            Direction::Long
        } else {
            Direction::Short
        };
        let quantity = raw
            .abs()
            .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
            .to_u64()
            .ok_or_else(|| {
                Error::InvalidSignal(format!("quantity {raw} for {} out of range", row.contract))
            })?;

        let key = PositionKey::new(row.contract.clone(), direction);
        if book.contains(&key) {
            return Err(Error::InvalidSignal(format!("duplicate signal for {key}")));
        }
        book.insert(Position::new(key, quantity, Some(row.reference_price)));
    }

    Ok(book)
}
