//! Core scalar types.

use rust_decimal::Decimal;

/// Number of contracts. Never negative.
pub type Quantity = u64;

/// Price in the contract's quote currency, exact to the tick.
///
/// Using decimal arithmetic keeps tick snapping and limit-band checks exact.
pub type Price = Decimal;
