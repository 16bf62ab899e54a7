//! PREVIOUS→TARGET diff engine.
//!
//! Computes the trades that move a previous position snapshot to a target
//! snapshot. Every key is handled on its own: no netting across keys, no
//! lot matching, one trade per key per run.

use rustc_hash::FxHashSet;

use crate::position::{PositionBook, PositionKey};
use crate::side::Offset;
use crate::trade::Trade;

/// Compute trades from `prev` to `this`.
///
/// For every key in either snapshot, `delta = this - prev`; a positive delta
/// opens, a negative delta closes, zero emits nothing. The reference price
/// comes from the target side (absent when the key only exists in `prev`).
///
/// Output is ordered by key. Ordering is cosmetic.
pub fn diff_positions(this: &PositionBook, prev: &PositionBook) -> Vec<Trade> {
    let mut keys: Vec<&PositionKey> = {
        let mut seen: FxHashSet<&PositionKey> = FxHashSet::default();
        this.keys().chain(prev.keys()).filter(|k| seen.insert(*k)).collect()
    };
    keys.sort();

    let mut trades = Vec::new();
    for key in keys {
        let this_qty = this.quantity(key);
        let prev_qty = prev.quantity(key);
        let delta = i128::from(this_qty) - i128::from(prev_qty);
        if delta == 0 {
            continue;
        }

        let reference_price = this.get(key).and_then(|p| p.reference_price);
        trades.push(Trade::new(
            key.clone(),
            Offset::of_delta(delta),
            delta.unsigned_abs() as u64,
            reference_price,
        ));
    }

    trades
}
