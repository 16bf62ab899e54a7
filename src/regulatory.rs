//! Exchange lot-size rules.
//!
//! Some products only accept volumes in fixed multiples for a given offset.
//! Rules are data: a table keyed by (product, offset). Orders without a
//! matching rule pass through untouched.

use log::{info, warn};
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::order::Order;
use crate::side::Offset;
use crate::types::Quantity;

/// Volumes for `product` orders with `offset` must be multiples of `multiple`.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LotRule {
    pub product: String,
    pub offset: Offset,
    pub multiple: Quantity,
}

impl LotRule {
    pub fn new(product: impl Into<String>, offset: Offset, multiple: Quantity) -> Result<Self> {
        if multiple == 0 {
            return Err(Error::InvalidConfig(
                "lot multiple must be positive".to_string(),
            ));
        }
        Ok(Self {
            product: product.into(),
            offset,
            multiple,
        })
    }
}

/// Round `volume` to the nearest multiple of `multiple`, ties upward.
///
/// `23 -> 20`, `25 -> 30`, `4 -> 0` at multiple 10.
#[inline]
pub fn round_to_multiple(volume: Quantity, multiple: Quantity) -> Quantity {
    if multiple <= 1 {
        return volume;
    }
    let rem = volume % multiple;
    let down = volume - rem;
    if rem * 2 >= multiple {
        down.saturating_add(multiple)
    } else {
        down
    }
}

/// Lot rules keyed by (product, offset).
#[derive(Clone, Debug, Default)]
pub struct LotRuleTable {
    rules: FxHashMap<(String, Offset), Quantity>,
}

impl LotRuleTable {
    /// A table with no rules: every order passes through unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules currently mandated by the exchanges.
    ///
    /// ZCE rapeseed meal (`RM`) opening orders must be multiples of 10 lots.
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.insert(LotRule {
            product: "RM".to_string(),
            offset: Offset::Open,
            multiple: 10,
        });
        table
    }

    /// Add or replace a rule.
    pub fn insert(&mut self, rule: LotRule) {
        self.rules.insert((rule.product, rule.offset), rule.multiple);
    }

    pub fn with_rule(mut self, rule: LotRule) -> Self {
        self.insert(rule);
        self
    }

    pub fn multiple_for(&self, product: &str, offset: Offset) -> Option<Quantity> {
        self.rules.get(&(product.to_string(), offset)).copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply the table to a batch of orders. Never fails.
    ///
    /// Orders whose volume rounds to zero are dropped.
    pub fn adjust(&self, orders: Vec<Order>) -> Vec<Order> {
        if self.rules.is_empty() {
            return orders;
        }

        orders
            .into_iter()
            .filter_map(|mut order| {
                let Some(multiple) = self.multiple_for(&order.product, order.offset) else {
                    return Some(order);
                };
                let before = order.volume;
                let after = round_to_multiple(before, multiple);
                if after == before {
                    return Some(order);
                }
                if after == 0 {
                    warn!(
                        "lot rule {} {} x{}: {} volume {} rounds to zero, order dropped",
                        order.product, order.offset, multiple, order.contract, before
                    );
                    return None;
                }
                info!(
                    "lot rule {} {} x{}: {} volume {} -> {}",
                    order.product, order.offset, multiple, order.contract, before, after
                );
                order.volume = after;
                Some(order)
            })
            .collect()
    }
}

impl Extend<LotRule> for LotRuleTable {
    fn extend<I: IntoIterator<Item = LotRule>>(&mut self, iter: I) {
        for rule in iter {
            self.insert(rule);
        }
    }
}
