//! A single transaction moving one key between two quantities.

use rust_decimal::Decimal;

use crate::instrument::product_code;
use crate::position::PositionKey;
use crate::side::{Offset, Side};
use crate::types::{Price, Quantity};

/// One trade per key per run.
///
/// `quantity` is always positive for trades emitted by the differ.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trade {
    pub key: PositionKey,
    pub offset: Offset,
    pub quantity: Quantity,
    /// Reference price of the target position, if any.
    pub reference_price: Option<Decimal>,
    /// Limit price, filled in by the pricer.
    pub order_price: Option<Price>,
}

impl Trade {
    pub fn new(
        key: PositionKey,
        offset: Offset,
        quantity: Quantity,
        reference_price: Option<Decimal>,
    ) -> Self {
        Self {
            key,
            offset,
            quantity,
            reference_price,
            order_price: None,
        }
    }

    /// Operational side derived from the key's direction and the offset.
    #[inline]
    pub fn side(&self) -> Side {
        Side::of(self.key.direction, self.offset)
    }

    pub fn contract(&self) -> &str {
        &self.key.contract
    }

    /// Product code of the traded contract.
    pub fn product(&self) -> &str {
        product_code(&self.key.contract)
    }
}
