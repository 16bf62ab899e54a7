//! Limit price computation from a reference price and a daily limit band.
//!
//! ```
//! use rust_decimal::Decimal;
//! use tradeops::{OrderPricer, PriceBounds, Side};
//!
//! let bounds = PriceBounds::new(Decimal::from(4000), Decimal::from(4200), Decimal::from(3800));
//! let pricer = OrderPricer::new(Decimal::new(3, 2)).unwrap(); // 3% drift
//!
//! assert_eq!(pricer.limit_price(Side::Buy, &bounds, Decimal::ONE)?, Decimal::from(4120));
//! assert_eq!(pricer.limit_price(Side::Sell, &bounds, Decimal::ONE)?, Decimal::from(3880));
//! # Ok::<(), tradeops::Error>(())
//! ```

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::side::Side;
use crate::types::Price;

/// Reference price plus the exchange's daily price-limit band for a contract.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriceBounds {
    pub last: Price,
    pub upper_limit: Price,
    pub lower_limit: Price,
}

impl PriceBounds {
    pub fn new(last: Price, upper_limit: Price, lower_limit: Price) -> Self {
        Self {
            last,
            upper_limit,
            lower_limit,
        }
    }

    /// Derive bounds from a settlement price and a percentage price limit.
    ///
    /// Each side of the band is snapped down to the tick and then pulled one
    /// tick inward, so computed orders never land on or outside the
    /// exchange's own limit price.
    pub fn from_settlement(settle: Price, change_limit_pct: Decimal, tick: Price) -> Result<Self> {
        let pct = change_limit_pct / Decimal::ONE_HUNDRED;
        let upper = snap_down(scale(settle, Decimal::ONE + pct)?, tick) - tick;
        let lower = snap_down(scale(settle, Decimal::ONE - pct)?, tick) + tick;
        Ok(Self::new(settle, upper, lower))
    }

    /// Whether `price` is inside the band, inclusive.
    #[inline]
    pub fn contains(&self, price: Price) -> bool {
        self.lower_limit <= price && price <= self.upper_limit
    }
}

fn scale(price: Price, factor: Decimal) -> Result<Price> {
    price
        .checked_mul(factor)
        .ok_or_else(|| Error::InvalidPrice(format!("{price} x {factor} overflows")))
}

/// Round `value` down to a multiple of `tick`. A non-positive tick leaves
/// the value untouched.
pub fn snap_down(value: Price, tick: Price) -> Price {
    if tick <= Decimal::ZERO {
        return value;
    }
    (value / tick).floor() * tick
}

/// Whether `price` is an exact multiple of `tick`.
pub fn on_tick(price: Price, tick: Price) -> bool {
    tick > Decimal::ZERO && (price % tick).is_zero()
}

/// Computes aggressive-but-legal limit prices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrderPricer {
    drift: Decimal,
}

impl OrderPricer {
    /// `drift` is a fraction in `[0, 1)`, e.g. `0.03`.
    pub fn new(drift: Decimal) -> Result<Self> {
        if drift < Decimal::ZERO || drift >= Decimal::ONE {
            return Err(Error::InvalidConfig(format!(
                "drift must be in [0, 1), got {drift}"
            )));
        }
        Ok(Self { drift })
    }

    pub fn drift(&self) -> Decimal {
        self.drift
    }

    /// Reference price pushed away from the touch by the drift, before
    /// snapping and clamping. Buys move up, sells move down.
    #[inline]
    pub fn raw_price(&self, side: Side, last: Price) -> Result<Price> {
        match side {
            Side::Buy => scale(last, Decimal::ONE + self.drift),
            Side::Sell => scale(last, Decimal::ONE - self.drift),
        }
    }

    /// Final limit price: drifted, floored to the tick, clamped into the band.
    ///
    /// Flooring applies to both sides, biasing each toward the passive side.
    /// Buys are capped at the upper limit and sells floored at the lower
    /// limit; the opposite bound is also enforced so the result always lies
    /// inside the band even for inconsistent quotes.
    pub fn limit_price(&self, side: Side, bounds: &PriceBounds, tick: Price) -> Result<Price> {
        let snapped = snap_down(self.raw_price(side, bounds.last)?, tick);
        let price = match side {
            Side::Buy => snapped.min(bounds.upper_limit),
            Side::Sell => snapped.max(bounds.lower_limit),
        };
        Ok(price.max(bounds.lower_limit).min(bounds.upper_limit))
    }
}

/// Price bounds for every contract of a batch.
#[derive(Clone, Debug, Default)]
pub struct QuoteBook {
    quotes: FxHashMap<String, PriceBounds>,
}

impl QuoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, contract: impl Into<String>, bounds: PriceBounds) {
        self.quotes.insert(contract.into(), bounds);
    }

    pub fn get(&self, contract: &str) -> Result<&PriceBounds> {
        self.quotes
            .get(contract)
            .ok_or_else(|| Error::MissingQuote(vec![contract.to_string()]))
    }

    /// Fail with every unresolved contract if any is missing.
    pub fn require_all<'a>(&self, contracts: impl IntoIterator<Item = &'a str>) -> Result<()> {
        let mut missing: Vec<String> = contracts
            .into_iter()
            .filter(|c| !self.quotes.contains_key(*c))
            .map(str::to_string)
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        missing.dedup();
        Err(Error::MissingQuote(missing))
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

impl FromIterator<(String, PriceBounds)> for QuoteBook {
    fn from_iter<I: IntoIterator<Item = (String, PriceBounds)>>(iter: I) -> Self {
        Self {
            quotes: iter.into_iter().collect(),
        }
    }
}
