//! Static instrument metadata keyed by product code.

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

/// Static description of one futures product.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InstrumentMeta {
    /// Root symbol, e.g. `RB` for `RB2505`.
    pub product: String,
    pub exchange: String,
    /// Units of the underlying per contract.
    pub multiplier: Decimal,
    /// Minimum legal price step.
    pub tick: Decimal,
    /// Whether the product trades in the evening session.
    pub night_session: bool,
}

/// Product code of a contract: its root symbol with the date suffix stripped.
///
/// `RB2505` -> `RB`, `CF505` -> `CF`, `rb2505` -> `rb`.
pub fn product_code(contract: &str) -> &str {
    let end = contract
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(contract.len());
    &contract[..end]
}

/// Immutable registry of instrument metadata.
///
/// Built once at startup and shared by reference; never mutated after load.
#[derive(Clone, Debug, Default)]
pub struct InstrumentRegistry {
    instruments: FxHashMap<String, InstrumentMeta>,
}

impl InstrumentRegistry {
    /// Build a registry, validating every entry.
    pub fn new(instruments: impl IntoIterator<Item = InstrumentMeta>) -> Result<Self> {
        let mut map = FxHashMap::default();
        for meta in instruments {
            if meta.multiplier <= Decimal::ZERO {
                return Err(Error::InvalidConfig(format!(
                    "multiplier for {} must be positive, got {}",
                    meta.product, meta.multiplier
                )));
            }
            if meta.tick <= Decimal::ZERO {
                return Err(Error::InvalidConfig(format!(
                    "tick for {} must be positive, got {}",
                    meta.product, meta.tick
                )));
            }
            if let Some(prev) = map.insert(meta.product.clone(), meta) {
                return Err(Error::InvalidConfig(format!(
                    "duplicate product: {}",
                    prev.product
                )));
            }
        }
        Ok(Self { instruments: map })
    }

    /// Look up a product code.
    pub fn lookup(&self, product: &str) -> Result<&InstrumentMeta> {
        self.instruments
            .get(product)
            .ok_or_else(|| Error::UnknownInstrument(product.to_string()))
    }

    /// Look up the product a contract belongs to.
    pub fn for_contract(&self, contract: &str) -> Result<&InstrumentMeta> {
        self.lookup(product_code(contract))
    }

    /// Night-session eligibility. Unknown products have no night session.
    pub fn has_night_session(&self, product: &str) -> bool {
        self.instruments
            .get(product)
            .is_some_and(|meta| meta.night_session)
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstrumentMeta> {
        self.instruments.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn meta(product: &str, night: bool) -> InstrumentMeta {
        InstrumentMeta {
            product: product.into(),
            exchange: "SHFE".into(),
            multiplier: dec!(10),
            tick: dec!(1),
            night_session: night,
        }
    }

    #[test]
    fn product_code_strips_date() {
        assert_eq!(product_code("RB2505"), "RB");
        assert_eq!(product_code("CF505"), "CF");
        assert_eq!(product_code("rb2505"), "rb");
        assert_eq!(product_code("IF"), "IF");
        assert_eq!(product_code(""), "");
    }

    #[test]
    fn lookup_by_contract() {
        let reg = InstrumentRegistry::new([meta("RB", true)]).unwrap();
        assert_eq!(reg.for_contract("RB2505").unwrap().exchange, "SHFE");
        assert!(matches!(
            reg.for_contract("ZZ2505"),
            Err(Error::UnknownInstrument(p)) if p == "ZZ"
        ));
    }

    #[test]
    fn unknown_product_has_no_night_session() {
        let reg = InstrumentRegistry::new([meta("RB", true), meta("IF", false)]).unwrap();
        assert!(reg.has_night_session("RB"));
        assert!(!reg.has_night_session("IF"));
        assert!(!reg.has_night_session("ZZ"));
    }

    #[test]
    fn reject_non_positive_tick() {
        let mut bad = meta("RB", true);
        bad.tick = Decimal::ZERO;
        assert!(InstrumentRegistry::new([bad]).is_err());
    }

    #[test]
    fn reject_duplicate_product() {
        assert!(InstrumentRegistry::new([meta("RB", true), meta("RB", false)]).is_err());
    }
}
