//! Property-based tests for the diff and pricing laws.
//!
//! These tests use proptest to verify that key invariants hold
//! across randomly generated snapshots and quotes.

use std::collections::BTreeSet;

use proptest::prelude::*;
use rust_decimal::Decimal;
use tradeops::pricing::on_tick;
use tradeops::{
    Direction, OrderPricer, Position, PositionBook, PositionKey, PriceBounds, Side, diff_positions,
};

const CONTRACTS: [&str; 5] = ["RB2505", "M2505", "CF505", "IF2503", "RM505"];

/// Generate a position key from a small contract universe so snapshots overlap
fn key_strategy() -> impl Strategy<Value = PositionKey> {
    (
        0..CONTRACTS.len(),
        prop_oneof![Just(Direction::Long), Just(Direction::Short)],
    )
        .prop_map(|(i, dir)| PositionKey::new(CONTRACTS[i], dir))
}

/// Generate a snapshot; zero quantities are allowed
fn book_strategy() -> impl Strategy<Value = PositionBook> {
    prop::collection::vec((key_strategy(), 0u64..200), 0..10).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(key, qty)| Position::new(key, qty, Some(Decimal::from(100))))
            .collect()
    })
}

/// Generate a positive price with two decimals
fn price_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=2_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Generate a drift fraction in [0, 0.5)
fn drift_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..5_000i64).prop_map(|bp| Decimal::new(bp, 4))
}

fn tick_strategy() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        Just(Decimal::new(2, 1)),
        Just(Decimal::new(5, 1)),
        Just(Decimal::ONE),
        Just(Decimal::from(2)),
        Just(Decimal::from(5)),
    ]
}

fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Buy), Just(Side::Sell)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // ========================================================================
    // DIFF LAWS
    // ========================================================================

    /// Applying the trades to the previous snapshot reproduces the target
    #[test]
    fn diff_round_trip(prev in book_strategy(), target in book_strategy()) {
        let trades = diff_positions(&target, &prev);
        let mut running = prev.clone();
        running.apply_trades(&trades).unwrap();
        prop_assert_eq!(running.quantities(), target.quantities());
    }

    /// Every trade has a positive quantity and a key from one of the snapshots
    #[test]
    fn no_phantom_trades(prev in book_strategy(), target in book_strategy()) {
        let known: BTreeSet<PositionKey> = prev.keys().chain(target.keys()).cloned().collect();
        for trade in diff_positions(&target, &prev) {
            prop_assert!(trade.quantity > 0);
            prop_assert!(known.contains(&trade.key), "phantom key {}", trade.key);
        }
    }

    /// Keys with equal quantity on both sides never trade; all others trade once
    #[test]
    fn zero_quantity_exclusion(prev in book_strategy(), target in book_strategy()) {
        let trades = diff_positions(&target, &prev);
        let traded: Vec<&PositionKey> = trades.iter().map(|t| &t.key).collect();
        let unique: BTreeSet<&PositionKey> = traded.iter().copied().collect();
        prop_assert_eq!(unique.len(), traded.len(), "more than one trade per key");

        for key in prev.keys().chain(target.keys()) {
            let same = prev.quantity(key) == target.quantity(key);
            prop_assert_eq!(unique.contains(key), !same, "key {}", key);
        }
    }

    // ========================================================================
    // PRICING LAWS
    // ========================================================================

    /// Limit prices stay inside the band and on the tick
    #[test]
    fn price_legality(
        last in price_strategy(),
        drift in drift_strategy(),
        tick in tick_strategy(),
        side in side_strategy(),
        lower_ticks in 1i64..10_000,
        width_ticks in 0i64..10_000,
    ) {
        let lower = tick * Decimal::from(lower_ticks);
        let upper = lower + tick * Decimal::from(width_ticks);
        let bounds = PriceBounds::new(last, upper, lower);
        let price = OrderPricer::new(drift).unwrap().limit_price(side, &bounds, tick).unwrap();

        prop_assert!(bounds.contains(price), "{} outside [{}, {}]", price, lower, upper);
        prop_assert!(on_tick(price, tick), "{} not a multiple of {}", price, tick);
    }

    /// A larger drift never makes a buy less aggressive or a sell more passive
    #[test]
    fn monotonic_drift(
        last in price_strategy(),
        a in drift_strategy(),
        b in drift_strategy(),
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let lo = OrderPricer::new(lo).unwrap();
        let hi = OrderPricer::new(hi).unwrap();
        prop_assert!(lo.raw_price(Side::Buy, last).unwrap() <= hi.raw_price(Side::Buy, last).unwrap());
        prop_assert!(lo.raw_price(Side::Sell, last).unwrap() >= hi.raw_price(Side::Sell, last).unwrap());
    }

    /// Settlement-derived bands sit strictly inside the raw percentage band
    #[test]
    fn settlement_band_inside_limit(
        settle in price_strategy(),
        pct in 1i64..=20,
        tick in tick_strategy(),
    ) {
        let pct = Decimal::from(pct);
        let bounds = PriceBounds::from_settlement(settle, pct, tick).unwrap();
        let raw_upper = settle * (Decimal::ONE + pct / Decimal::ONE_HUNDRED);
        let raw_lower = settle * (Decimal::ONE - pct / Decimal::ONE_HUNDRED);
        prop_assert!(bounds.upper_limit < raw_upper);
        prop_assert!(bounds.lower_limit > raw_lower);
        prop_assert!(on_tick(bounds.upper_limit, tick));
        prop_assert!(on_tick(bounds.lower_limit, tick));
    }
}
