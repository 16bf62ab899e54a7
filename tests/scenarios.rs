//! Worked scenarios for each stage of the pipeline.

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use tradeops::{
    BrokerForm, Direction, Error, ExecutionWindow, InstrumentMeta, InstrumentRegistry,
    LotRuleTable, Offset, Order, OrderPricer, OrderRecord, Position, PositionBook, PositionKey,
    PriceBounds, Side, Trade, assemble, diff_positions,
};

fn rb_long() -> PositionKey {
    PositionKey::new("RB2505", Direction::Long)
}

fn book(entries: &[(PositionKey, u64)]) -> PositionBook {
    entries
        .iter()
        .map(|(k, q)| Position::new(k.clone(), *q, Some(dec!(4000))))
        .collect()
}

fn bounds() -> PriceBounds {
    PriceBounds::new(dec!(4000), dec!(4200), dec!(3800))
}

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
}

// ============================================================================
// Position differ
// ============================================================================

#[test]
fn scenario_a_increase_opens_difference() {
    let prev = book(&[(rb_long(), 10)]);
    let target = book(&[(rb_long(), 15)]);
    let trades = diff_positions(&target, &prev);
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].key, rb_long());
    assert_eq!(trades[0].offset, Offset::Open);
    assert_eq!(trades[0].quantity, 5);
}

#[test]
fn scenario_b_removed_key_closes_all() {
    let prev = book(&[(rb_long(), 10)]);
    let trades = diff_positions(&PositionBook::new(), &prev);
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].key, rb_long());
    assert_eq!(trades[0].offset, Offset::Close);
    assert_eq!(trades[0].quantity, 10);
}

#[test]
fn incremental_close_beyond_holding_fails() {
    let mut running = book(&[(rb_long(), 3)]);
    let trade = Trade::new(rb_long(), Offset::Close, 5, None);
    let err = running.apply_trade(&trade).unwrap_err();
    assert!(matches!(
        err,
        Error::InsufficientPosition {
            held: 3,
            requested: 5,
            ..
        }
    ));
    assert_eq!(running.quantity(&rb_long()), 3);
}

// ============================================================================
// Order pricer
// ============================================================================

#[test]
fn scenario_c_buy_price() {
    let pricer = OrderPricer::new(dec!(0.03)).unwrap();
    assert_eq!(pricer.raw_price(Side::Buy, dec!(4000)).unwrap(), dec!(4120));
    assert_eq!(pricer.limit_price(Side::Buy, &bounds(), dec!(1)).unwrap(), dec!(4120));
}

#[test]
fn scenario_d_sell_price() {
    let pricer = OrderPricer::new(dec!(0.03)).unwrap();
    assert_eq!(pricer.raw_price(Side::Sell, dec!(4000)).unwrap(), dec!(3880));
    assert_eq!(pricer.limit_price(Side::Sell, &bounds(), dec!(1)).unwrap(), dec!(3880));
}

// ============================================================================
// Regulatory adjuster
// ============================================================================

#[test]
fn scenario_e_rm_open_volume() {
    let order = Order {
        exchange: "CZCE".into(),
        product: "RM".into(),
        contract: "RM505".into(),
        side: Side::Buy,
        offset: Offset::Open,
        price: dec!(2600),
        volume: 23,
        strategy: "opn".into(),
    };
    let adjusted = LotRuleTable::standard().adjust(vec![order]);
    assert_eq!(adjusted.len(), 1);
    assert_eq!(adjusted[0].volume, 20);
}

// ============================================================================
// Order assembler
// ============================================================================

#[test]
fn scenario_f_empty_input_gives_empty_record_set() {
    let batch = assemble(
        &[],
        ExecutionWindow::Evening,
        d(7),
        d(7),
        &BrokerForm::default(),
    );
    assert!(batch.records.is_empty());
    assert_eq!(batch.window.to_string(), "opn-pm");
    assert_eq!(OrderRecord::HEADERS.len(), 23);
}

// ============================================================================
// End to end through the pure core
// ============================================================================

#[test]
fn signal_to_record() {
    let registry = InstrumentRegistry::new([InstrumentMeta {
        product: "RB".into(),
        exchange: "SHFE".into(),
        multiplier: dec!(10),
        tick: dec!(1),
        night_session: true,
    }])
    .unwrap();

    let rows = [tradeops::SignalRow::new("RB2505", dec!(-0.2), dec!(4000))];
    let target = tradeops::build_positions(&rows, dec!(1000000), &registry).unwrap();
    let mut trades = diff_positions(&target, &PositionBook::new());
    assert_eq!(trades[0].key.direction, Direction::Short);

    let mut quotes = tradeops::QuoteBook::new();
    quotes.insert("RB2505", bounds());
    let pricer = OrderPricer::new(dec!(0.03)).unwrap();
    let orders = tradeops::price_trades(&mut trades, &quotes, &registry, &pricer, "opn").unwrap();
    let batch = assemble(
        &orders,
        ExecutionWindow::Evening,
        d(7),
        d(7),
        &BrokerForm::default(),
    );

    assert_eq!(batch.records.len(), 1);
    let record = &batch.records[0];
    assert_eq!(record.direction, "卖");
    assert_eq!(record.ofst_flag, "开仓");
    assert_eq!(record.volume_total, 5);
    assert_eq!(record.price, dec!(3880));
}
