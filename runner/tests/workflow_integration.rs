//! End-to-end runs of the CLI commands against a temporary data directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_decimal_macros::dec;
use tradeops::{Direction, ExecutionWindow, PositionKey, PrevSource, SessionType};
use tradeops_runner::config::Config;
use tradeops_runner::error::Error;
use tradeops_runner::workflow::{self, QuoteMode};

fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
}

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn month_dir(root: &Path, kind: &str) -> PathBuf {
    root.join("data").join(kind).join("2025").join("03")
}

/// Reference data, signals for 2025-03-07, yesterday's opening snapshot and
/// realtime quotes. Returns the loaded config.
fn setup(root: &Path, drift: &str) -> Config {
    write(
        &root.join("calendar.csv"),
        "trade_date\n20250306\n20250307\n20250310\n20250311\n",
    );
    write(
        &root.join("instruments.toml"),
        r#"
[RB]
exchange = "SHFE"
multiplier = 10
tick = "1"
night_session = true

[IF]
exchange = "CFFEX"
multiplier = 300
tick = "0.2"

[M]
exchange = "DCE"
multiplier = 10
tick = "1"
night_session = true
"#,
    );
    write(&root.join("cash_flow.csv"), "trade_date,cash_flow\n20250306,2000000\n");

    let signals = month_dir(root, "signals");
    write(
        &signals.join("signals_sig-date_20250307_opn.csv"),
        "contract,weight,close\nRB2505,0.4,4000\nIF2503,-0.9,3750\n",
    );
    write(
        &signals.join("signals_sig-date_20250307_cls.csv"),
        "contract,weight,close\nM2505,0.2,2500\n",
    );
    write(
        &month_dir(root, "positions").join("positions_sig-date_20250306_opn.csv"),
        "contract,direction,quantity,reference_price\nRB2505,LONG,4,3950\n",
    );
    write(
        &month_dir(root, "quotes").join("quotes_realtime_20250307.csv"),
        "contract,last,upper_limit,lower_limit\n\
         RB2505,4000,4200,3800\n\
         IF2503,3780,4150,3400\n\
         M2505,2500,2700,2300\n",
    );

    let config_path = root.join("config.toml");
    write(
        &config_path,
        &format!(
            r#"
[paths]
calendar = "{root}/calendar.csv"
instruments = "{root}/instruments.toml"
cash_flow = "{root}/cash_flow.csv"
allocated_equity = "{root}/allocated_equity.csv"
data_dir = "{root}/data"

[execution]
drift = {drift}
equity_share = 0.5

[dispatch]
outbox = "{root}/outbox"

[logging]
dir = "{root}/logs"
audit_file = "audit.jsonl"
"#,
            root = root.display(),
        ),
    );
    Config::load(&config_path).unwrap()
}

/// allocated -> positions -> trades (against yesterday's targets) for 2025-03-07.
fn prepare_trades(config: &Config) {
    workflow::allocate(config, d(7), None).unwrap();
    workflow::build_positions(config, d(7)).unwrap();
    workflow::generate_trades(config, d(7), PrevSource::Target).unwrap();
}

// ============================================================================
// Full day
// ============================================================================

#[test]
fn full_day_run() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let config = setup(root, "0.03");

    // equity(0307) = 2,000,000 over [0306, 0310)
    let series = workflow::allocate(&config, d(7), None).unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[1].equity, dec!(2000000));

    // each session type gets 1,000,000
    let books = workflow::build_positions(&config, d(7)).unwrap();
    let rb = PositionKey::new("RB2505", Direction::Long);
    let iff = PositionKey::new("IF2503", Direction::Short);
    let m = PositionKey::new("M2505", Direction::Long);
    assert_eq!(books[0].quantity(&rb), 10);
    assert_eq!(books[0].quantity(&iff), 1);
    assert_eq!(books[1].quantity(&m), 8);

    let trades = workflow::generate_trades(&config, d(7), PrevSource::Target).unwrap();
    assert_eq!(trades[0].len(), 2);
    let rb_trade = trades[0].iter().find(|t| t.key == rb).unwrap();
    assert_eq!(rb_trade.quantity, 6);
    assert_eq!(trades[1].len(), 1);
    assert_eq!(trades[1][0].quantity, 8);

    let run = workflow::generate_orders(&config, d(7), SessionType::Open, QuoteMode::Realtime, true)
        .unwrap();
    assert_eq!(run.batches.len(), 2);
    assert_eq!(run.dispatched, 2);
    assert_eq!(run.dispatch_failures, 0);

    let evening = &run.batches[0];
    assert_eq!(evening.window, ExecutionWindow::Evening);
    assert_eq!(evening.execution_date, d(7));
    assert_eq!(evening.records[0].instrument, "RB2505");
    assert_eq!(evening.records[0].price, dec!(4120));
    assert_eq!(evening.records[0].volume_total, 6);

    let morning = &run.batches[1];
    assert_eq!(morning.window, ExecutionWindow::Morning);
    assert_eq!(morning.execution_date, d(10));
    assert_eq!(morning.records[0].direction, "卖");
    assert_eq!(morning.records[0].price, dec!(3666.6));

    let orders = month_dir(root, "orders");
    let evening_file =
        fs::read_to_string(orders.join("orders_sig-date_20250307_exe-date_20250307_opn-pm.csv"))
            .unwrap();
    assert_eq!(evening_file.lines().count(), 2);
    assert!(evening_file.lines().nth(1).unwrap().contains("RB2505"));
    assert!(
        root.join("outbox")
            .join("orders_sig-date_20250307_exe-date_20250310_opn-am.csv.json")
            .exists()
    );

    // trades carry the limit price they were ordered at
    let trades_file = fs::read_to_string(
        month_dir(root, "trades").join("trades_sig-date_20250307_opn.csv"),
    )
    .unwrap();
    let rb_line = trades_file.lines().find(|l| l.starts_with("RB2505")).unwrap();
    let order_price: rust_decimal::Decimal = rb_line.rsplit(',').next().unwrap().parse().unwrap();
    assert_eq!(order_price, dec!(4120));

    let closing = workflow::generate_orders(&config, d(7), SessionType::Close, QuoteMode::Realtime, false)
        .unwrap();
    assert_eq!(closing.batches.len(), 1);
    assert_eq!(closing.batches[0].records[0].price, dec!(2575));
    assert_eq!(closing.dispatched, 0);
    assert!(
        !root
            .join("outbox")
            .join("orders_sig-date_20250307_exe-date_20250310_cls-pm.csv")
            .exists()
    );

    // the broker filled RB only
    write(
        &month_dir(root, "positions").join("positions-actual_exe-date_20250310_opn.csv"),
        "contract,direction,quantity,reference_price\nRB2505,LONG,10,\n",
    );
    let checks = workflow::check_positions(&config, d(7), d(10)).unwrap();
    let mismatches: Vec<_> = checks[0].mismatches().collect();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].key, iff);
    assert_eq!(checks[0].long_total, 10);
    assert!(!checks[1].is_clean());

    let audit = fs::read_to_string(root.join("logs").join("audit.jsonl")).unwrap();
    for event in [
        "equity_allocated",
        "positions_built",
        "trades_generated",
        "orders_generated",
        "orders_dispatched",
        "positions_checked",
        "run_completed",
    ] {
        assert!(audit.contains(&format!("\"event\":\"{event}\"")), "{event}");
    }
}

// ============================================================================
// Trades against actual holdings
// ============================================================================

#[test]
fn trades_default_to_actual_holdings() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let config = setup(root, "0.03");
    workflow::allocate(&config, d(7), None).unwrap();
    workflow::build_positions(&config, d(7)).unwrap();

    // no actual snapshot yet
    let err = workflow::generate_trades(&config, d(7), PrevSource::default()).unwrap_err();
    assert!(matches!(err, Error::Core(tradeops::Error::NotFound(_))));

    // the broker holds 3 RB (target was 4) and nothing on the closing book
    let positions = month_dir(root, "positions");
    write(
        &positions.join("positions-actual_exe-date_20250307_opn.csv"),
        "contract,direction,quantity,reference_price
RB2505,LONG,3,
",
    );
    write(
        &positions.join("positions-actual_exe-date_20250307_cls.csv"),
        "contract,direction,quantity,reference_price
",
    );
    let trades = workflow::generate_trades(&config, d(7), PrevSource::Actual).unwrap();
    let rb = PositionKey::new("RB2505", Direction::Long);
    assert_eq!(trades[0].iter().find(|t| t.key == rb).unwrap().quantity, 7);
    assert_eq!(trades[1][0].quantity, 8);
}

// ============================================================================
// Failure paths
// ============================================================================

#[test]
fn missing_quote_writes_no_orders() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let config = setup(root, "0.03");
    prepare_trades(&config);

    write(
        &month_dir(root, "quotes").join("quotes_realtime_20250307.csv"),
        "contract,last,upper_limit,lower_limit\nRB2505,4000,4200,3800\n",
    );
    let err = workflow::generate_orders(&config, d(7), SessionType::Open, QuoteMode::Realtime, true)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Core(tradeops::Error::MissingQuote(ref c)) if c == &vec!["IF2503".to_string()]
    ));
    assert!(!month_dir(root, "orders").exists());
    assert!(!root.join("outbox").exists());
}

#[test]
fn missing_signal_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let config = setup(root, "0.03");
    workflow::allocate(&config, d(7), None).unwrap();
    fs::remove_file(month_dir(root, "signals").join("signals_sig-date_20250307_cls.csv")).unwrap();

    let err = workflow::build_positions(&config, d(7)).unwrap_err();
    assert!(matches!(err, Error::Core(tradeops::Error::NotFound(_))));
    assert!(!err.is_validation());

    let audit = fs::read_to_string(root.join("logs").join("audit.jsonl")).unwrap();
    assert!(audit.lines().last().unwrap().contains("\"ok\":false"));
}

#[test]
fn bad_drift_is_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    setup(root, "0.03");
    let text = fs::read_to_string(root.join("config.toml"))
        .unwrap()
        .replace("drift = 0.03", "drift = 1.5");
    fs::write(root.join("config.toml"), text).unwrap();

    let err = Config::load(&root.join("config.toml")).unwrap_err();
    assert!(err.is_validation());
}

// ============================================================================
// Settlement quotes
// ============================================================================

#[test]
fn settlement_quotes_price_closing_batch() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let config = setup(root, "0.05");
    prepare_trades(&config);

    // band 2401..2599; 2500 * 1.05 = 2625 clamps to 2599
    write(
        &month_dir(root, "quotes").join("quotes_settle_20250307.csv"),
        "contract,settle,change_limit_pct\nM2505,2500,4\n",
    );
    let run = workflow::generate_orders(&config, d(7), SessionType::Close, QuoteMode::Settle, true)
        .unwrap();
    assert_eq!(run.batches[0].records[0].price, dec!(2599));
    assert_eq!(run.batches[0].execution_date, d(10));
    assert_eq!(run.dispatched, 1);
}
