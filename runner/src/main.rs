//! CLI entry point for the daily trading-operations run.

use std::path::PathBuf;
use std::process;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use tradeops::{PrevSource, SessionType};
use tradeops_runner::config::Config;
use tradeops_runner::dates;
use tradeops_runner::error::Error;
use tradeops_runner::workflow::{self, QuoteMode};

#[derive(Parser)]
#[command(name = "tradeops")]
#[command(about = "Daily futures run: signals -> positions -> trades -> broker orders")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Signal date, YYYYMMDD
    #[arg(long, value_parser = dates::parse_arg)]
    date: NaiveDate,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rebuild the allocated-equity series from the cash-flow ledger
    Allocated {
        /// First date of the series (default: first calendar date)
        #[arg(long, value_parser = dates::parse_arg)]
        bgn: Option<NaiveDate>,
    },

    /// Build target positions from the day's signals
    Positions,

    /// Diff target positions against the broker's actual holdings
    Trades {
        /// Diff against the previous trading date's target positions instead
        #[arg(long)]
        usetq: bool,
    },

    /// Price trades and write broker order files
    Orders {
        /// Session type: opn or cls
        #[arg(long)]
        sec: SessionType,

        /// Market data to price against
        #[arg(long, value_enum, default_value = "realtime")]
        source: QuoteMode,

        /// Save order files without dispatching them
        #[arg(long)]
        no_dispatch: bool,
    },

    /// Compare target positions with actual broker positions
    Check {
        /// Execution date of the actual snapshot, YYYYMMDD
        #[arg(long, value_parser = dates::parse_arg)]
        exe_date: NaiveDate,
    },
}

fn exit_code(e: &Error) -> i32 {
    if e.is_validation() { 2 } else { 1 }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(exit_code(&e));
        }
    };

    let result = match cli.command {
        Command::Allocated { bgn } => workflow::allocate(&config, cli.date, bgn).map(|_| ()),
        Command::Positions => workflow::build_positions(&config, cli.date).map(|_| ()),
        Command::Trades { usetq } => {
            let source = if usetq { PrevSource::Target } else { PrevSource::Actual };
            workflow::generate_trades(&config, cli.date, source).map(|_| ())
        }
        Command::Orders {
            sec,
            source,
            no_dispatch,
        } => workflow::generate_orders(&config, cli.date, sec, source, !no_dispatch).map(|_| ()),
        Command::Check { exe_date } => {
            workflow::check_positions(&config, cli.date, exe_date).map(|_| ())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(exit_code(&e));
    }
}
