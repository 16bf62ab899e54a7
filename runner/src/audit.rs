//! JSONL audit trail logging.
//!
//! Each command appends events to an audit.jsonl file, one JSON object per
//! line.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tradeops::{OrderRun, PositionBook, PositionCheck, SessionType, Trade};

use crate::dates::format_date;
use crate::error::Result;

/// An audit event written to the JSONL trail.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub event: &'static str,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

/// Append-only audit logger.
pub struct AuditLog {
    writer: BufWriter<std::fs::File>,
}

impl AuditLog {
    /// Open (or create) the audit log file for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Log an event with arbitrary JSON data.
    pub fn log(&mut self, event: &'static str, data: serde_json::Value) -> Result<()> {
        let entry = AuditEvent {
            event,
            ts: Utc::now(),
            data,
        };
        let json = serde_json::to_string(&entry)?;
        writeln!(self.writer, "{json}")?;
        self.writer.flush()?;
        Ok(())
    }
}

pub fn run_started(audit: &mut AuditLog, command: &str, date: NaiveDate) -> Result<()> {
    audit.log(
        "run_started",
        serde_json::json!({
            "command": command,
            "date": format_date(date),
        }),
    )
}

pub fn equity_allocated(audit: &mut AuditLog, bgn: NaiveDate, stp: NaiveDate, rows: usize) -> Result<()> {
    audit.log(
        "equity_allocated",
        serde_json::json!({
            "bgn": format_date(bgn),
            "stp": format_date(stp),
            "rows": rows,
        }),
    )
}

pub fn positions_built(
    audit: &mut AuditLog,
    session: SessionType,
    equity: rust_decimal::Decimal,
    book: &PositionBook,
) -> Result<()> {
    let positions: Vec<_> = book
        .sorted()
        .into_iter()
        .map(|p| {
            serde_json::json!({
                "contract": p.key.contract.as_str(),
                "direction": p.key.direction.to_string(),
                "qty": p.quantity,
            })
        })
        .collect();

    audit.log(
        "positions_built",
        serde_json::json!({
            "session": session.tag(),
            "equity": equity.to_string(),
            "positions": positions,
        }),
    )
}

pub fn trades_generated(audit: &mut AuditLog, session: SessionType, trades: &[Trade]) -> Result<()> {
    let trade_data: Vec<_> = trades
        .iter()
        .map(|t| {
            serde_json::json!({
                "contract": t.contract(),
                "direction": t.key.direction.to_string(),
                "offset": t.offset.to_string(),
                "qty": t.quantity,
            })
        })
        .collect();

    audit.log(
        "trades_generated",
        serde_json::json!({
            "session": session.tag(),
            "trades": trade_data,
        }),
    )
}

pub fn orders_generated(audit: &mut AuditLog, session: SessionType, run: &OrderRun) -> Result<()> {
    let batches: Vec<_> = run
        .batches
        .iter()
        .map(|b| {
            serde_json::json!({
                "window": b.window.to_string(),
                "execution_date": format_date(b.execution_date),
                "orders": b.len(),
                "volume": b.total_volume(),
            })
        })
        .collect();

    audit.log(
        "orders_generated",
        serde_json::json!({
            "session": session.tag(),
            "batches": batches,
            "dispatched": run.dispatched,
            "dispatch_failures": run.dispatch_failures,
        }),
    )
}

pub fn orders_dispatched(audit: &mut AuditLog, run: &OrderRun) -> Result<()> {
    let windows: Vec<_> = run
        .batches
        .iter()
        .filter(|b| !b.is_empty())
        .map(|b| b.window.to_string())
        .collect();

    audit.log(
        "orders_dispatched",
        serde_json::json!({
            "windows": windows,
            "dispatched": run.dispatched,
            "failed": run.dispatch_failures,
        }),
    )
}

pub fn positions_checked(audit: &mut AuditLog, check: &PositionCheck) -> Result<()> {
    let mismatches: Vec<_> = check
        .mismatches()
        .map(|e| {
            serde_json::json!({
                "contract": e.key.contract.as_str(),
                "direction": e.key.direction.to_string(),
                "target": e.target,
                "actual": e.actual,
            })
        })
        .collect();

    audit.log(
        "positions_checked",
        serde_json::json!({
            "id": check.id(),
            "clean": check.is_clean(),
            "mismatches": mismatches,
        }),
    )
}

pub fn run_completed(audit: &mut AuditLog, command: &str, ok: bool) -> Result<()> {
    audit.log(
        "run_completed",
        serde_json::json!({
            "command": command,
            "ok": ok,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    #[test]
    fn audit_log_writes_jsonl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        {
            let mut log = AuditLog::open(&path).unwrap();
            run_started(&mut log, "trades", d(7)).unwrap();
            trades_generated(&mut log, SessionType::Open, &[]).unwrap();
            run_completed(&mut log, "trades", true).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);

        for line in &lines {
            let _: serde_json::Value = serde_json::from_str(line).unwrap();
        }
        assert!(lines[0].contains("\"event\":\"run_started\""));
        assert!(lines[0].contains("\"date\":\"20250307\""));
    }

    #[test]
    fn audit_log_appends_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subdir").join("deep").join("audit.jsonl");

        for _ in 0..2 {
            let mut log = AuditLog::open(&path).unwrap();
            run_completed(&mut log, "check", false).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
