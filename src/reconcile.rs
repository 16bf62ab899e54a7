//! Post-execution position check: target snapshot vs. broker snapshot.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;

use crate::position::{PositionBook, PositionKey};
use crate::session::SessionType;
use crate::side::Direction;
use crate::types::Quantity;

/// Check report for one (signal date, execution date, session type).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PositionCheck {
    pub signal_date: NaiveDate,
    pub execution_date: NaiveDate,
    pub session: SessionType,
    /// Every key present in either snapshot, sorted.
    pub entries: Vec<CheckEntry>,
    pub long_total: Quantity,
    pub short_total: Quantity,
}

/// One key's comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CheckEntry {
    pub key: PositionKey,
    pub target: Quantity,
    pub actual: Quantity,
}

impl CheckEntry {
    /// `target - actual`.
    pub fn diff(&self) -> i128 {
        i128::from(self.target) - i128::from(self.actual)
    }
}

impl PositionCheck {
    /// Entries where target and actual disagree.
    pub fn mismatches(&self) -> impl Iterator<Item = &CheckEntry> {
        self.entries.iter().filter(|e| e.diff() != 0)
    }

    pub fn is_clean(&self) -> bool {
        self.mismatches().next().is_none()
    }

    /// `sig-{date}-exe-{date}-{session}`.
    pub fn id(&self) -> String {
        format!(
            "sig-{}-exe-{}-{}",
            self.signal_date.format("%Y%m%d"),
            self.execution_date.format("%Y%m%d"),
            self.session
        )
    }
}

/// Outer-join `target` and `actual` on key; absent keys count as zero.
pub fn check_positions(
    target: &PositionBook,
    actual: &PositionBook,
    signal_date: NaiveDate,
    execution_date: NaiveDate,
    session: SessionType,
) -> PositionCheck {
    let keys: BTreeSet<&PositionKey> = target.keys().chain(actual.keys()).collect();

    let mut long_total = 0;
    let mut short_total = 0;
    let entries = keys
        .into_iter()
        .map(|key| {
            let entry = CheckEntry {
                key: key.clone(),
                target: target.quantity(key),
                actual: actual.quantity(key),
            };
            match key.direction {
                Direction::Long => long_total += entry.actual,
                Direction::Short => short_total += entry.actual,
            }
            entry
        })
        .collect();

    PositionCheck {
        signal_date,
        execution_date,
        session,
        entries,
        long_total,
        short_total,
    }
}

impl fmt::Display for PositionCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            writeln!(f, "POSITION CHECK {}: no differences", self.id())?;
            writeln!(f, "  {:10} {:>10}", "Direction", "Actual")?;
            writeln!(f, "  {:10} {:>10}", Direction::Long, self.long_total)?;
            writeln!(f, "  {:10} {:>10}", Direction::Short, self.short_total)?;
            return Ok(());
        }

        writeln!(f, "POSITION CHECK {}: differences found", self.id())?;
        writeln!(
            f,
            "  {:10} {:6} {:>8} {:>8} {:>8}",
            "Contract", "Dir", "Target", "Actual", "Diff"
        )?;
        for e in self.mismatches() {
            writeln!(
                f,
                "  {:10} {:6} {:>8} {:>8} {:>+8}",
                e.key.contract,
                e.key.direction,
                e.target,
                e.actual,
                e.diff()
            )?;
        }
        Ok(())
    }
}
