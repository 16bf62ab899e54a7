//! Trading calendar backed by a sorted list of trading dates.

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::ports::Calendar;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TradingCalendar {
    dates: Vec<NaiveDate>,
}

impl TradingCalendar {
    /// Build from trading dates in any order; duplicates are removed.
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        let mut dates: Vec<NaiveDate> = dates.into_iter().collect();
        dates.sort_unstable();
        dates.dedup();
        Self { dates }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Trading dates in `[bgn, stp)`.
    pub fn range(&self, bgn: NaiveDate, stp: NaiveDate) -> &[NaiveDate] {
        let lo = self.dates.partition_point(|d| *d < bgn);
        let hi = self.dates.partition_point(|d| *d < stp);
        if lo >= hi { &[] } else { &self.dates[lo..hi] }
    }
}

impl Calendar for TradingCalendar {
    fn next_trade_date(&self, date: NaiveDate, shift: i32) -> Result<NaiveDate> {
        let out_of_range = || Error::CalendarOutOfRange { date, shift };
        match shift {
            0 => {
                if self.is_trade_date(date) {
                    Ok(date)
                } else {
                    Err(out_of_range())
                }
            }
            s if s > 0 => {
                // first index strictly after `date`
                let start = self.dates.partition_point(|d| *d <= date);
                let idx = start + (s as usize - 1);
                self.dates.get(idx).copied().ok_or_else(out_of_range)
            }
            s => {
                // number of dates strictly before `date`
                let before = self.dates.partition_point(|d| *d < date);
                let back = s.unsigned_abs() as usize;
                before
                    .checked_sub(back)
                    .and_then(|idx| self.dates.get(idx).copied())
                    .ok_or_else(out_of_range)
            }
        }
    }

    fn is_trade_date(&self, date: NaiveDate) -> bool {
        self.dates.binary_search(&date).is_ok()
    }
}
