//! Allocated equity derived from a cash-flow ledger.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::calendar::TradingCalendar;
use crate::error::{Error, Result};

/// A deposit (positive) or withdrawal (negative) booked on a date.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CashFlow {
    pub trade_date: NaiveDate,
    pub cash_flow: Decimal,
}

/// Allocated equity on one trading date.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EquityPoint {
    pub trade_date: NaiveDate,
    pub cash_flow: Decimal,
    pub equity: Decimal,
}

/// Equity series over the trading dates in `[bgn, stp)`.
///
/// Each date's equity is the running sum of cash flows from `bgn` through
/// that date. Dates without a flow contribute zero; flows booked on
/// non-trading dates are ignored; several flows on one date are summed.
pub fn equity_series(
    flows: &[CashFlow],
    calendar: &TradingCalendar,
    bgn: NaiveDate,
    stp: NaiveDate,
) -> Vec<EquityPoint> {
    let mut by_date: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for flow in flows {
        *by_date.entry(flow.trade_date).or_default() += flow.cash_flow;
    }

    let mut equity = Decimal::ZERO;
    calendar
        .range(bgn, stp)
        .iter()
        .map(|&trade_date| {
            let cash_flow = by_date.get(&trade_date).copied().unwrap_or_default();
            equity += cash_flow;
            EquityPoint {
                trade_date,
                cash_flow,
                equity,
            }
        })
        .collect()
}

/// Lookup of allocated equity by date.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AllocatedEquity {
    by_date: BTreeMap<NaiveDate, Decimal>,
}

impl AllocatedEquity {
    pub fn new(points: impl IntoIterator<Item = EquityPoint>) -> Self {
        Self {
            by_date: points
                .into_iter()
                .map(|p| (p.trade_date, p.equity))
                .collect(),
        }
    }

    /// Fails with [`Error::NotFound`] for a date outside the series.
    pub fn get(&self, date: NaiveDate) -> Result<Decimal> {
        self.by_date
            .get(&date)
            .copied()
            .ok_or_else(|| Error::NotFound(format!("allocated equity for {}", date.format("%Y%m%d"))))
    }

    /// Equity on `date` scaled by `share`.
    pub fn share_of(&self, date: NaiveDate, share: Decimal) -> Result<Decimal> {
        Ok(self.get(date)? * share)
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn calendar() -> TradingCalendar {
        TradingCalendar::new([d(2025, 3, 6), d(2025, 3, 7), d(2025, 3, 10), d(2025, 3, 11)])
    }

    #[test]
    fn cumulative_over_trading_dates() {
        let flows = [
            CashFlow {
                trade_date: d(2025, 3, 6),
                cash_flow: dec!(1000000),
            },
            CashFlow {
                trade_date: d(2025, 3, 8), // Saturday, ignored
                cash_flow: dec!(5),
            },
            CashFlow {
                trade_date: d(2025, 3, 10),
                cash_flow: dec!(-200000),
            },
            CashFlow {
                trade_date: d(2025, 3, 10),
                cash_flow: dec!(50000),
            },
        ];
        let series = equity_series(&flows, &calendar(), d(2025, 3, 6), d(2025, 3, 11));
        let equity: Vec<Decimal> = series.iter().map(|p| p.equity).collect();
        assert_eq!(equity, vec![dec!(1000000), dec!(1000000), dec!(850000)]);
        assert_eq!(series[2].cash_flow, dec!(-150000));
    }

    #[test]
    fn lookup_and_share() {
        let series = equity_series(
            &[CashFlow {
                trade_date: d(2025, 3, 6),
                cash_flow: dec!(2000000),
            }],
            &calendar(),
            d(2025, 3, 6),
            d(2025, 3, 12),
        );
        let equity = AllocatedEquity::new(series);
        assert_eq!(equity.len(), 4);
        assert_eq!(equity.share_of(d(2025, 3, 11), dec!(0.5)).unwrap(), dec!(1000000));
        assert!(matches!(equity.get(d(2025, 3, 12)), Err(Error::NotFound(_))));
    }
}
