//! Packaging of adjusted orders into broker-form records.

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::Result;
use crate::order::Order;
use crate::ports::Calendar;
use crate::session::ExecutionWindow;
use crate::types::{Price, Quantity};

/// Static broker-form defaults stamped on every record.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BrokerForm {
    pub order_type: String,
    pub hedge_flag: String,
    pub account: String,
    pub fund: String,
    pub trader: String,
}

impl Default for BrokerForm {
    fn default() -> Self {
        Self {
            order_type: "普通单".to_string(),
            hedge_flag: "投机".to_string(),
            account: "CTP模拟".to_string(),
            fund: "cs3".to_string(),
            trader: "01trader".to_string(),
        }
    }
}

/// One row of the broker order form.
///
/// Field order matches [`OrderRecord::HEADERS`]. Conditional-order columns
/// are part of the schema but always empty.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "PascalCase"))]
pub struct OrderRecord {
    pub order_type: String,
    pub exchange: String,
    pub product: String,
    pub instrument: String,
    pub direction: String,
    pub ofst_flag: String,
    pub hedge_flag: String,
    pub price: Price,
    pub volume_total: Quantity,
    pub volume_trade: Option<Quantity>,
    pub account: String,
    pub fund: String,
    pub strategy: String,
    pub trader: String,
    pub cond_order_insert_price_type: Option<String>,
    pub cond_cmp_price_type: Option<String>,
    pub cond_relation1: Option<String>,
    pub cond_price1: Option<String>,
    pub cond_relation2: Option<String>,
    pub cond_price2: Option<String>,
    pub stop_loss_price: Option<String>,
    pub cancle_time: Option<String>,
    #[cfg_attr(feature = "serde", serde(rename = "OrderID"))]
    pub order_id: Option<String>,
}

impl OrderRecord {
    /// Column names of the broker order form, in file order.
    pub const HEADERS: [&'static str; 23] = [
        "OrderType",
        "Exchange",
        "Product",
        "Instrument",
        "Direction",
        "OfstFlag",
        "HedgeFlag",
        "Price",
        "VolumeTotal",
        "VolumeTrade",
        "Account",
        "Fund",
        "Strategy",
        "Trader",
        "CondOrderInsertPriceType",
        "CondCmpPriceType",
        "CondRelation1",
        "CondPrice1",
        "CondRelation2",
        "CondPrice2",
        "StopLossPrice",
        "CancleTime",
        "OrderID",
    ];

    pub fn from_order(order: &Order, form: &BrokerForm) -> Self {
        Self {
            order_type: form.order_type.clone(),
            exchange: order.exchange.clone(),
            product: order.product.clone(),
            instrument: order.contract.clone(),
            direction: order.side.broker_label().to_string(),
            ofst_flag: order.offset.broker_label().to_string(),
            hedge_flag: form.hedge_flag.clone(),
            price: order.price,
            volume_total: order.volume,
            volume_trade: None,
            account: form.account.clone(),
            fund: form.fund.clone(),
            strategy: order.strategy.clone(),
            trader: form.trader.clone(),
            cond_order_insert_price_type: None,
            cond_cmp_price_type: None,
            cond_relation1: None,
            cond_price1: None,
            cond_relation2: None,
            cond_price2: None,
            stop_loss_price: None,
            cancle_time: None,
            order_id: None,
        }
    }
}

/// The final record set for one execution window.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderBatch {
    pub window: ExecutionWindow,
    pub signal_date: NaiveDate,
    pub execution_date: NaiveDate,
    pub records: Vec<OrderRecord>,
}

impl OrderBatch {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// When the batch should be released to the exchange.
    pub fn schedule_time(&self) -> NaiveDateTime {
        self.window
            .schedule_time(self.signal_date, self.execution_date)
    }

    /// Total volume over all records.
    pub fn total_volume(&self) -> Quantity {
        self.records.iter().map(|r| r.volume_total).sum()
    }
}

/// Execution date of a window's orders.
///
/// Evening orders execute on the signal date itself; every other window
/// executes on the next trading date after it.
pub fn execution_date<C: Calendar + ?Sized>(
    window: ExecutionWindow,
    signal_date: NaiveDate,
    calendar: &C,
) -> Result<NaiveDate> {
    if window.executes_on_signal_date() {
        Ok(signal_date)
    } else {
        calendar.next_trade_date(signal_date, 1)
    }
}

/// Package orders into a batch. An empty order list yields an empty,
/// schema-valid batch.
pub fn assemble(
    orders: &[Order],
    window: ExecutionWindow,
    signal_date: NaiveDate,
    execution_date: NaiveDate,
    form: &BrokerForm,
) -> OrderBatch {
    OrderBatch {
        window,
        signal_date,
        execution_date,
        records: orders
            .iter()
            .map(|o| OrderRecord::from_order(o, form))
            .collect(),
    }
}
