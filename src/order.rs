//! Priced orders: one per non-zero trade.

use crate::error::Result;
use crate::instrument::{InstrumentRegistry, product_code};
use crate::pricing::{OrderPricer, QuoteBook};
use crate::side::{Offset, Side};
use crate::trade::Trade;
use crate::types::{Price, Quantity};

/// An exchange-ready order before broker-form packaging.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Order {
    pub exchange: String,
    pub product: String,
    pub contract: String,
    pub side: Side,
    pub offset: Offset,
    pub price: Price,
    pub volume: Quantity,
    pub strategy: String,
}

/// Price every trade of a batch.
///
/// Quotes are checked up front for every contract with a non-zero trade, so
/// a missing quote fails the whole batch before any order is produced. The computed
/// price is also written back to each trade's `order_price`.
pub fn price_trades(
    trades: &mut [Trade],
    quotes: &QuoteBook,
    registry: &InstrumentRegistry,
    pricer: &OrderPricer,
    strategy: &str,
) -> Result<Vec<Order>> {
    quotes.require_all(
        trades
            .iter()
            .filter(|t| t.quantity > 0)
            .map(|t| t.contract()),
    )?;

    let mut orders = Vec::with_capacity(trades.len());
    for trade in trades.iter_mut() {
        if trade.quantity == 0 {
            continue;
        }
        let meta = registry.for_contract(trade.contract())?;
        let bounds = quotes.get(trade.contract())?;
        let side = trade.side();
        let price = pricer.limit_price(side, bounds, meta.tick)?;
        trade.order_price = Some(price);

        orders.push(Order {
            exchange: meta.exchange.clone(),
            product: product_code(trade.contract()).to_string(),
            contract: trade.key.contract.clone(),
            side,
            offset: trade.offset,
            price,
            volume: trade.quantity,
            strategy: strategy.to_string(),
        });
    }

    Ok(orders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::instrument::InstrumentMeta;
    use crate::position::PositionKey;
    use crate::pricing::PriceBounds;
    use crate::side::Direction;
    use rust_decimal_macros::dec;

    fn registry() -> InstrumentRegistry {
        InstrumentRegistry::new([InstrumentMeta {
            product: "RB".into(),
            exchange: "SHFE".into(),
            multiplier: dec!(10),
            tick: dec!(1),
            night_session: true,
        }])
        .unwrap()
    }

    fn quotes() -> QuoteBook {
        let mut q = QuoteBook::new();
        q.insert("RB2505", PriceBounds::new(dec!(4000), dec!(4200), dec!(3800)));
        q
    }

    #[test]
    fn prices_short_close_as_buy() {
        let mut trades = vec![Trade::new(
            PositionKey::new("RB2505", Direction::Short),
            Offset::Close,
            4,
            None,
        )];
        let pricer = OrderPricer::new(dec!(0.03)).unwrap();
        let orders = price_trades(&mut trades, &quotes(), &registry(), &pricer, "cta").unwrap();
        assert_eq!(orders.len(), 1);
        let o = &orders[0];
        assert_eq!(o.side, Side::Buy);
        assert_eq!(o.offset, Offset::Close);
        assert_eq!(o.price, dec!(4120));
        assert_eq!(o.volume, 4);
        assert_eq!(o.exchange, "SHFE");
        assert_eq!(o.product, "RB");
        assert_eq!(o.strategy, "cta");
        assert_eq!(trades[0].order_price, Some(dec!(4120)));
    }

    #[test]
    fn missing_quote_fails_whole_batch() {
        let mut trades = vec![
            Trade::new(
                PositionKey::new("RB2505", Direction::Long),
                Offset::Open,
                1,
                None,
            ),
            Trade::new(
                PositionKey::new("RB2510", Direction::Long),
                Offset::Open,
                1,
                None,
            ),
        ];
        let pricer = OrderPricer::new(dec!(0.03)).unwrap();
        let err = price_trades(&mut trades, &quotes(), &registry(), &pricer, "cta").unwrap_err();
        assert!(matches!(err, Error::MissingQuote(ref c) if c == &vec!["RB2510".to_string()]));
        assert!(trades.iter().all(|t| t.order_price.is_none()));
    }

    #[test]
    fn zero_quantity_trade_needs_no_quote() {
        let mut trades = vec![
            Trade::new(
                PositionKey::new("RB2505", Direction::Long),
                Offset::Open,
                5,
                None,
            ),
            Trade::new(
                PositionKey::new("RB2510", Direction::Long),
                Offset::Open,
                0,
                None,
            ),
        ];
        let pricer = OrderPricer::new(dec!(0.03)).unwrap();
        let orders = price_trades(&mut trades, &quotes(), &registry(), &pricer, "cta").unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].contract, "RB2505");
        assert_eq!(trades[1].order_price, None);
    }
}
