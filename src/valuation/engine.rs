//! Per-trade profit/loss at a resolved current price.

use tracing::warn;

use crate::models::{PriceQuote, QuoteSource, Trade, ValuationResult};
use crate::money::Money;

/// `(current - entry) x quantity`, at full precision.
///
/// `None` only on decimal overflow.
pub fn profit_loss(entry_price: Money, current_price: Money, quantity: Money) -> Option<Money> {
    current_price
        .checked_sub(entry_price)?
        .checked_mul(quantity)
}

/// Profit/loss as a percentage of cost basis.
///
/// The ratio is rounded half-up to 4 places before scaling by 100. A zero
/// cost basis has no defined percentage and yields zero, as does a ratio too
/// large to represent.
pub fn profit_loss_percentage(profit_loss: Money, cost_basis: Money) -> Money {
    if cost_basis.is_zero() {
        return Money::ZERO;
    }
    profit_loss
        .checked_div(cost_basis, Money::RATIO_SCALE)
        .ok()
        .and_then(|ratio| ratio.checked_mul(Money::ONE_HUNDRED))
        .unwrap_or(Money::ZERO)
}

/// Value one trade against a quote.
pub fn valuate(trade: &Trade, quote: &PriceQuote) -> ValuationResult {
    let figures = profit_loss(trade.price_per_unit, quote.price, trade.quantity).and_then(|pl| {
        let basis = trade.price_per_unit.checked_mul(trade.quantity)?;
        Some((pl, profit_loss_percentage(pl, basis)))
    });

    match figures {
        Some((profit_loss, profit_loss_percentage)) => ValuationResult {
            trade_id: trade.id,
            symbol: trade.symbol.clone(),
            trade_type: trade.trade_type,
            quantity: trade.quantity,
            entry_price: trade.price_per_unit,
            current_price: quote.price,
            price_source: quote.source,
            profit_loss,
            profit_loss_percentage,
        },
        None => {
            warn!(trade_id = trade.id, symbol = %trade.symbol, "Valuation overflowed");
            unpriced(trade)
        }
    }
}

/// Result for a trade no price could be found for: everything zero.
pub fn unpriced(trade: &Trade) -> ValuationResult {
    ValuationResult {
        trade_id: trade.id,
        symbol: trade.symbol.clone(),
        trade_type: trade.trade_type,
        quantity: trade.quantity,
        entry_price: trade.price_per_unit,
        current_price: Money::ZERO,
        price_source: QuoteSource::Unavailable,
        profit_loss: Money::ZERO,
        profit_loss_percentage: Money::ZERO,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{AssetType, Symbol, TradeType};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    pub(crate) fn make_trade(id: i64, symbol: &str, side: TradeType, qty: Money, price: Money) -> Trade {
        Trade {
            id,
            owner_id: 1,
            symbol: Symbol::parse(symbol).unwrap(),
            asset_type: AssetType::Stock,
            trade_type: side,
            quantity: qty,
            price_per_unit: price,
            total_amount: (qty * price).round_currency(),
            fees: Money::ZERO,
            notes: None,
            trade_date: Utc::now(),
        }
    }

    fn quote(symbol: &str, price: Money, source: QuoteSource) -> PriceQuote {
        PriceQuote::new(Symbol::parse(symbol).unwrap(), price, source)
    }

    #[test]
    fn test_gain() {
        let trade = make_trade(1, "ACME", TradeType::Buy, Money::from(dec!(10)), Money::from(dec!(100.00)));
        let result = valuate(&trade, &quote("ACME", Money::from(dec!(120.00)), QuoteSource::Equity));

        assert_eq!(result.profit_loss, Money::from(dec!(200.00)));
        assert_eq!(result.profit_loss_percentage, Money::from(dec!(20)));
        assert_eq!(result.profit_loss_percentage.to_string(), "20.0000");
        assert!(!result.is_indicative());
    }

    #[test]
    fn test_loss_and_rounding() {
        // 3 @ 30.00 now 20.00: -30 / 90 = -0.33333 -> -0.3333 -> -33.33%
        let trade = make_trade(2, "XYZ", TradeType::Buy, Money::from(dec!(3)), Money::from(dec!(30.00)));
        let result = valuate(&trade, &quote("XYZ", Money::from(dec!(20.00)), QuoteSource::Crypto));

        assert_eq!(result.profit_loss, Money::from(dec!(-30)));
        assert_eq!(result.profit_loss_percentage, Money::from(dec!(-33.33)));
    }

    #[test]
    fn test_precision_is_kept() {
        let qty = Money::from(dec!(0.12345678));
        let trade = make_trade(3, "BTC", TradeType::Buy, qty, Money::from(dec!(40000.00)));
        let result = valuate(&trade, &quote("BTC", Money::from(dec!(45000.01)), QuoteSource::Crypto));

        assert_eq!(result.profit_loss.amount(), dec!(5000.01) * dec!(0.12345678));
        assert_eq!(result.profit_loss.amount(), dec!(617.2851345678));
    }

    #[test]
    fn test_zero_cost_basis_gives_zero_percentage() {
        assert_eq!(
            profit_loss_percentage(Money::from(dec!(50)), Money::ZERO),
            Money::ZERO
        );

        let trade = make_trade(4, "FREE", TradeType::Buy, Money::from(dec!(5)), Money::ZERO);
        let result = valuate(&trade, &quote("FREE", Money::from(dec!(10)), QuoteSource::Equity));
        assert_eq!(result.profit_loss, Money::from(dec!(50)));
        assert_eq!(result.profit_loss_percentage, Money::ZERO);
    }

    #[test]
    fn test_unrepresentable_percentage_gives_zero() {
        // ratio 7e27 fits, x100 does not
        let pl = Money::from(dec!(700000000000000000000000000));
        let basis = Money::from(dec!(0.1));
        assert_eq!(profit_loss_percentage(pl, basis), Money::ZERO);
    }

    #[test]
    fn test_fallback_default_is_indicative() {
        let trade = make_trade(5, "ZZZ", TradeType::Buy, Money::from(dec!(2)), Money::from(dec!(80.00)));
        let result = valuate(
            &trade,
            &quote("ZZZ", Money::from(dec!(100.00)), QuoteSource::FallbackDefault),
        );

        assert_eq!(result.profit_loss, Money::from(dec!(40)));
        assert_eq!(result.profit_loss_percentage, Money::from(dec!(25)));
        assert_eq!(result.price_source, QuoteSource::FallbackDefault);
        assert!(result.is_indicative());
    }

    #[test]
    fn test_unpriced() {
        let trade = make_trade(6, "AAPL", TradeType::Sell, Money::from(dec!(1)), Money::from(dec!(150)));
        let result = unpriced(&trade);
        assert_eq!(result.current_price, Money::ZERO);
        assert_eq!(result.profit_loss, Money::ZERO);
        assert_eq!(result.price_source, QuoteSource::Unavailable);
    }
}
