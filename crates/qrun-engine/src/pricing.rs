use qrun_types::{Action, PriceType};
use rust_decimal::Decimal;

/// The prices a single [`Action`] offers to an order executor trying to
/// fill against it: the price a market order would pay/receive, and the
/// low/high bounds a bar-based stop/limit order can trigger within.
pub trait Pricing: Send + Sync {
    /// Execution price for a market order of the given signed `size`
    /// (positive = buy, negative = sell). Costs (spread, slippage) are
    /// applied here, in the direction that disadvantages the order.
    fn market_price(&self, size: Decimal) -> f64;

    /// Lowest price reached by the underlying action (for bar-based
    /// actions; equal to `market_price` for tick-like actions).
    fn low_price(&self) -> f64;

    /// Highest price reached by the underlying action.
    fn high_price(&self) -> f64;
}

/// Prices with no execution cost applied: market price is the action's
/// close/last/mid price, and low/high pass through the action's own bounds.
pub struct NoCostPricing {
    close: f64,
    low: f64,
    high: f64,
}

impl Pricing for NoCostPricing {
    fn market_price(&self, _size: Decimal) -> f64 {
        self.close
    }

    fn low_price(&self) -> f64 {
        self.low
    }

    fn high_price(&self) -> f64 {
        self.high
    }
}

/// Applies a constant spread, in basis points, against the direction of the
/// order: buys pay `close * (1 + bips / 10_000)`, sells receive
/// `close * (1 - bips / 10_000)`.
pub struct SpreadPricing {
    close: f64,
    low: f64,
    high: f64,
    bips: f64,
}

impl Pricing for SpreadPricing {
    fn market_price(&self, size: Decimal) -> f64 {
        let half_spread = self.close * self.bips / 10_000.0;
        if size.is_sign_negative() {
            self.close - half_spread
        } else {
            self.close + half_spread
        }
    }

    fn low_price(&self) -> f64 {
        self.low
    }

    fn high_price(&self) -> f64 {
        self.high
    }
}

/// Produces a [`Pricing`] for an action, modeling the transaction-cost
/// assumptions of a simulated market. Grounded in `gb-types::backtest`'s
/// `SlippageModel`/`MarketImpactModel` enums, narrowed to what the
/// execution engine needs to price a fill.
pub trait PricingEngine: Send + Sync {
    fn pricing(&self, action: &Action) -> Box<dyn Pricing>;
}

fn bounds(action: &Action, default_type: PriceType) -> (f64, f64, f64) {
    let close = action.price(default_type);
    let low = action.price(PriceType::Low);
    let high = action.price(PriceType::High);
    let low = if low.is_nan() { close } else { low };
    let high = if high.is_nan() { close } else { high };
    (close, low, high)
}

/// No transaction costs at all — the textbook frictionless fill.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCost;

impl PricingEngine for NoCost {
    fn pricing(&self, action: &Action) -> Box<dyn Pricing> {
        let (close, low, high) = bounds(action, PriceType::Close);
        Box::new(NoCostPricing { close, low, high })
    }
}

/// A constant bid/ask spread around the action's price, in basis points.
#[derive(Debug, Clone, Copy)]
pub struct Spread {
    pub bips: f64,
    pub price_type: PriceType,
}

impl Spread {
    pub fn new(bips: f64, price_type: PriceType) -> Self {
        Self { bips, price_type }
    }
}

impl PricingEngine for Spread {
    fn pricing(&self, action: &Action) -> Box<dyn Pricing> {
        let (close, low, high) = bounds(action, self.price_type);
        Box::new(SpreadPricing {
            close,
            low,
            high,
            bips: self.bips,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrun_types::{Asset, Currency};
    use rust_decimal_macros::dec;

    fn bar() -> Action {
        Action::PriceBar {
            asset: Asset::stock("AAPL", Currency::usd()),
            open: 99.0,
            high: 105.0,
            low: 95.0,
            close: 100.0,
            volume: 1000.0,
            timespan: None,
        }
    }

    #[test]
    fn no_cost_passes_through_close_and_bounds() {
        let pricing = NoCost.pricing(&bar());
        assert_eq!(pricing.market_price(dec!(1)), 100.0);
        assert_eq!(pricing.low_price(), 95.0);
        assert_eq!(pricing.high_price(), 105.0);
    }

    #[test]
    fn spread_widens_against_the_order_direction() {
        let engine = Spread::new(50.0, PriceType::Close);
        let pricing = engine.pricing(&bar());
        let buy_price = pricing.market_price(dec!(10));
        let sell_price = pricing.market_price(dec!(-10));
        assert!(buy_price > 100.0);
        assert!(sell_price < 100.0);
        assert!((buy_price - 100.5).abs() < 1e-9);
        assert!((sell_price - 99.5).abs() < 1e-9);
    }
}
