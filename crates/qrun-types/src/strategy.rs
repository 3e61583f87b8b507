//! The `Strategy` contract consumed by the run loop (§4.8). Concrete
//! strategies (moving-average crossover, momentum, mean-reversion, …) are
//! explicitly out of scope for the core — only the trait and the minimal
//! context a strategy needs to make a decision live here.

use crate::account::Account;
use crate::action::Event;
use crate::order::Order;

/// Everything a [`Strategy`] sees when asked to react to an [`Event`]: the
/// event itself and the account snapshot as of the previous step. Kept
/// intentionally thin — a strategy that wants rolling history should keep
/// its own [`crate::series::MultiAssetPriceBarSeries`].
#[derive(Debug, Clone)]
pub struct StrategyContext {
    pub account: Account,
}

impl StrategyContext {
    pub fn new(account: Account) -> Self {
        Self { account }
    }
}

/// A trading strategy: reacts to one [`Event`] at a time by emitting zero or
/// more [`Order`]s. Implementations are expected to be cheap and synchronous
/// per the run loop's single-threaded cooperative model (§5) — anything that
/// needs to suspend belongs in the feed, not the strategy.
pub trait Strategy: Send {
    /// Produce orders in reaction to `event`, given the account state as of
    /// the prior step.
    fn generate(&mut self, event: &Event, context: &StrategyContext) -> Vec<Order>;

    /// Clears any accumulated state, as if the strategy had just been
    /// constructed. Used between back-test runs that reuse one strategy
    /// instance.
    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Account;
    use crate::asset::Asset;
    use crate::currency::{Amount, Currency, Wallet};
    use crate::order::{Order, OrderType};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    struct BuyOnceStrategy {
        bought: bool,
    }

    impl Strategy for BuyOnceStrategy {
        fn generate(&mut self, event: &Event, _context: &StrategyContext) -> Vec<Order> {
            if self.bought {
                return Vec::new();
            }
            self.bought = true;
            let asset = Asset::stock("AAPL", Currency::usd());
            vec![Order::new(1, asset, dec!(10), OrderType::Market).with_tif(Default::default())]
                .into_iter()
                .map(|o| {
                    let _ = event;
                    o
                })
                .collect()
        }

        fn reset(&mut self) {
            self.bought = false;
        }
    }

    fn empty_account() -> Account {
        Account {
            base_currency: Currency::usd(),
            last_update: Utc::now(),
            cash: Wallet::single(Amount::new(Currency::usd(), dec!(10_000))),
            open_orders: Vec::new(),
            closed_orders: Vec::new(),
            trades: Vec::new(),
            positions: Default::default(),
            equity: Amount::new(Currency::usd(), dec!(10_000)),
            buying_power: Amount::new(Currency::usd(), dec!(10_000)),
        }
    }

    #[test]
    fn strategy_generates_once_then_resets() {
        let mut strategy = BuyOnceStrategy { bought: false };
        let context = StrategyContext::new(empty_account());
        let event = Event::empty(Utc::now());
        assert_eq!(strategy.generate(&event, &context).len(), 1);
        assert!(strategy.generate(&event, &context).is_empty());
        strategy.reset();
        assert_eq!(strategy.generate(&event, &context).len(), 1);
    }
}
