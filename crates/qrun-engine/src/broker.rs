//! The simulated broker (§4.7): owns one [`InternalAccount`] and one
//! [`ExecutionEngine`], and turns a batch of strategy-generated orders plus
//! one event into an updated [`Account`] snapshot.
//!
//! Grounded in `gb-live/src/broker.rs`'s `Broker` trait shape, narrowed to
//! what a simulated fill loop needs — no REST/exchange-adapter machinery,
//! since that's an explicit out-of-scope external collaborator.

use crate::account::InternalAccount;
use crate::buying_power::AccountModel;
use crate::engine::ExecutionEngine;
use crate::fee::FeeModel;
use crate::pricing::PricingEngine;
use chrono::{DateTime, Utc};
use qrun_types::{Account, Amount, Event, ExchangeRates, Order, OrderStatus, QrResult};
use tracing::warn;

/// Drives one simulated account's order flow against incoming events.
pub struct SimBroker {
    account: InternalAccount,
    engine: ExecutionEngine,
    pricing_engine: Box<dyn PricingEngine>,
    fee_model: Box<dyn FeeModel>,
    account_model: Box<dyn AccountModel>,
    rates: Box<dyn ExchangeRates>,
}

impl SimBroker {
    pub fn new(
        initial_deposit: Amount,
        account_model: Box<dyn AccountModel>,
        pricing_engine: Box<dyn PricingEngine>,
        fee_model: Box<dyn FeeModel>,
        rates: Box<dyn ExchangeRates>,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Self {
            account: InternalAccount::new(initial_deposit, opened_at),
            engine: ExecutionEngine::new(),
            pricing_engine,
            fee_model,
            account_model,
            rates,
        }
    }

    /// Processes one step's orders against `event`, per §4.7 steps 1-6, and
    /// returns the resulting account snapshot.
    pub fn place(&mut self, orders: Vec<Order>, event: &Event) -> QrResult<Account> {
        // 1. Register new orders; set them ACCEPTED at event.time.
        let creates: Vec<Order> = orders.iter().filter(|o| !o.order_type.is_modify()).cloned().collect();
        self.account.initialize_orders(&creates, event.time);
        let registration = self.engine.add_batch(orders, event.time);
        for (order_id, result) in &registration {
            match result {
                Ok(()) => {
                    let _ = self.account.update_order(*order_id, event.time, OrderStatus::Accepted);
                }
                Err(err) => {
                    warn!(order_id, %err, "order rejected at registration");
                    let _ = self.account.update_order(*order_id, event.time, OrderStatus::Rejected);
                }
            }
        }

        // 2. Execute against the event.
        let executions = self.engine.execute(event, self.pricing_engine.as_ref(), self.fee_model.as_ref())?;

        // 3. Apply each execution: realize P&L, append the trade, settle cash.
        for execution in executions {
            self.account.apply_execution(execution);
        }

        // 4. Mark open positions at this event's prices.
        self.account.mark_positions(event, qrun_types::PriceType::Close);

        // 5. Sync executor order-states back into the account's tables.
        for (order_id, status) in self.engine.statuses() {
            let _ = self.account.update_order(order_id, event.time, status);
        }
        self.engine.remove_closed_orders();

        // 6. Recompute buying power and return the snapshot.
        self.account.set_last_update(event.time);
        let buying_power = self.account_model.buying_power(&self.account, self.rates.as_ref(), event.time);
        Ok(self.account.to_account(self.rates.as_ref(), buying_power))
    }

    pub fn account(&self) -> &InternalAccount {
        &self.account
    }

    /// The current account snapshot without processing any orders — used to
    /// seed the first `StrategyContext` before any event has been placed.
    pub fn snapshot(&self) -> Account {
        let time = self.account.last_update();
        let buying_power = self.account_model.buying_power(&self.account, self.rates.as_ref(), time);
        self.account.to_account(self.rates.as_ref(), buying_power)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buying_power::CashAccount;
    use crate::fee::NoFee;
    use crate::pricing::NoCost;
    use qrun_types::{Action, Asset, Currency, FixedExchangeRates, OrderType};
    use rust_decimal_macros::dec;

    fn asset() -> Asset {
        Asset::stock("AAPL", Currency::usd())
    }

    fn broker() -> SimBroker {
        SimBroker::new(
            Amount::new(Currency::usd(), dec!(10_000)),
            Box::new(CashAccount::default()),
            Box::new(NoCost),
            Box::new(NoFee),
            Box::new(FixedExchangeRates::new(Currency::usd())),
            Utc::now(),
        )
    }

    fn bar_event(time: DateTime<Utc>, price: f64) -> Event {
        Event::new(
            time,
            vec![Action::TradePrice {
                asset: asset(),
                price,
                volume: 100.0,
            }],
        )
    }

    #[test]
    fn market_order_fills_and_updates_cash_and_position() {
        // S1: deposit 10,000 USD; TradePrice(AAPL, 100.0); Market(AAPL, +10).
        let mut broker = broker();
        let order = Order::new(1, asset(), dec!(10), OrderType::Market);
        let event = bar_event(Utc::now(), 100.0);
        let account = broker.place(vec![order], &event).unwrap();

        assert_eq!(account.cash.balance(Currency::usd()), dec!(9_000));
        let position = account.position(&asset()).expect("position opened");
        assert_eq!(position.size, dec!(10));
        assert_eq!(position.avg_price, dec!(100));
        assert_eq!(account.trades.len(), 1);
        assert!(account.closed_orders.iter().any(|s| s.status == OrderStatus::Completed));
    }

    #[test]
    fn stop_loss_triggers_on_second_tick() {
        // S2: position AAPL size=+10@100 already open; sell Stop(-10, stop=99).
        let mut broker = broker();
        broker.place(vec![Order::new(1, asset(), dec!(10), OrderType::Market)], &bar_event(Utc::now(), 100.0)).unwrap();

        let stop_order = Order::new(2, asset(), dec!(-10), OrderType::Stop { stop: dec!(99) });
        let account1 = broker.place(vec![stop_order], &bar_event(Utc::now(), 100.0)).unwrap();
        assert!(account1.open_orders.iter().any(|s| s.order.id == 2 && s.status == OrderStatus::Accepted));

        let account2 = broker.place(vec![], &bar_event(Utc::now(), 98.0)).unwrap();
        assert!(account2.position(&asset()).is_none(), "position closed by the stop fill");
        let fill = account2.trades.last().unwrap();
        assert_eq!(fill.pnl, dec!(-20));
    }

    #[test]
    fn cancel_order_removes_it_from_open_table() {
        let mut broker = broker();
        let limit = Order::new(1, asset(), dec!(10), OrderType::Limit { limit: dec!(1) });
        broker.place(vec![limit], &bar_event(Utc::now(), 100.0)).unwrap();

        let cancel = Order::new(2, asset(), dec!(0), OrderType::Cancel { target: 1 });
        let account = broker.place(vec![cancel], &bar_event(Utc::now(), 100.0)).unwrap();
        assert!(account.open_orders.is_empty());
        assert!(account.closed_orders.iter().any(|s| s.order.id == 1 && s.status == OrderStatus::Cancelled));
    }
}
