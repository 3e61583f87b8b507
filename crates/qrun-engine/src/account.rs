//! The mutable accumulator behind the immutable [`qrun_types::Account`]
//! snapshot. Owns the cash wallet, the open/closed order tables, the trade
//! log and the position map; the broker is the only thing allowed to mutate
//! it, per §5's shared-resource policy.
//!
//! Grounded in `gb-types::portfolio::Portfolio`'s mutation methods
//! (`apply_fill`, position bookkeeping) for the shape of the operations, and
//! `gb-engine::engine::Engine`'s per-step account update for when each one
//! runs.

use chrono::{DateTime, Utc};
use qrun_types::{
    Account, Amount, Asset, Currency, Event, ExchangeRates, Order, OrderId, OrderState, OrderStatus, PriceType,
    QrError, QrResult, Trade, Wallet,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;

pub struct InternalAccount {
    base_currency: Currency,
    last_update: DateTime<Utc>,
    cash: Wallet,
    open_orders: HashMap<OrderId, OrderState>,
    closed_orders: Vec<OrderState>,
    trades: Vec<Trade>,
    positions: HashMap<Asset, qrun_types::Position>,
}

impl InternalAccount {
    pub fn new(initial_deposit: Amount, opened_at: DateTime<Utc>) -> Self {
        let mut cash = Wallet::new();
        cash.deposit(initial_deposit);
        Self {
            base_currency: initial_deposit.currency,
            last_update: opened_at,
            cash,
            open_orders: HashMap::new(),
            closed_orders: Vec::new(),
            trades: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn base_currency(&self) -> Currency {
        self.base_currency
    }

    pub fn cash(&self) -> &Wallet {
        &self.cash
    }

    pub fn positions(&self) -> &HashMap<Asset, qrun_types::Position> {
        &self.positions
    }

    pub fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }

    pub fn set_last_update(&mut self, time: DateTime<Utc>) {
        self.last_update = time;
    }

    /// Replaces the position for `asset`, removing the entry if the new size
    /// is zero.
    pub fn set_position(&mut self, asset: Asset, position: qrun_types::Position) {
        if position.is_flat() {
            self.positions.remove(&asset);
        } else {
            self.positions.insert(asset, position);
        }
    }

    /// Combines `fill_size`@`fill_price` into the existing position for
    /// `asset` using the position-update formulas, returning the P&L
    /// realized by this fill.
    pub fn update_position(&mut self, asset: &Asset, fill_size: Decimal, fill_price: Decimal) -> Decimal {
        let current = self.positions.get(asset).copied().unwrap_or_else(qrun_types::Position::flat);
        let (new_position, pnl) = current.combine(fill_size, fill_price);
        self.set_position(asset.clone(), new_position);
        pnl
    }

    /// Applies one execution: realizes P&L against the existing position,
    /// updates the position, appends the trade to the log, and settles cash.
    /// `execution.pnl` is overwritten here — only the account, holding the
    /// prior position, can compute it.
    pub fn apply_execution(&mut self, execution: Trade) -> Trade {
        let pnl = self.update_position(&execution.asset, execution.size, execution.price);
        let trade = Trade { pnl, ..execution };
        self.trades.push(trade.clone());
        let notional = trade.size * trade.price + trade.fee;
        self.cash.withdraw(Amount::new(trade.asset.currency, notional));
        debug!(order_id = trade.order_id, %pnl, "trade applied to account");
        trade
    }

    /// Registers `orders` in the open-order table as `INITIAL`. Per §4.7
    /// step 1, only create orders become tracked open orders — modify
    /// orders (`Update`/`Cancel`/`CancelAll`) act on existing entries rather
    /// than creating their own.
    pub fn initialize_orders(&mut self, orders: &[Order], opened_at: DateTime<Utc>) {
        for order in orders {
            if order.order_type.is_modify() {
                continue;
            }
            self.open_orders.insert(order.id, OrderState::new(order.clone(), opened_at));
        }
    }

    /// Transitions the open order `order_id` to `status`, moving it to the
    /// closed list if that status is terminal. Fails with `OrderNotFound` if
    /// the id isn't currently open (covers modify orders, which were never
    /// registered, and orders already closed).
    pub fn update_order(&mut self, order_id: OrderId, time: DateTime<Utc>, status: OrderStatus) -> QrResult<()> {
        let state = self.open_orders.get_mut(&order_id).ok_or(QrError::OrderNotFound { order_id })?;
        state.transition(status, time)?;
        if status.is_terminal() {
            let state = self.open_orders.remove(&order_id).expect("just looked up above");
            self.closed_orders.push(state);
        }
        Ok(())
    }

    /// Marks every held position at the latest price this event carries for
    /// its asset, leaving assets with no price action this step untouched.
    pub fn mark_positions(&mut self, event: &Event, price_type: PriceType) {
        let prices = event.prices();
        for (asset, position) in self.positions.iter_mut() {
            let Some(action) = prices.get(asset) else { continue };
            let price = action.price(price_type);
            if price.is_nan() {
                continue;
            }
            if let Some(price) = Decimal::from_f64_retain(price) {
                *position = position.mark(price);
            }
        }
    }

    /// `cash + Σ position.market_value`, converted into the base currency.
    /// Positions priced in a currency with no available rate are skipped —
    /// exercising that gap is the caller's responsibility (document in
    /// DESIGN.md rather than silently over/under-counting equity).
    pub fn equity(&self, rates: &dyn ExchangeRates, time: DateTime<Utc>) -> Amount {
        let mut total = self
            .cash
            .total_in(self.base_currency, rates, time)
            .map(|a| a.value)
            .unwrap_or(Decimal::ZERO);
        total += self.market_value(rates, time).value;
        Amount::new(self.base_currency, total)
    }

    /// `Σ convert(position.size * position.last_price)`, in the base currency.
    pub fn market_value(&self, rates: &dyn ExchangeRates, time: DateTime<Utc>) -> Amount {
        let mut total = Decimal::ZERO;
        for (asset, position) in &self.positions {
            let value = position.market_value(position.last_price);
            if let Some(converted) = rates.convert(Amount::new(asset.currency, value), self.base_currency, time) {
                total += converted.value;
            }
        }
        Amount::new(self.base_currency, total)
    }

    /// Absolute market value of long-only positions, in the base currency.
    pub fn long_exposure(&self, rates: &dyn ExchangeRates, time: DateTime<Utc>) -> Amount {
        self.exposure(rates, time, |p| p.is_long())
    }

    /// Absolute market value of short-only positions, in the base currency.
    pub fn short_exposure(&self, rates: &dyn ExchangeRates, time: DateTime<Utc>) -> Amount {
        self.exposure(rates, time, |p| p.is_short())
    }

    fn exposure(
        &self,
        rates: &dyn ExchangeRates,
        time: DateTime<Utc>,
        filter: impl Fn(&qrun_types::Position) -> bool,
    ) -> Amount {
        let mut total = Decimal::ZERO;
        for (asset, position) in &self.positions {
            if !filter(position) {
                continue;
            }
            let value = position.market_value(position.last_price).abs();
            if let Some(converted) = rates.convert(Amount::new(asset.currency, value), self.base_currency, time) {
                total += converted.value;
            }
        }
        Amount::new(self.base_currency, total)
    }

    /// Builds an immutable, defensive-copy snapshot of this account.
    pub fn to_account(&self, rates: &dyn ExchangeRates, buying_power: Amount) -> Account {
        Account {
            base_currency: self.base_currency,
            last_update: self.last_update,
            cash: self.cash.clone(),
            open_orders: self.open_orders.values().cloned().collect(),
            closed_orders: self.closed_orders.clone(),
            trades: self.trades.clone(),
            positions: self.positions.clone(),
            equity: self.equity(rates, self.last_update),
            buying_power,
        }
    }
}
