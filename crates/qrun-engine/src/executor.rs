use crate::fee::FeeModel;
use crate::pricing::Pricing;
use chrono::{DateTime, Utc};
use qrun_types::{lookup_exchange, Asset, Order, OrderId, OrderStatus, OrderType, QrError, QrResult, Trade};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// A running order: the state machine that decides, step by step, whether
/// an order is ready to fill against the current price action.
///
/// Every concrete executor starts in `OrderStatus::Accepted` (construction
/// implies the order already passed validation) and moves only forward
/// through `OrderStatus::Completed`, `Cancelled`, `Expired` or `Rejected` —
/// once in one of those terminal states it never changes again.
pub trait OrderExecutor: Send + Sync {
    fn order_id(&self) -> OrderId;
    fn asset(&self) -> &Asset;
    fn status(&self) -> OrderStatus;

    fn is_done(&self) -> bool {
        self.status().is_terminal()
    }

    /// Advances the executor by one step. `pricing` is `Some` only when
    /// this step's event carried a price action for this executor's asset.
    /// Returns every trade produced this step (zero or one for a simple
    /// order, possibly more than one for a composite order whose children
    /// both become triggerable in the same step).
    fn step(
        &mut self,
        time: DateTime<Utc>,
        pricing: Option<&dyn Pricing>,
        fees: &dyn FeeModel,
    ) -> QrResult<Vec<Trade>>;

    fn cancel(&mut self, time: DateTime<Utc>);
}

/// Whether `order`, opened at `opened_at`, is expired at `now` under its
/// time-in-force. `Gtc`/`Gtd` expire by wall-clock date via
/// `TimeInForce::expires_at`; `Day` instead expires the moment `now` falls
/// on a different exchange trading day than `opened_at` (§4.2), which needs
/// the order's exchange rather than a fixed instant.
fn check_expiry(order: &Order, opened_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    if matches!(order.tif.expires_at(opened_at), Some(expiry) if now >= expiry) {
        return true;
    }
    if matches!(order.tif, qrun_types::TimeInForce::Day) {
        if let Some(exchange) = lookup_exchange(&order.asset.exchange) {
            return !exchange.same_day(opened_at, now);
        }
    }
    false
}

fn make_trade(order: &Order, time: DateTime<Utc>, price: f64, fees: &dyn FeeModel) -> Trade {
    let price = Decimal::from_f64_retain(price).unwrap_or(Decimal::ZERO);
    let fee = fees.fee(order.size, price);
    Trade {
        time,
        asset: order.asset.clone(),
        order_id: order.id,
        size: order.size,
        price,
        fee,
        pnl: Decimal::ZERO,
    }
}

/// Handles every non-composite order kind: Market, Limit, Stop, StopLimit,
/// Trail and TrailLimit. Trailing orders carry an `extreme` watermark that
/// only updates while the order is live.
pub struct SimpleExecutor {
    order: Order,
    status: OrderStatus,
    opened_at: DateTime<Utc>,
    triggered: bool,
    extreme: Option<f64>,
}

impl SimpleExecutor {
    pub fn new(order: Order, opened_at: DateTime<Utc>) -> Self {
        Self {
            order,
            status: OrderStatus::Accepted,
            opened_at,
            triggered: false,
            extreme: None,
        }
    }

    fn to_f64(d: Decimal) -> f64 {
        d.to_f64().unwrap_or(0.0)
    }

    fn trigger_price(&mut self, pricing: &dyn Pricing) -> Option<f64> {
        let is_buy = self.order.is_buy();
        match &self.order.order_type {
            OrderType::Market => Some(pricing.market_price(self.order.size)),
            OrderType::Limit { limit } => {
                let limit = Self::to_f64(*limit);
                if is_buy && pricing.low_price() <= limit {
                    Some(limit.min(pricing.market_price(self.order.size)))
                } else if !is_buy && pricing.high_price() >= limit {
                    Some(limit.max(pricing.market_price(self.order.size)))
                } else {
                    None
                }
            }
            OrderType::Stop { stop } => {
                let stop = Self::to_f64(*stop);
                let hit = if is_buy {
                    pricing.high_price() >= stop
                } else {
                    pricing.low_price() <= stop
                };
                hit.then(|| pricing.market_price(self.order.size))
            }
            OrderType::StopLimit { stop, limit } => {
                let stop = Self::to_f64(*stop);
                let limit = Self::to_f64(*limit);
                if !self.triggered {
                    let hit = if is_buy {
                        pricing.high_price() >= stop
                    } else {
                        pricing.low_price() <= stop
                    };
                    if hit {
                        self.triggered = true;
                    }
                }
                if !self.triggered {
                    return None;
                }
                if is_buy && pricing.low_price() <= limit {
                    Some(limit.min(pricing.market_price(self.order.size)))
                } else if !is_buy && pricing.high_price() >= limit {
                    Some(limit.max(pricing.market_price(self.order.size)))
                } else {
                    None
                }
            }
            OrderType::Trail { trail_pct } => {
                let trail_pct = Self::to_f64(*trail_pct);
                self.update_extreme(pricing, is_buy);
                let extreme = self.extreme?;
                let stop = if is_buy {
                    extreme * (1.0 + trail_pct)
                } else {
                    extreme * (1.0 - trail_pct)
                };
                let hit = if is_buy {
                    pricing.high_price() >= stop
                } else {
                    pricing.low_price() <= stop
                };
                hit.then(|| pricing.market_price(self.order.size))
            }
            OrderType::TrailLimit {
                trail_pct,
                limit_offset,
            } => {
                let trail_pct = Self::to_f64(*trail_pct);
                let limit_offset = Self::to_f64(*limit_offset);
                self.update_extreme(pricing, is_buy);
                let extreme = self.extreme?;
                let stop = if is_buy {
                    extreme * (1.0 + trail_pct)
                } else {
                    extreme * (1.0 - trail_pct)
                };
                if !self.triggered {
                    let hit = if is_buy {
                        pricing.high_price() >= stop
                    } else {
                        pricing.low_price() <= stop
                    };
                    if hit {
                        self.triggered = true;
                    }
                }
                if !self.triggered {
                    return None;
                }
                let limit = if is_buy {
                    stop + limit_offset
                } else {
                    stop - limit_offset
                };
                if is_buy && pricing.low_price() <= limit {
                    Some(limit.min(pricing.market_price(self.order.size)))
                } else if !is_buy && pricing.high_price() >= limit {
                    Some(limit.max(pricing.market_price(self.order.size)))
                } else {
                    None
                }
            }
            other => {
                warn!(order_type = ?other, "SimpleExecutor cannot handle composite/modify order type");
                None
            }
        }
    }

    fn update_extreme(&mut self, pricing: &dyn Pricing, is_buy: bool) {
        let candidate = if is_buy { pricing.low_price() } else { pricing.high_price() };
        self.extreme = Some(match self.extreme {
            None => candidate,
            Some(current) if is_buy => current.min(candidate),
            Some(current) => current.max(candidate),
        });
    }
}

impl OrderExecutor for SimpleExecutor {
    fn order_id(&self) -> OrderId {
        self.order.id
    }

    fn asset(&self) -> &Asset {
        &self.order.asset
    }

    fn status(&self) -> OrderStatus {
        self.status
    }

    fn step(
        &mut self,
        time: DateTime<Utc>,
        pricing: Option<&dyn Pricing>,
        fees: &dyn FeeModel,
    ) -> QrResult<Vec<Trade>> {
        if self.status.is_terminal() {
            return Ok(Vec::new());
        }
        if check_expiry(&self.order, self.opened_at, time) {
            self.status = OrderStatus::Expired;
            debug!(order_id = self.order.id, "order expired under its time-in-force");
            return Ok(Vec::new());
        }
        let Some(pricing) = pricing else {
            if matches!(self.order.tif, qrun_types::TimeInForce::Ioc | qrun_types::TimeInForce::Fok) {
                self.status = OrderStatus::Expired;
            }
            return Ok(Vec::new());
        };
        match self.trigger_price(pricing) {
            Some(price) => {
                let trade = make_trade(&self.order, time, price, fees);
                self.status = OrderStatus::Completed;
                debug!(order_id = self.order.id, price, "order filled");
                Ok(vec![trade])
            }
            None => {
                if matches!(self.order.tif, qrun_types::TimeInForce::Ioc | qrun_types::TimeInForce::Fok) {
                    self.status = OrderStatus::Expired;
                }
                Ok(Vec::new())
            }
        }
    }

    fn cancel(&mut self, _time: DateTime<Utc>) {
        if !self.status.is_terminal() {
            self.status = OrderStatus::Cancelled;
        }
    }
}

/// An entry order followed by a take-profit/stop-loss pair that is only
/// submitted once the entry fills, and which cancels its sibling the moment
/// either leg fills — the coordination role of a bracket order.
pub struct BracketExecutor {
    id: OrderId,
    asset: Asset,
    status: OrderStatus,
    entry: Box<dyn OrderExecutor>,
    exit: Option<OcoExecutor>,
    take_profit: Option<Order>,
    stop_loss: Option<Order>,
}

impl BracketExecutor {
    pub fn new(id: OrderId, asset: Asset, entry: Order, take_profit: Order, stop_loss: Order, opened_at: DateTime<Utc>) -> Self {
        Self {
            id,
            asset,
            status: OrderStatus::Accepted,
            entry: make_executor(entry, opened_at),
            exit: None,
            take_profit: Some(take_profit),
            stop_loss: Some(stop_loss),
        }
    }
}

impl OrderExecutor for BracketExecutor {
    fn order_id(&self) -> OrderId {
        self.id
    }

    fn asset(&self) -> &Asset {
        &self.asset
    }

    fn status(&self) -> OrderStatus {
        self.status
    }

    fn step(
        &mut self,
        time: DateTime<Utc>,
        pricing: Option<&dyn Pricing>,
        fees: &dyn FeeModel,
    ) -> QrResult<Vec<Trade>> {
        if self.status.is_terminal() {
            return Ok(Vec::new());
        }
        if let Some(exit) = self.exit.as_mut() {
            let trades = exit.step(time, pricing, fees)?;
            if exit.is_done() {
                self.status = exit.status();
            }
            return Ok(trades);
        }
        let trades = self.entry.step(time, pricing, fees)?;
        if self.entry.is_done() {
            if self.entry.status() == OrderStatus::Completed {
                let tp = self.take_profit.take().expect("bracket take-profit present until activated");
                let sl = self.stop_loss.take().expect("bracket stop-loss present until activated");
                let mut oco = OcoExecutor::new(self.id, self.asset.clone(), tp, sl, time);
                let oco_trades = oco.step(time, pricing, fees)?;
                if oco.is_done() {
                    self.status = oco.status();
                }
                self.exit = Some(oco);
                let mut all = trades;
                all.extend(oco_trades);
                return Ok(all);
            }
            self.status = self.entry.status();
        }
        Ok(trades)
    }

    fn cancel(&mut self, time: DateTime<Utc>) {
        if self.status.is_terminal() {
            return;
        }
        match self.exit.as_mut() {
            Some(exit) => exit.cancel(time),
            None => self.entry.cancel(time),
        }
        self.status = OrderStatus::Cancelled;
    }
}

/// Two orders where the first fill cancels the other.
pub struct OcoExecutor {
    id: OrderId,
    asset: Asset,
    status: OrderStatus,
    first: Box<dyn OrderExecutor>,
    second: Box<dyn OrderExecutor>,
}

impl OcoExecutor {
    pub fn new(id: OrderId, asset: Asset, first: Order, second: Order, opened_at: DateTime<Utc>) -> Self {
        Self {
            id,
            asset,
            status: OrderStatus::Accepted,
            first: make_executor(first, opened_at),
            second: make_executor(second, opened_at),
        }
    }
}

impl OrderExecutor for OcoExecutor {
    fn order_id(&self) -> OrderId {
        self.id
    }

    fn asset(&self) -> &Asset {
        &self.asset
    }

    fn status(&self) -> OrderStatus {
        self.status
    }

    fn step(
        &mut self,
        time: DateTime<Utc>,
        pricing: Option<&dyn Pricing>,
        fees: &dyn FeeModel,
    ) -> QrResult<Vec<Trade>> {
        if self.status.is_terminal() {
            return Ok(Vec::new());
        }
        let mut trades = Vec::new();

        if !self.first.is_done() {
            trades.extend(self.first.step(time, pricing, fees)?);
        }
        if self.first.status() == OrderStatus::Completed {
            self.second.cancel(time);
            self.status = OrderStatus::Completed;
            return Ok(trades);
        }

        if !self.second.is_done() {
            trades.extend(self.second.step(time, pricing, fees)?);
        }
        if self.second.status() == OrderStatus::Completed {
            self.first.cancel(time);
            self.status = OrderStatus::Completed;
            return Ok(trades);
        }

        // Neither leg filled this step. Only a fill resolves an OCO (§4.4);
        // an expired/cancelled leg simply drops out of routing and the
        // sibling keeps going. If both legs are now terminal without
        // either having filled, the composite follows them.
        if self.first.is_done() && self.second.is_done() {
            self.status = self.second.status();
        }
        Ok(trades)
    }

    fn cancel(&mut self, time: DateTime<Utc>) {
        if self.status.is_terminal() {
            return;
        }
        self.first.cancel(time);
        self.second.cancel(time);
        self.status = OrderStatus::Cancelled;
    }
}

/// A first order whose completion activates a second order.
pub struct OtoExecutor {
    id: OrderId,
    asset: Asset,
    status: OrderStatus,
    first: Box<dyn OrderExecutor>,
    second_order: Option<Order>,
    second: Option<Box<dyn OrderExecutor>>,
}

impl OtoExecutor {
    pub fn new(id: OrderId, asset: Asset, first: Order, second: Order, opened_at: DateTime<Utc>) -> Self {
        Self {
            id,
            asset,
            status: OrderStatus::Accepted,
            first: make_executor(first, opened_at),
            second_order: Some(second),
            second: None,
        }
    }
}

impl OrderExecutor for OtoExecutor {
    fn order_id(&self) -> OrderId {
        self.id
    }

    fn asset(&self) -> &Asset {
        &self.asset
    }

    fn status(&self) -> OrderStatus {
        self.status
    }

    fn step(
        &mut self,
        time: DateTime<Utc>,
        pricing: Option<&dyn Pricing>,
        fees: &dyn FeeModel,
    ) -> QrResult<Vec<Trade>> {
        if self.status.is_terminal() {
            return Ok(Vec::new());
        }
        if let Some(second) = self.second.as_mut() {
            let trades = second.step(time, pricing, fees)?;
            if second.is_done() {
                self.status = second.status();
            }
            return Ok(trades);
        }
        let trades = self.first.step(time, pricing, fees)?;
        if self.first.is_done() {
            if self.first.status() != OrderStatus::Completed {
                self.status = self.first.status();
                return Ok(trades);
            }
            let second_order = self.second_order.take().expect("oto second leg present until activated");
            let mut second = make_executor(second_order, time);
            let second_trades = second.step(time, pricing, fees)?;
            if second.is_done() {
                self.status = second.status();
            }
            self.second = Some(second);
            let mut all = trades;
            all.extend(second_trades);
            return Ok(all);
        }
        Ok(trades)
    }

    fn cancel(&mut self, time: DateTime<Utc>) {
        if self.status.is_terminal() {
            return;
        }
        match self.second.as_mut() {
            Some(second) => second.cancel(time),
            None => self.first.cancel(time),
        }
        self.status = OrderStatus::Cancelled;
    }
}

/// Builds the executor appropriate to `order`'s kind. This is the factory
/// side of the order-type-keyed executor registry described by the
/// execution engine; kept as a plain function here since a `match` on a
/// closed, known set of discriminants is the idiomatic registry for a sum
/// type (the engine wraps calls to it behind a lookup table so new kinds
/// can be registered without editing this function, see
/// `execution_engine::ExecutorRegistry`).
pub fn make_executor(order: Order, opened_at: DateTime<Utc>) -> Box<dyn OrderExecutor> {
    let id = order.id;
    let asset = order.asset.clone();
    match order.order_type {
        OrderType::Bracket {
            entry,
            take_profit,
            stop_loss,
        } => Box::new(BracketExecutor::new(id, asset, *entry, *take_profit, *stop_loss, opened_at)),
        OrderType::Oco { first, second } => Box::new(OcoExecutor::new(id, asset, *first, *second, opened_at)),
        OrderType::Oto { first, second } => Box::new(OtoExecutor::new(id, asset, *first, *second, opened_at)),
        _ => Box::new(SimpleExecutor::new(order, opened_at)),
    }
}

/// An executor that's already rejected, used when validation fails before
/// an order is ever accepted (e.g. a Modify referencing an unknown id).
pub struct RejectedExecutor {
    id: OrderId,
    asset: Asset,
}

impl RejectedExecutor {
    pub fn new(id: OrderId, asset: Asset) -> Self {
        Self { id, asset }
    }
}

impl OrderExecutor for RejectedExecutor {
    fn order_id(&self) -> OrderId {
        self.id
    }

    fn asset(&self) -> &Asset {
        &self.asset
    }

    fn status(&self) -> OrderStatus {
        OrderStatus::Rejected
    }

    fn step(&mut self, _time: DateTime<Utc>, _pricing: Option<&dyn Pricing>, _fees: &dyn FeeModel) -> QrResult<Vec<Trade>> {
        Err(QrError::Internal(format!("executor for order {} is already rejected", self.id)))
    }

    fn cancel(&mut self, _time: DateTime<Utc>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::{NoCost, PricingEngine};
    use qrun_types::{Action, Currency, TimeInForce};
    use rust_decimal_macros::dec;

    fn asset() -> Asset {
        Asset::stock("AAPL", Currency::usd())
    }

    fn bar(close: f64, low: f64, high: f64) -> Action {
        Action::PriceBar {
            asset: asset(),
            open: close,
            high,
            low,
            close,
            volume: 100.0,
            timespan: None,
        }
    }

    fn pricing_for(action: &Action) -> Box<dyn Pricing> {
        NoCost.pricing(action)
    }

    #[test]
    fn market_order_fills_on_first_step() {
        let order = Order::new(1, asset(), dec!(10), OrderType::Market);
        let mut executor = make_executor(order, Utc::now());
        let action = bar(100.0, 99.0, 101.0);
        let pricing = pricing_for(&action);
        let trades = executor.step(Utc::now(), Some(pricing.as_ref()), &crate::fee::NoFee).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(executor.status(), OrderStatus::Completed);
    }

    #[test]
    fn buy_limit_waits_until_low_touches_limit() {
        let order = Order::new(1, asset(), dec!(10), OrderType::Limit { limit: dec!(95) });
        let mut executor = make_executor(order, Utc::now());
        let too_high = bar(100.0, 98.0, 101.0);
        let pricing = pricing_for(&too_high);
        let trades = executor.step(Utc::now(), Some(pricing.as_ref()), &crate::fee::NoFee).unwrap();
        assert!(trades.is_empty());
        assert_eq!(executor.status(), OrderStatus::Accepted);

        let touches = bar(96.0, 94.0, 98.0);
        let pricing2 = pricing_for(&touches);
        let trades2 = executor.step(Utc::now(), Some(pricing2.as_ref()), &crate::fee::NoFee).unwrap();
        assert_eq!(trades2.len(), 1);
        assert_eq!(executor.status(), OrderStatus::Completed);
    }

    #[test]
    fn ioc_order_expires_when_it_cannot_fill_immediately() {
        let order = Order::new(1, asset(), dec!(10), OrderType::Limit { limit: dec!(50) })
            .with_tif(TimeInForce::Ioc);
        let mut executor = make_executor(order, Utc::now());
        let action = bar(100.0, 99.0, 101.0);
        let pricing = pricing_for(&action);
        let trades = executor.step(Utc::now(), Some(pricing.as_ref()), &crate::fee::NoFee).unwrap();
        assert!(trades.is_empty());
        assert_eq!(executor.status(), OrderStatus::Expired);
    }

    #[test]
    fn day_order_expires_once_the_exchange_trading_day_rolls_over() {
        use chrono::TimeZone;
        // AAPL trades on NYSE; opened_at and now are a calendar day apart in
        // NYSE wall-clock time, so the order should expire even though
        // nothing else about it changed.
        let opened_at = Utc.with_ymd_and_hms(2024, 1, 8, 15, 0, 0).unwrap();
        let next_day = Utc.with_ymd_and_hms(2024, 1, 9, 15, 0, 0).unwrap();
        let order = Order::new(1, asset(), dec!(10), OrderType::Limit { limit: dec!(50) })
            .with_tif(TimeInForce::Day);
        let mut executor = make_executor(order, opened_at);
        let action = bar(100.0, 99.0, 101.0);
        let pricing = pricing_for(&action);
        let trades = executor.step(next_day, Some(pricing.as_ref()), &crate::fee::NoFee).unwrap();
        assert!(trades.is_empty());
        assert_eq!(executor.status(), OrderStatus::Expired);
    }

    #[test]
    fn day_order_stays_open_within_the_same_exchange_trading_day() {
        use chrono::TimeZone;
        let opened_at = Utc.with_ymd_and_hms(2024, 1, 8, 15, 0, 0).unwrap();
        let later_same_day = Utc.with_ymd_and_hms(2024, 1, 8, 19, 0, 0).unwrap();
        let order = Order::new(1, asset(), dec!(10), OrderType::Limit { limit: dec!(50) })
            .with_tif(TimeInForce::Day);
        let mut executor = make_executor(order, opened_at);
        let action = bar(100.0, 99.0, 101.0);
        let pricing = pricing_for(&action);
        let trades = executor.step(later_same_day, Some(pricing.as_ref()), &crate::fee::NoFee).unwrap();
        assert!(trades.is_empty());
        assert_eq!(executor.status(), OrderStatus::Accepted);
    }

    #[test]
    fn oco_cancels_sibling_on_first_fill() {
        let take_profit = Order::new(2, asset(), dec!(-10), OrderType::Limit { limit: dec!(110) });
        let stop_loss = Order::new(3, asset(), dec!(-10), OrderType::Stop { stop: dec!(90) });
        let mut executor = OcoExecutor::new(1, asset(), take_profit, stop_loss, Utc::now());
        let action = bar(111.0, 109.0, 112.0);
        let pricing = pricing_for(&action);
        let trades = executor.step(Utc::now(), Some(pricing.as_ref()), &crate::fee::NoFee).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(executor.status(), OrderStatus::Completed);
    }

    #[test]
    fn oco_leaves_sibling_live_when_a_leg_merely_expires() {
        // First leg is IOC and cannot fill immediately, so it expires on
        // the first step; that must not cancel the still-live second leg
        // (§4.4 resolves OCO only on a fill, never on an expiry).
        let first = Order::new(2, asset(), dec!(-10), OrderType::Limit { limit: dec!(200) })
            .with_tif(TimeInForce::Ioc);
        let second = Order::new(3, asset(), dec!(-10), OrderType::Stop { stop: dec!(90) });
        let mut executor = OcoExecutor::new(1, asset(), first, second, Utc::now());

        let no_fill = bar(100.0, 99.0, 101.0);
        let pricing1 = pricing_for(&no_fill);
        let trades1 = executor.step(Utc::now(), Some(pricing1.as_ref()), &crate::fee::NoFee).unwrap();
        assert!(trades1.is_empty());
        assert_eq!(executor.status(), OrderStatus::Accepted, "expiry of one leg must not resolve the composite");

        let triggers_stop = bar(85.0, 80.0, 86.0);
        let pricing2 = pricing_for(&triggers_stop);
        let trades2 = executor.step(Utc::now(), Some(pricing2.as_ref()), &crate::fee::NoFee).unwrap();
        assert_eq!(trades2.len(), 1);
        assert_eq!(executor.status(), OrderStatus::Completed);
    }

    #[test]
    fn bracket_activates_exit_leg_only_after_entry_fills() {
        let entry = Order::new(2, asset(), dec!(10), OrderType::Market);
        let take_profit = Order::new(3, asset(), dec!(-10), OrderType::Limit { limit: dec!(110) });
        let stop_loss = Order::new(4, asset(), dec!(-10), OrderType::Stop { stop: dec!(90) });
        let mut executor = BracketExecutor::new(1, asset(), entry, take_profit, stop_loss, Utc::now());

        let entry_bar = bar(100.0, 99.0, 101.0);
        let pricing = pricing_for(&entry_bar);
        let trades = executor.step(Utc::now(), Some(pricing.as_ref()), &crate::fee::NoFee).unwrap();
        assert_eq!(trades.len(), 1, "entry should fill immediately as a market order");
        assert_eq!(executor.status(), OrderStatus::Accepted, "bracket stays open until an exit leg fills");

        let exit_bar = bar(111.0, 109.0, 112.0);
        let pricing2 = pricing_for(&exit_bar);
        let trades2 = executor.step(Utc::now(), Some(pricing2.as_ref()), &crate::fee::NoFee).unwrap();
        assert_eq!(trades2.len(), 1);
        assert_eq!(executor.status(), OrderStatus::Completed);
    }
}
