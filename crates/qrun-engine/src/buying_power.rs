//! Buying-power policies (§4.6): cash and margin account models, both
//! converting into the account's base currency.
//!
//! Grounded in `gb-types::backtest`'s `AccountModel`-style trait-object
//! configuration knobs, narrowed to the two concrete policies the spec
//! names.

use crate::account::InternalAccount;
use chrono::{DateTime, Utc};
use qrun_types::{Amount, ExchangeRates};
use rust_decimal::Decimal;
use tracing::warn;

/// Computes the base-currency capital available for new positions.
pub trait AccountModel: Send + Sync {
    fn buying_power(&self, account: &InternalAccount, rates: &dyn ExchangeRates, time: DateTime<Utc>) -> Amount;
}

/// `buying_power = convert(cash, base) - minimum`. Short positions are
/// unsupported by a pure cash account but not rejected — a warning is
/// logged instead, matching the spec's documented limitation.
pub struct CashAccount {
    pub minimum: Decimal,
}

impl CashAccount {
    pub fn new(minimum: Decimal) -> Self {
        Self { minimum }
    }
}

impl Default for CashAccount {
    fn default() -> Self {
        Self::new(Decimal::ZERO)
    }
}

impl AccountModel for CashAccount {
    fn buying_power(&self, account: &InternalAccount, rates: &dyn ExchangeRates, time: DateTime<Utc>) -> Amount {
        if account.positions().values().any(|p| p.is_short()) {
            warn!("cash account holds a short position, which it does not model correctly");
        }
        let base = account.base_currency();
        let cash_total = account
            .cash()
            .total_in(base, rates, time)
            .map(|a| a.value)
            .unwrap_or(Decimal::ZERO);
        Amount::new(base, cash_total - self.minimum)
    }
}

/// Reg-T-style margin account:
/// ```text
/// long_value  = Σ_long  |size * price| * maint_long
/// short_value = Σ_short |size * price| * maint_short
/// excess      = (cash + market_value) - long_value - short_value - min_equity
/// buying_power = excess / initial_margin
/// ```
/// Open orders are not reserved against buying power — a documented
/// limitation carried over unchanged from the spec.
pub struct MarginAccount {
    pub initial_margin: Decimal,
    pub maint_long: Decimal,
    pub maint_short: Decimal,
    pub min_equity: Decimal,
}

impl MarginAccount {
    pub fn new(initial_margin: Decimal, maint_long: Decimal, maint_short: Decimal, min_equity: Decimal) -> Self {
        Self {
            initial_margin,
            maint_long,
            maint_short,
            min_equity,
        }
    }

    /// All three margin ratios set to `1 / leverage`.
    pub fn with_leverage(leverage: Decimal) -> Self {
        let margin = Decimal::ONE / leverage;
        Self::new(margin, margin, margin, Decimal::ZERO)
    }
}

impl AccountModel for MarginAccount {
    fn buying_power(&self, account: &InternalAccount, rates: &dyn ExchangeRates, time: DateTime<Utc>) -> Amount {
        let base = account.base_currency();
        let cash_total = account
            .cash()
            .total_in(base, rates, time)
            .map(|a| a.value)
            .unwrap_or(Decimal::ZERO);
        let market_value = account.market_value(rates, time).value;
        let long_value = account.long_exposure(rates, time).value * self.maint_long;
        let short_value = account.short_exposure(rates, time).value * self.maint_short;
        let excess = cash_total + market_value - long_value - short_value - self.min_equity;
        let buying_power = if self.initial_margin.is_zero() {
            Decimal::ZERO
        } else {
            excess / self.initial_margin
        };
        Amount::new(base, buying_power)
    }
}
