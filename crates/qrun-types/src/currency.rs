use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// ISO-4217-style three-letter currency code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Currency([u8; 3]);

impl Currency {
    pub fn new(code: &str) -> Self {
        code.parse().expect("currency code must be 3 ASCII letters")
    }

    pub fn usd() -> Self {
        Self::new("USD")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).expect("currency bytes are always ASCII")
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        let bytes = upper.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(format!("invalid currency code: {s}"));
        }
        Ok(Self([bytes[0], bytes[1], bytes[2]]))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Currency {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A monetary value denominated in a specific currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub currency: Currency,
    pub value: Decimal,
}

impl Amount {
    pub fn new(currency: Currency, value: Decimal) -> Self {
        Self { currency, value }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(currency, Decimal::ZERO)
    }

    /// Adds two amounts of the same currency. Panics on a currency mismatch,
    /// matching the teacher's convention of treating cross-currency
    /// arithmetic as a programming error the caller must convert away first.
    pub fn plus(&self, other: &Amount) -> Amount {
        assert_eq!(self.currency, other.currency, "currency mismatch in Amount::plus");
        Amount::new(self.currency, self.value + other.value)
    }

    pub fn minus(&self, other: &Amount) -> Amount {
        assert_eq!(self.currency, other.currency, "currency mismatch in Amount::minus");
        Amount::new(self.currency, self.value - other.value)
    }

    pub fn scale(&self, factor: Decimal) -> Amount {
        Amount::new(self.currency, self.value * factor)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.currency)
    }
}

/// Converts an amount between currencies at a point in time.
pub trait ExchangeRates: Send + Sync {
    /// Multiplier such that `1 unit of from == rate units of to`.
    fn rate(&self, from: Currency, to: Currency, time: DateTime<Utc>) -> Option<Decimal>;

    fn convert(&self, amount: Amount, to: Currency, time: DateTime<Utc>) -> Option<Amount> {
        if amount.currency == to {
            return Some(amount);
        }
        let rate = self.rate(amount.currency, to, time)?;
        Some(Amount::new(to, amount.value * rate))
    }
}

/// A static table of pairwise rates, all relative to a common base currency.
/// Grounded in the teacher's preference for simple, explicit conversion
/// tables over a live-rates provider (out of scope here).
#[derive(Debug, Clone, Default)]
pub struct FixedExchangeRates {
    base: Option<Currency>,
    rates_to_base: HashMap<Currency, Decimal>,
}

impl FixedExchangeRates {
    pub fn new(base: Currency) -> Self {
        let mut rates_to_base = HashMap::new();
        rates_to_base.insert(base, Decimal::ONE);
        Self {
            base: Some(base),
            rates_to_base,
        }
    }

    /// Registers `1 unit of currency == rate units of the base currency`.
    pub fn set_rate(&mut self, currency: Currency, rate_to_base: Decimal) {
        self.rates_to_base.insert(currency, rate_to_base);
    }
}

impl ExchangeRates for FixedExchangeRates {
    fn rate(&self, from: Currency, to: Currency, _time: DateTime<Utc>) -> Option<Decimal> {
        if from == to {
            return Some(Decimal::ONE);
        }
        let from_to_base = *self.rates_to_base.get(&from)?;
        let to_to_base = *self.rates_to_base.get(&to)?;
        if to_to_base.is_zero() {
            return None;
        }
        Some(from_to_base / to_to_base)
    }
}

/// A multi-currency holding of cash, keyed by currency.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    balances: HashMap<Currency, Decimal>,
}

impl Wallet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(amount: Amount) -> Self {
        let mut wallet = Self::new();
        wallet.deposit(amount);
        wallet
    }

    pub fn balance(&self, currency: Currency) -> Decimal {
        *self.balances.get(&currency).unwrap_or(&Decimal::ZERO)
    }

    pub fn deposit(&mut self, amount: Amount) {
        *self.balances.entry(amount.currency).or_insert(Decimal::ZERO) += amount.value;
    }

    pub fn withdraw(&mut self, amount: Amount) {
        *self.balances.entry(amount.currency).or_insert(Decimal::ZERO) -= amount.value;
    }

    /// Non-mutating sum of two wallets, one balance per currency either holds.
    pub fn added(&self, other: &Wallet) -> Wallet {
        let mut result = self.clone();
        for currency in other.currencies() {
            result.deposit(Amount::new(currency, other.balance(currency)));
        }
        result
    }

    /// Non-mutating difference: `self`'s balances minus `other`'s.
    pub fn subtracted(&self, other: &Wallet) -> Wallet {
        let mut result = self.clone();
        for currency in other.currencies() {
            result.withdraw(Amount::new(currency, other.balance(currency)));
        }
        result
    }

    /// Non-mutating scale of every balance by `factor`.
    pub fn scaled(&self, factor: Decimal) -> Wallet {
        Wallet {
            balances: self.balances.iter().map(|(&c, &v)| (c, v * factor)).collect(),
        }
    }

    pub fn currencies(&self) -> impl Iterator<Item = Currency> + '_ {
        self.balances.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.values().all(|v| v.is_zero())
    }

    /// Total value converted into a single currency; `None` if any
    /// non-zero balance lacks a usable rate.
    pub fn total_in(
        &self,
        target: Currency,
        rates: &dyn ExchangeRates,
        time: DateTime<Utc>,
    ) -> Option<Amount> {
        let mut total = Decimal::ZERO;
        for (&currency, &value) in &self.balances {
            if value.is_zero() {
                continue;
            }
            let converted = rates.convert(Amount::new(currency, value), target, time)?;
            total += converted.value;
        }
        Some(Amount::new(target, total))
    }
}

impl std::ops::Add<&Wallet> for &Wallet {
    type Output = Wallet;
    fn add(self, other: &Wallet) -> Wallet {
        self.added(other)
    }
}

impl std::ops::Sub<&Wallet> for &Wallet {
    type Output = Wallet;
    fn sub(self, other: &Wallet) -> Wallet {
        self.subtracted(other)
    }
}

impl std::ops::Mul<Decimal> for &Wallet {
    type Output = Wallet;
    fn mul(self, factor: Decimal) -> Wallet {
        self.scaled(factor)
    }
}

/// Derives cross-currency rates from the last-seen quote or trade price a
/// feed produced for a currency-pair asset (e.g. a `EURUSD` forex asset
/// standing in for the EUR/USD rate), rather than a static table.
///
/// Grounded in the same boundary the teacher draws between a configured
/// rates table and a feed-derived one (`gb-types::backtest`'s pluggable
/// pricing knobs): nothing here subscribes to a feed itself — a caller with
/// access to the concrete type calls [`FeedExchangeRates::observe`] with
/// each pair asset's price as it arrives, the same way account marks are
/// kept current, and reads rates back through the shared [`ExchangeRates`]
/// trait.
#[derive(Debug, Default)]
pub struct FeedExchangeRates {
    /// Which asset (by symbol) quotes the rate for a `(from, to)` pair, and
    /// in which direction: `true` if the asset's price is `to` per `from`
    /// (e.g. `EURUSD` quotes USD per EUR for the pair `(EUR, USD)`).
    pairs: HashMap<(Currency, Currency), (String, bool)>,
    last_price: std::sync::RwLock<HashMap<String, Decimal>>,
}

impl FeedExchangeRates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `asset_symbol` as the quote for converting `from` into
    /// `to`: `1 from == price to`.
    pub fn register_pair(&mut self, from: Currency, to: Currency, asset_symbol: impl Into<String>) {
        let symbol = asset_symbol.into();
        self.pairs.insert((from, to), (symbol.clone(), true));
        self.pairs.insert((to, from), (symbol, false));
    }

    /// Records the latest price seen for a registered pair asset. Called by
    /// the run loop/broker once per step with whatever price action the
    /// event carries for that asset, the same way position marks are kept
    /// current.
    pub fn observe(&self, asset_symbol: &str, price: Decimal) {
        self.last_price.write().unwrap().insert(asset_symbol.to_string(), price);
    }
}

impl ExchangeRates for FeedExchangeRates {
    fn rate(&self, from: Currency, to: Currency, _time: DateTime<Utc>) -> Option<Decimal> {
        if from == to {
            return Some(Decimal::ONE);
        }
        let (symbol, direct) = self.pairs.get(&(from, to))?;
        let price = *self.last_price.read().unwrap().get(symbol)?;
        if price.is_zero() {
            return None;
        }
        Some(if *direct { price } else { Decimal::ONE / price })
    }
}
