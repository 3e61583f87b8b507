use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{OnceLock, RwLock};

/// Instrument category traded by an [`Asset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    Stock,
    Forex,
    Future,
    Crypto,
    Option,
    Bond,
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetType::Stock => "STOCK",
            AssetType::Forex => "FOREX",
            AssetType::Future => "FUTURE",
            AssetType::Crypto => "CRYPTO",
            AssetType::Option => "OPTION",
            AssetType::Bond => "BOND",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for AssetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STOCK" => Ok(AssetType::Stock),
            "FOREX" => Ok(AssetType::Forex),
            "FUTURE" => Ok(AssetType::Future),
            "CRYPTO" => Ok(AssetType::Crypto),
            "OPTION" => Ok(AssetType::Option),
            "BOND" => Ok(AssetType::Bond),
            other => Err(format!("unknown asset type: {other}")),
        }
    }
}

/// A tradable instrument: symbol, type, currency and exchange.
///
/// Equality and hashing are by `symbol` alone, matching the "comparable by
/// symbol" contract — two assets with the same symbol but different
/// metadata are considered the same instrument (the metadata is expected to
/// agree once registered).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    pub asset_type: AssetType,
    pub currency: crate::currency::Currency,
    pub exchange: String,
}

impl Asset {
    pub fn new(
        symbol: impl Into<String>,
        asset_type: AssetType,
        currency: crate::currency::Currency,
        exchange: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            asset_type,
            currency,
            exchange: exchange.into(),
        }
    }

    pub fn stock(symbol: impl Into<String>, currency: crate::currency::Currency) -> Self {
        Self::new(symbol, AssetType::Stock, currency, "NYSE")
    }

    pub fn crypto(symbol: impl Into<String>, currency: crate::currency::Currency) -> Self {
        Self::new(symbol, AssetType::Crypto, currency, "BINANCE")
    }

    /// Canonical `symbol|type|currency|exchange` encoding. Empty fields are
    /// encoded as an empty segment so the asset round-trips through
    /// [`Asset::parse`].
    pub fn serialize(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.symbol, self.asset_type, self.currency, self.exchange
        )
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        let mut parts = s.splitn(4, '|');
        let symbol = parts.next().ok_or("missing symbol")?;
        let asset_type: AssetType = parts
            .next()
            .ok_or("missing asset type")?
            .parse()
            .map_err(|e| format!("invalid asset type: {e}"))?;
        let currency = parts
            .next()
            .ok_or("missing currency")?
            .parse()
            .map_err(|e: String| e)?;
        let exchange = parts.next().ok_or("missing exchange")?;
        if parts.next().is_some() {
            return Err(format!("malformed asset string: {s}"));
        }
        Ok(Self::new(symbol, asset_type, currency, exchange))
    }
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl Eq for Asset {}

impl std::hash::Hash for Asset {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.exchange, self.symbol)
    }
}

/// Trading exchange: a code, a UTC offset ("zone"), and wall-clock open/close
/// times. `minutes_offset` models the zone without pulling in a timezone
/// database dependency the rest of the corpus doesn't use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    pub code: &'static str,
    pub minutes_offset: i32,
    pub open_minute_of_day: u32,
    pub close_minute_of_day: u32,
}

impl Exchange {
    pub const fn new(
        code: &'static str,
        minutes_offset: i32,
        open_minute_of_day: u32,
        close_minute_of_day: u32,
    ) -> Self {
        Self {
            code,
            minutes_offset,
            open_minute_of_day,
            close_minute_of_day,
        }
    }

    /// Local wall-clock minute-of-day for an instant, given this exchange's zone.
    fn local_minute_of_day(&self, instant: chrono::DateTime<chrono::Utc>) -> (chrono::NaiveDate, u32) {
        let shifted = instant + chrono::Duration::minutes(self.minutes_offset as i64);
        let minute = (shifted.time().hour() * 60 + shifted.time().minute()) as u32;
        (shifted.date_naive(), minute)
    }

    /// Whether two instants fall on the same local trading day.
    pub fn same_day(
        &self,
        a: chrono::DateTime<chrono::Utc>,
        b: chrono::DateTime<chrono::Utc>,
    ) -> bool {
        self.local_minute_of_day(a).0 == self.local_minute_of_day(b).0
    }

    /// Whether the exchange is open (by wall-clock, ignoring weekends/holidays)
    /// at the given instant.
    pub fn is_open(&self, instant: chrono::DateTime<chrono::Utc>) -> bool {
        let (_, minute) = self.local_minute_of_day(instant);
        minute >= self.open_minute_of_day && minute < self.close_minute_of_day
    }
}

static EXCHANGE_REGISTRY: OnceLock<RwLock<HashMap<&'static str, Exchange>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<&'static str, Exchange>> {
    EXCHANGE_REGISTRY.get_or_init(|| {
        let mut map = HashMap::new();
        map.insert("NYSE", Exchange::new("NYSE", -300, 9 * 60 + 30, 16 * 60));
        map.insert("NASDAQ", Exchange::new("NASDAQ", -300, 9 * 60 + 30, 16 * 60));
        map.insert("BINANCE", Exchange::new("BINANCE", 0, 0, 24 * 60));
        RwLock::new(map)
    })
}

/// Process-wide read-mostly exchange registry. Call [`register_exchange`]
/// once at startup; after that, treat the registry as an immutable lookup
/// table (per the concurrency model's global-registry note).
pub fn register_exchange(exchange: Exchange) {
    registry().write().unwrap().insert(exchange.code, exchange);
}

pub fn lookup_exchange(code: &str) -> Option<Exchange> {
    registry().read().unwrap().get(code).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::Currency;
    use chrono::TimeZone;

    #[test]
    fn asset_equality_is_by_symbol_only() {
        let a = Asset::stock("AAPL", Currency::usd());
        let mut b = Asset::stock("AAPL", Currency::usd());
        b.exchange = "NASDAQ".into();
        assert_eq!(a, b);
    }

    #[test]
    fn asset_round_trips_through_string() {
        let a = Asset::new("EURUSD", AssetType::Forex, Currency::new("EUR"), "FOREX");
        let s = a.serialize();
        let parsed = Asset::parse(&s).unwrap();
        assert_eq!(parsed.symbol, a.symbol);
        assert_eq!(parsed.asset_type, a.asset_type);
        assert_eq!(parsed.currency, a.currency);
        assert_eq!(parsed.exchange, a.exchange);
    }

    #[test]
    fn registered_exchange_is_found() {
        let nasdaq = lookup_exchange("NASDAQ").expect("built-in NASDAQ exchange");
        assert_eq!(nasdaq.code, "NASDAQ");
    }

    #[test]
    fn crypto_exchange_is_24_7() {
        let binance = lookup_exchange("BINANCE").unwrap();
        let midnight = chrono::Utc.with_ymd_and_hms(2024, 1, 6, 0, 30, 0).unwrap();
        assert!(binance.is_open(midnight));
    }
}
