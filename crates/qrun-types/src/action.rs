use crate::asset::Asset;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which price field an [`Action`] is asked to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceType {
    Open,
    High,
    Low,
    Close,
    Typical,
    Weighted,
    Ask,
    Bid,
}

impl Default for PriceType {
    fn default() -> Self {
        PriceType::Close
    }
}

/// One market observation for a single asset, arriving as part of an
/// [`Event`]. A returned price of `NaN` is a valid "no data for this type"
/// sentinel rather than an error — callers that need certainty should check
/// `is_nan()` before trusting a value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Action {
    PriceBar {
        asset: Asset,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        /// Duration the bar covers, when the feed supplies one. Historic
        /// feeds built from daily-close files often don't know this.
        timespan: Option<chrono::Duration>,
    },
    TradePrice {
        asset: Asset,
        price: f64,
        volume: f64,
    },
    PriceQuote {
        asset: Asset,
        ask: f64,
        ask_size: f64,
        bid: f64,
        bid_size: f64,
    },
    OrderBook {
        asset: Asset,
        asks: Vec<(f64, f64)>,
        bids: Vec<(f64, f64)>,
    },
    CorporateAction {
        asset: Asset,
        kind: String,
        value: f64,
    },
    NewsItems {
        items: Vec<String>,
    },
}

impl Action {
    pub fn asset(&self) -> Option<&Asset> {
        match self {
            Action::PriceBar { asset, .. }
            | Action::TradePrice { asset, .. }
            | Action::PriceQuote { asset, .. }
            | Action::OrderBook { asset, .. }
            | Action::CorporateAction { asset, .. } => Some(asset),
            Action::NewsItems { .. } => None,
        }
    }

    /// The requested price field, or `NaN` when this action doesn't carry
    /// that field.
    pub fn price(&self, price_type: PriceType) -> f64 {
        match (self, price_type) {
            (Action::PriceBar { open, .. }, PriceType::Open) => *open,
            (Action::PriceBar { high, .. }, PriceType::High) => *high,
            (Action::PriceBar { low, .. }, PriceType::Low) => *low,
            (Action::PriceBar { close, .. }, PriceType::Close) => *close,
            (Action::PriceBar { high, low, close, .. }, PriceType::Typical) => {
                (*high + *low + *close) / 3.0
            }
            (Action::PriceBar { high, low, close, .. }, PriceType::Weighted) => {
                (*high + *low + 2.0 * *close) / 4.0
            }
            (Action::TradePrice { price, .. }, _) => *price,
            (Action::PriceQuote { ask, .. }, PriceType::Ask) => *ask,
            (Action::PriceQuote { bid, .. }, PriceType::Bid) => *bid,
            (Action::PriceQuote { ask, bid, .. }, _) => (*ask + *bid) / 2.0,
            (Action::OrderBook { asks, .. }, PriceType::Ask) => {
                asks.first().map(|(p, _)| *p).unwrap_or(f64::NAN)
            }
            (Action::OrderBook { bids, .. }, PriceType::Bid) => {
                bids.first().map(|(p, _)| *p).unwrap_or(f64::NAN)
            }
            (Action::OrderBook { asks, bids, .. }, _) => {
                match (asks.first(), bids.first()) {
                    (Some((a, _)), Some((b, _))) => (*a + *b) / 2.0,
                    _ => f64::NAN,
                }
            }
            _ => f64::NAN,
        }
    }
}

/// A single instant in time carrying zero or more [`Action`]s across
/// possibly many assets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub time: DateTime<Utc>,
    pub actions: Vec<Action>,
}

impl Event {
    pub fn new(time: DateTime<Utc>, actions: Vec<Action>) -> Self {
        Self { time, actions }
    }

    pub fn empty(time: DateTime<Utc>) -> Self {
        Self::new(time, Vec::new())
    }

    /// Latest action per asset within this event; when an asset appears more
    /// than once the later entry in `actions` wins.
    pub fn prices(&self) -> HashMap<&Asset, &Action> {
        let mut map = HashMap::new();
        for action in &self.actions {
            if let Some(asset) = action.asset() {
                map.insert(asset, action);
            }
        }
        map
    }
}
