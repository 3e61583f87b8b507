//! Core data model and error taxonomy shared by the qrun trading runtime.

pub mod account;
pub mod action;
pub mod asset;
pub mod currency;
pub mod errors;
pub mod order;
pub mod series;
pub mod strategy;
pub mod trade;

pub use account::Account;
pub use action::{Action, Event, PriceType};
pub use asset::{register_exchange, lookup_exchange, Asset, AssetType, Exchange};
pub use currency::{Amount, Currency, ExchangeRates, FeedExchangeRates, FixedExchangeRates, Wallet};
pub use errors::{ChannelError, QrError, QrResult};
pub use order::{Order, OrderId, OrderIdGenerator, OrderState, OrderStatus, OrderType, TimeInForce};
pub use series::{MultiAssetPriceBarSeries, PriceBarSeries, PriceSeries};
pub use strategy::{Strategy, StrategyContext};
pub use trade::{Position, Trade};
