//! Event channel, feed, order execution engine, account model, simulated
//! broker and run loop for the qrun trading runtime.

pub mod account;
pub mod broker;
pub mod buying_power;
pub mod channel;
pub mod engine;
pub mod executor;
pub mod fee;
pub mod feed;
pub mod pricing;
pub mod run;

pub use account::InternalAccount;
pub use broker::SimBroker;
pub use buying_power::{AccountModel, CashAccount, MarginAccount};
pub use channel::{EventChannel, TimeFrame};
pub use engine::{Execution, ExecutionEngine};
pub use executor::{make_executor, BracketExecutor, OcoExecutor, OrderExecutor, OtoExecutor, SimpleExecutor};
pub use fee::{FeeModel, NoFee, Percentage};
pub use feed::{Feed, HistoricFeed};
pub use pricing::{NoCost, Pricing, PricingEngine, Spread};
pub use run::run;
