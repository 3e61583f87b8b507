//! The `Journal` contract consumed by the run loop (§4.8): observes every
//! step's event/account/orders triple and does whatever it wants with them
//! (record metrics, write a log, accumulate a time series).

use qrun_types::{Account, Event, Order};

pub trait Journal: Send {
    /// Called once per step, after the broker has processed `orders` against
    /// `event` and produced `account`.
    fn track(&mut self, event: &Event, account: &Account, orders: &[Order]);
}
