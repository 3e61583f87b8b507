//! The `Metric` contract: a stateless snapshot calculator in the
//! `RiskMetricsCalculator` mould — takes the inputs for one step and
//! produces a flat `{name -> value}` map a journal can log or chart.

use qrun_types::{Account, Event, Order};
use std::collections::HashMap;

/// A named, stateless computation over one step's observables.
///
/// The originating spec's `calculate(event, account, signals, orders)`
/// carries a `signals` parameter that is never defined anywhere else in the
/// spec (no type, no producer, no consumer) — dropped here rather than
/// invented; see DESIGN.md.
pub trait Metric: Send + Sync {
    fn name(&self) -> &str;

    fn calculate(&self, event: &Event, account: &Account, orders: &[Order]) -> HashMap<String, f64>;
}
