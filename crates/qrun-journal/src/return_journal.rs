//! A concrete [`Journal`]: records an equity-curve / drawdown time series,
//! the way `gb-risk::RiskMetricsCalculator` tracks drawdown against a
//! running equity peak, narrowed to what a backtest run needs without a
//! portfolio-wide VaR/CVaR calculation (out of scope here — no options or
//! multi-day return-history inputs to drive it).

use crate::journal::Journal;
use crate::metric::Metric;
use chrono::{DateTime, Utc};
use qrun_types::{Account, Event, Order};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// One step's equity-curve observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub time: DateTime<Utc>,
    pub equity: Decimal,
    /// Return since the previous recorded point.
    pub step_return: Decimal,
    /// Return since the journal's first recorded point.
    pub cumulative_return: Decimal,
    /// Fractional drawdown from the running equity peak, `0` at a new high.
    pub drawdown: Decimal,
}

/// A flattened view of the latest state, for callers that just want numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnSnapshot {
    pub equity: Decimal,
    pub cumulative_return: Decimal,
    pub current_drawdown: Decimal,
    pub max_drawdown: Decimal,
}

/// Tracks equity, running peak and drawdown across every step it observes.
pub struct ReturnJournal {
    initial_equity: Decimal,
    peak: Decimal,
    max_drawdown: Decimal,
    history: Vec<ReturnPoint>,
}

impl ReturnJournal {
    pub fn new(initial_equity: Decimal) -> Self {
        Self {
            initial_equity,
            peak: initial_equity,
            max_drawdown: Decimal::ZERO,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ReturnPoint] {
        &self.history
    }

    pub fn snapshot(&self) -> ReturnSnapshot {
        let last = self.history.last();
        ReturnSnapshot {
            equity: last.map(|p| p.equity).unwrap_or(self.initial_equity),
            cumulative_return: last.map(|p| p.cumulative_return).unwrap_or(Decimal::ZERO),
            current_drawdown: last.map(|p| p.drawdown).unwrap_or(Decimal::ZERO),
            max_drawdown: self.max_drawdown,
        }
    }
}

impl Journal for ReturnJournal {
    fn track(&mut self, event: &Event, account: &Account, _orders: &[Order]) {
        let equity = account.equity.value;
        if equity > self.peak {
            self.peak = equity;
        }
        let drawdown = if self.peak > Decimal::ZERO {
            ((self.peak - equity) / self.peak).max(Decimal::ZERO)
        } else {
            Decimal::ZERO
        };
        if drawdown > self.max_drawdown {
            self.max_drawdown = drawdown;
        }
        let cumulative_return = if self.initial_equity > Decimal::ZERO {
            (equity - self.initial_equity) / self.initial_equity
        } else {
            Decimal::ZERO
        };
        let step_return = match self.history.last() {
            Some(prev) if prev.equity > Decimal::ZERO => (equity - prev.equity) / prev.equity,
            _ => Decimal::ZERO,
        };
        debug!(time = %event.time, %equity, %drawdown, "return journal recorded step");
        self.history.push(ReturnPoint {
            time: event.time,
            equity,
            step_return,
            cumulative_return,
            drawdown,
        });
    }
}

impl Metric for ReturnJournal {
    fn name(&self) -> &str {
        "returns"
    }

    fn calculate(&self, _event: &Event, account: &Account, _orders: &[Order]) -> HashMap<String, f64> {
        let snapshot = self.snapshot();
        let mut map = HashMap::with_capacity(4);
        map.insert("equity".to_string(), account.equity.value.to_f64().unwrap_or(0.0));
        map.insert("cumulative_return".to_string(), snapshot.cumulative_return.to_f64().unwrap_or(0.0));
        map.insert("drawdown".to_string(), snapshot.current_drawdown.to_f64().unwrap_or(0.0));
        map.insert("max_drawdown".to_string(), snapshot.max_drawdown.to_f64().unwrap_or(0.0));
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrun_types::{Currency, OrderState, Position, Trade, Wallet};
    use rust_decimal_macros::dec;
    use std::collections::HashMap as StdHashMap;

    fn account_with_equity(equity: Decimal) -> Account {
        Account {
            base_currency: Currency::usd(),
            last_update: Utc::now(),
            cash: Wallet::single(qrun_types::Amount::new(Currency::usd(), equity)),
            open_orders: Vec::<OrderState>::new(),
            closed_orders: Vec::new(),
            trades: Vec::<Trade>::new(),
            positions: StdHashMap::<qrun_types::Asset, Position>::new(),
            equity: qrun_types::Amount::new(Currency::usd(), equity),
            buying_power: qrun_types::Amount::new(Currency::usd(), equity),
        }
    }

    #[test]
    fn drawdown_tracks_peak_and_recovers() {
        let mut journal = ReturnJournal::new(dec!(100_000));
        let t0 = Utc::now();

        journal.track(&Event::empty(t0), &account_with_equity(dec!(110_000)), &[]);
        assert_eq!(journal.snapshot().current_drawdown, dec!(0));

        journal.track(&Event::empty(t0), &account_with_equity(dec!(99_000)), &[]);
        let dd = (dec!(110_000) - dec!(99_000)) / dec!(110_000);
        assert_eq!(journal.snapshot().current_drawdown, dd);
        assert_eq!(journal.snapshot().max_drawdown, dd);

        journal.track(&Event::empty(t0), &account_with_equity(dec!(105_000)), &[]);
        assert_eq!(journal.snapshot().max_drawdown, dd, "max drawdown persists through a partial recovery");
        assert!(journal.snapshot().current_drawdown < dd);
    }

    #[test]
    fn cumulative_return_is_relative_to_first_deposit() {
        let mut journal = ReturnJournal::new(dec!(100_000));
        journal.track(&Event::empty(Utc::now()), &account_with_equity(dec!(120_000)), &[]);
        assert_eq!(journal.snapshot().cumulative_return, dec!(0.2));
    }

    #[test]
    fn metric_calculate_reflects_latest_snapshot() {
        let mut journal = ReturnJournal::new(dec!(100_000));
        let account = account_with_equity(dec!(90_000));
        journal.track(&Event::empty(Utc::now()), &account, &[]);
        let values = journal.calculate(&Event::empty(Utc::now()), &account, &[]);
        assert_eq!(values["equity"], 90_000.0);
        assert!(values["drawdown"] > 0.0);
    }
}
