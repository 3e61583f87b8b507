use crate::asset::Asset;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stable numeric identifier assigned to an order when it's created.
pub type OrderId = u64;

/// How long an order remains eligible to execute once accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-'til-cancelled, expiring after `max_days` calendar days.
    Gtc { max_days: i64 },
    /// Good-'til-date: expires at the end of the given day.
    Gtd { date: DateTime<Utc> },
    /// Expires at the end of the current trading day.
    Day,
    /// Immediate-or-cancel: fill what can be filled immediately, cancel the rest.
    Ioc,
    /// Fill-or-kill: fill the entire order immediately or cancel all of it.
    Fok,
}

impl Default for TimeInForce {
    fn default() -> Self {
        TimeInForce::Gtc { max_days: 90 }
    }
}

impl TimeInForce {
    /// The instant at or after which an order with this TIF, opened at
    /// `opened_at`, is no longer eligible to execute. `None` for TIFs that
    /// expire on a same-step/same-day basis rather than by wall-clock date.
    pub fn expires_at(&self, opened_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TimeInForce::Gtc { max_days } => Some(opened_at + chrono::Duration::days(*max_days)),
            TimeInForce::Gtd { date } => Some(*date),
            TimeInForce::Day | TimeInForce::Ioc | TimeInForce::Fok => None,
        }
    }
}

/// The kind of order, carrying whatever parameters that kind needs.
///
/// Roboquant-style order class hierarchies are flattened here into one enum
/// with payload variants, keyed by discriminant for the executor registry —
/// `Create`/`Modify` aren't distinct Rust types, just distinct variants of
/// the same sum type, matching every other order's shared
/// asset/size/id/tag/tif fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit { limit: Decimal },
    Stop { stop: Decimal },
    StopLimit { stop: Decimal, limit: Decimal },
    Trail { trail_pct: Decimal },
    TrailLimit { trail_pct: Decimal, limit_offset: Decimal },
    Bracket {
        entry: Box<Order>,
        take_profit: Box<Order>,
        stop_loss: Box<Order>,
    },
    Oco { first: Box<Order>, second: Box<Order> },
    Oto { first: Box<Order>, second: Box<Order> },
    /// Replace the order identified by `target` with `new` (same id).
    Update { target: OrderId, new: Box<Order> },
    /// Cancel the order identified by `target`.
    Cancel { target: OrderId },
    /// Cancel every open order for the owning strategy.
    CancelAll,
}

impl OrderType {
    pub fn is_modify(&self) -> bool {
        matches!(self, OrderType::Update { .. } | OrderType::Cancel { .. } | OrderType::CancelAll)
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, OrderType::Bracket { .. } | OrderType::Oco { .. } | OrderType::Oto { .. })
    }
}

/// A single order: asset, signed size (positive = buy, negative = sell), a
/// stable numeric id, an optional free-form tag, a kind, and a
/// time-in-force.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub asset: Asset,
    pub size: Decimal,
    pub order_type: OrderType,
    pub tif: TimeInForce,
    pub tag: Option<String>,
}

impl Order {
    pub fn new(id: OrderId, asset: Asset, size: Decimal, order_type: OrderType) -> Self {
        Self {
            id,
            asset,
            size,
            order_type,
            tif: TimeInForce::default(),
            tag: None,
        }
    }

    pub fn with_tif(mut self, tif: TimeInForce) -> Self {
        self.tif = tif;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn is_buy(&self) -> bool {
        self.size.is_sign_positive() && !self.size.is_zero()
    }

    pub fn is_sell(&self) -> bool {
        self.size.is_sign_negative()
    }
}

/// Monotonically increasing source of stable order ids, one per `EventChannel`/run.
#[derive(Debug, Default)]
pub struct OrderIdGenerator {
    next: std::sync::atomic::AtomicU64,
}

impl OrderIdGenerator {
    pub fn new() -> Self {
        Self {
            next: std::sync::atomic::AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> OrderId {
        self.next.fetch_add(1, std::sync::atomic::Ordering::Relaxed)
    }
}

/// Lifecycle status of an order, tracked by the execution engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Initial,
    Accepted,
    Completed,
    Cancelled,
    Expired,
    Rejected,
}

impl OrderStatus {
    /// Terminal statuses are sticky: once reached, no further transition is
    /// permitted.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Expired | OrderStatus::Rejected
        )
    }
}

/// An order paired with its current status and lifecycle timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderState {
    pub order: Order,
    pub status: OrderStatus,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl OrderState {
    pub fn new(order: Order, opened_at: DateTime<Utc>) -> Self {
        Self {
            order,
            status: OrderStatus::Initial,
            opened_at,
            closed_at: None,
        }
    }

    /// Transitions to `status`, returning an error if this state is already
    /// terminal. Terminal statuses always stamp `closed_at`.
    pub fn transition(&mut self, status: OrderStatus, at: DateTime<Utc>) -> Result<(), crate::errors::QrError> {
        if self.status.is_terminal() {
            return Err(crate::errors::QrError::Internal(format!(
                "order {} is already in terminal status {:?}",
                self.order.id, self.status
            )));
        }
        self.status = status;
        if status.is_terminal() {
            self.closed_at = Some(at);
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, OrderStatus::Initial | OrderStatus::Accepted)
    }
}
