use crate::asset::Asset;
use crate::order::OrderId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single executed fill against an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub time: DateTime<Utc>,
    pub asset: Asset,
    pub order_id: OrderId,
    /// Signed size filled: positive = bought, negative = sold.
    pub size: Decimal,
    pub price: Decimal,
    pub fee: Decimal,
    /// Realized P&L contributed by this fill, in the asset's currency.
    /// Zero for fills that only open or add to a position.
    pub pnl: Decimal,
}

/// A net holding in a single asset: signed size, average cost basis, and the
/// last price it was marked at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub size: Decimal,
    pub avg_price: Decimal,
    pub last_price: Decimal,
}

impl Position {
    pub fn flat() -> Self {
        Self {
            size: Decimal::ZERO,
            avg_price: Decimal::ZERO,
            last_price: Decimal::ZERO,
        }
    }

    pub fn new(size: Decimal, avg_price: Decimal) -> Self {
        Self {
            size,
            avg_price,
            last_price: avg_price,
        }
    }

    pub fn is_long(&self) -> bool {
        self.size.is_sign_positive() && !self.size.is_zero()
    }

    pub fn is_short(&self) -> bool {
        self.size.is_sign_negative()
    }

    pub fn is_flat(&self) -> bool {
        self.size.is_zero()
    }

    pub fn market_value(&self, price: Decimal) -> Decimal {
        self.size * price
    }

    pub fn unrealized_pnl(&self, price: Decimal) -> Decimal {
        self.size * (price - self.avg_price)
    }

    /// Marks this position at a new last-seen price, leaving size and cost
    /// basis untouched.
    pub fn mark(&self, price: Decimal) -> Position {
        Position {
            last_price: price,
            ..*self
        }
    }

    /// Combines this position with a fill of `fill_size` at `fill_price`,
    /// returning the resulting position and the P&L realized by this fill.
    ///
    /// Three cases, matching the position-update invariant:
    /// - same sign (or starting flat): sizes accumulate, average price is
    ///   the size-weighted blend, no P&L is realized.
    /// - opposite sign, `|fill_size| <= |size|`: the fill reduces the
    ///   position; the closed portion realizes P&L against the existing
    ///   average price, the average price of what remains is unchanged.
    /// - opposite sign, `|fill_size| > |size|`: the fill closes the
    ///   existing position entirely and flips into a new position in the
    ///   fill's direction, opened at the fill price.
    pub fn combine(&self, fill_size: Decimal, fill_price: Decimal) -> (Position, Decimal) {
        if fill_size.is_zero() {
            return (*self, Decimal::ZERO);
        }
        if self.is_flat() || same_sign(self.size, fill_size) {
            let new_size = self.size + fill_size;
            let new_avg = if new_size.is_zero() {
                Decimal::ZERO
            } else {
                (self.size * self.avg_price + fill_size * fill_price) / new_size
            };
            return (
                Position {
                    size: new_size,
                    avg_price: new_avg,
                    last_price: fill_price,
                },
                Decimal::ZERO,
            );
        }

        let closing = self.size.abs().min(fill_size.abs()) * sign(self.size);
        let pnl = closing * (fill_price - self.avg_price);
        let new_size = self.size + fill_size;

        if fill_size.abs() <= self.size.abs() {
            let new_avg = if new_size.is_zero() {
                Decimal::ZERO
            } else {
                self.avg_price
            };
            (
                Position {
                    size: new_size,
                    avg_price: new_avg,
                    last_price: fill_price,
                },
                pnl,
            )
        } else {
            (
                Position {
                    size: new_size,
                    avg_price: fill_price,
                    last_price: fill_price,
                },
                pnl,
            )
        }
    }
}

fn sign(d: Decimal) -> Decimal {
    if d.is_sign_negative() {
        -Decimal::ONE
    } else {
        Decimal::ONE
    }
}

fn same_sign(a: Decimal, b: Decimal) -> bool {
    (a.is_sign_positive() && b.is_sign_positive()) || (a.is_sign_negative() && b.is_sign_negative())
}
