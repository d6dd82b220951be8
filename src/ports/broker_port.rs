//! Broker port.

use chrono::NaiveDateTime;

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::order::{OrderId, OrderSide, StatusUpdate};

/// Accepts market orders and reports their status transitions later.
///
/// Updates for a given order must be delivered in lifecycle order
/// (SUBMITTED, ACCEPTED, then one terminal status). An order that never
/// resolves holds the strategy's in-flight slot indefinitely.
pub trait Broker {
    fn submit_order(&mut self, side: OrderSide, at: NaiveDateTime) -> OrderId;

    /// Called once per bar before the strategy runs; returns the status
    /// updates that became available with this bar.
    fn on_bar(&mut self, bar: &OhlcvBar) -> Vec<StatusUpdate>;
}
