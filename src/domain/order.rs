//! Order types and the order status enumeration.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Broker-reported order status.
///
/// Success path: SUBMITTED -> ACCEPTED -> COMPLETED.
/// Failure path: SUBMITTED/ACCEPTED -> CANCELED | MARGIN | REJECTED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Submitted,
    Accepted,
    Completed,
    Canceled,
    Margin,
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Completed
                | OrderStatus::Canceled
                | OrderStatus::Margin
                | OrderStatus::Rejected
        )
    }

    /// CANCELED, MARGIN and REJECTED all mean "order failed".
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            OrderStatus::Canceled | OrderStatus::Margin | OrderStatus::Rejected
        )
    }

    /// Whether a broker may report `next` for an order currently in `self`.
    /// Repeating a non-terminal status is accepted as a re-notification.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Submitted, Submitted) | (Accepted, Accepted) => true,
            (Submitted, Accepted) => true,
            (Accepted, Completed) => true,
            (Submitted | Accepted, Canceled | Margin | Rejected) => true,
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Submitted => "SUBMITTED",
            OrderStatus::Accepted => "ACCEPTED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Margin => "MARGIN",
            OrderStatus::Rejected => "REJECTED",
        };
        write!(f, "{s}")
    }
}

/// Fill details reported with a COMPLETED status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Execution {
    pub price: f64,
    pub cost: f64,
    pub commission: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub side: OrderSide,
    pub requested_at: NaiveDateTime,
    pub status: OrderStatus,
    pub execution: Option<Execution>,
}

/// A status notification delivered by the broker.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub at: NaiveDateTime,
    pub execution: Option<Execution>,
}
