//! Order lifecycle tracking.
//!
//! Holds at most one in-flight order. Broker status updates are checked
//! against the allowed transitions, applied to the position on completion,
//! and appended to the execution log. Failed orders leave the position
//! untouched and free the in-flight slot.

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::domain::error::IchitraderError;
use crate::domain::execution_log::{EventKind, ExecutionEvent, ExecutionLog};
use crate::domain::order::{Order, OrderId, OrderSide, OrderStatus, StatusUpdate};
use crate::domain::position::Position;

/// What applying a status update did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderOutcome {
    /// Intermediate status; nothing changed.
    Pending,
    /// Order completed and the position was updated.
    Filled { side: OrderSide, price: f64 },
    /// Order failed; position unchanged.
    Failed(OrderStatus),
}

#[derive(Debug, Clone, Default)]
pub struct OrderTracker {
    in_flight: Option<Order>,
    log: ExecutionLog,
}

impl OrderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> Option<&Order> {
        self.in_flight.as_ref()
    }

    pub fn log(&self) -> &ExecutionLog {
        &self.log
    }

    pub fn into_log(self) -> ExecutionLog {
        self.log
    }

    /// Record a newly submitted order in SUBMITTED.
    pub fn submit(
        &mut self,
        order_id: OrderId,
        side: OrderSide,
        at: NaiveDateTime,
    ) -> Result<&Order, IchitraderError> {
        if let Some(open) = &self.in_flight {
            return Err(IchitraderError::OrderInFlight { order_id: open.id });
        }

        debug!(order = %order_id, %side, "order submitted");
        self.log.append(ExecutionEvent {
            timestamp: at,
            order_id,
            side,
            kind: EventKind::Submitted,
        });

        Ok(self.in_flight.insert(Order {
            id: order_id,
            side,
            requested_at: at,
            status: OrderStatus::Submitted,
            execution: None,
        }))
    }

    /// Apply a broker status update. Invalid or out-of-order updates are
    /// rejected without touching the order, the position or the log.
    pub fn on_status_change(
        &mut self,
        update: &StatusUpdate,
        position: &mut Position,
    ) -> Result<OrderOutcome, IchitraderError> {
        let order = match self.in_flight.as_mut() {
            Some(order) if order.id == update.order_id => order,
            _ => {
                return Err(IchitraderError::UnknownOrder {
                    order_id: update.order_id,
                });
            }
        };

        if !order.status.can_transition_to(update.status) {
            return Err(IchitraderError::InvalidOrderTransition {
                order_id: order.id,
                from: order.status,
                to: update.status,
            });
        }

        let (kind, outcome) = match update.status {
            OrderStatus::Submitted | OrderStatus::Accepted => {
                // Re-notifications of the current status are not logged twice.
                if order.status == update.status {
                    debug!(order = %order.id, status = %update.status, "duplicate status");
                    return Ok(OrderOutcome::Pending);
                }
                debug!(order = %order.id, status = %update.status, "order status");
                (EventKind::Accepted, OrderOutcome::Pending)
            }
            OrderStatus::Completed => {
                let exec = update.execution.ok_or(IchitraderError::MissingExecution {
                    order_id: order.id,
                })?;
                *position = match order.side {
                    OrderSide::Buy => Position::Long {
                        entry_price: exec.price,
                        entry_timestamp: update.at,
                    },
                    OrderSide::Sell => Position::Flat,
                };
                order.execution = Some(exec);
                info!(
                    order = %order.id,
                    side = %order.side,
                    price = exec.price,
                    cost = exec.cost,
                    commission = exec.commission,
                    "{} EXECUTED",
                    order.side
                );
                (
                    EventKind::Filled(exec),
                    OrderOutcome::Filled {
                        side: order.side,
                        price: exec.price,
                    },
                )
            }
            OrderStatus::Canceled | OrderStatus::Margin | OrderStatus::Rejected => {
                warn!(order = %order.id, side = %order.side, status = %update.status, "order failed");
                (
                    EventKind::Failed(update.status),
                    OrderOutcome::Failed(update.status),
                )
            }
        };

        order.status = update.status;
        self.log.append(ExecutionEvent {
            timestamp: update.at,
            order_id: order.id,
            side: order.side,
            kind,
        });

        if order.status.is_terminal() {
            self.in_flight = None;
        }

        Ok(outcome)
    }
}
