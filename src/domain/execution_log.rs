//! Append-only audit trail of order status transitions.

use chrono::NaiveDateTime;

use crate::domain::order::{Execution, OrderId, OrderSide, OrderStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Submitted,
    Accepted,
    Filled(Execution),
    Failed(OrderStatus),
}

impl EventKind {
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Submitted => "SUBMITTED",
            EventKind::Accepted => "ACCEPTED",
            EventKind::Filled(_) => "FILLED",
            EventKind::Failed(_) => "FAILED",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionEvent {
    pub timestamp: NaiveDateTime,
    pub order_id: OrderId,
    pub side: OrderSide,
    pub kind: EventKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionLog {
    events: Vec<ExecutionEvent>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, event: ExecutionEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[ExecutionEvent] {
        &self.events
    }

    pub fn fills(&self) -> impl Iterator<Item = (&ExecutionEvent, &Execution)> {
        self.events.iter().filter_map(|e| match &e.kind {
            EventKind::Filled(exec) => Some((e, exec)),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &ExecutionEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::Failed(_)))
    }

    pub fn total_commission(&self) -> f64 {
        self.fills().map(|(_, exec)| exec.commission).sum()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
