//! Domain error types.

use crate::domain::order::{OrderId, OrderStatus};

/// Top-level error type for ichitrader.
///
/// "Indicator not ready" is not represented here: an undefined line value is
/// `None`. A failed order is a logged event, not an error.
#[derive(Debug, thiserror::Error)]
pub enum IchitraderError {
    #[error("malformed bar at index {index}: {reason}")]
    MalformedBar { index: usize, reason: String },

    #[error("order {order_id}: invalid status transition {from} -> {to}")]
    InvalidOrderTransition {
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    },

    #[error("unknown order {order_id}")]
    UnknownOrder { order_id: OrderId },

    #[error("order {order_id} reported COMPLETED without execution details")]
    MissingExecution { order_id: OrderId },

    #[error("order {order_id} is still in flight")]
    OrderInFlight { order_id: OrderId },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&IchitraderError> for std::process::ExitCode {
    fn from(err: &IchitraderError) -> Self {
        let code: u8 = match err {
            IchitraderError::Io(_) | IchitraderError::Report { .. } => 1,
            IchitraderError::ConfigParse { .. }
            | IchitraderError::ConfigMissing { .. }
            | IchitraderError::ConfigInvalid { .. } => 2,
            IchitraderError::Data { .. } => 3,
            IchitraderError::MalformedBar { .. } => 4,
            IchitraderError::InvalidOrderTransition { .. }
            | IchitraderError::UnknownOrder { .. }
            | IchitraderError::MissingExecution { .. }
            | IchitraderError::OrderInFlight { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
