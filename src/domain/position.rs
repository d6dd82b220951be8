//! Position state for a long-only, single-unit strategy.

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSide {
    Flat,
    Long,
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Flat => write!(f, "FLAT"),
            PositionSide::Long => write!(f, "LONG"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Position {
    #[default]
    Flat,
    Long {
        entry_price: f64,
        entry_timestamp: NaiveDateTime,
    },
}

impl Position {
    pub fn side(&self) -> PositionSide {
        match self {
            Position::Flat => PositionSide::Flat,
            Position::Long { .. } => PositionSide::Long,
        }
    }

    pub fn entry_price(&self) -> Option<f64> {
        match self {
            Position::Flat => None,
            Position::Long { entry_price, .. } => Some(*entry_price),
        }
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        match self {
            Position::Flat => 0.0,
            Position::Long { entry_price, .. } => price - entry_price,
        }
    }
}
