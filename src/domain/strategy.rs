//! Ichimoku cloud-breakout strategy state machine.
//!
//! FLAT -> LONG: close above the cloud and tenkan crosses above kijun.
//! LONG -> FLAT: close not above the cloud, or tenkan crosses below kijun.
//!
//! Long-only, one unit, no pyramiding. The position only changes when the
//! order tracker confirms a fill; the strategy just emits decisions.

use tracing::{debug, info};

use crate::domain::crossover::Crossover;
use crate::domain::indicator::ichimoku::{CloudValues, Ichimoku, IchimokuParams, IchimokuSnapshot};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::order::OrderSide;
use crate::domain::position::{Position, PositionSide};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Enter,
    Exit,
}

impl Decision {
    pub fn order_side(&self) -> OrderSide {
        match self {
            Decision::Enter => OrderSide::Buy,
            Decision::Exit => OrderSide::Sell,
        }
    }
}

/// Transition rule. Pure: same inputs, same decision.
pub fn decide(
    side: PositionSide,
    close: f64,
    cloud: &CloudValues,
    crossover: Crossover,
) -> Option<Decision> {
    let above_cloud = close > cloud.cloud_top();
    match side {
        PositionSide::Flat if above_cloud && crossover == Crossover::Above => {
            Some(Decision::Enter)
        }
        PositionSide::Long if !above_cloud || crossover == Crossover::Below => {
            Some(Decision::Exit)
        }
        _ => None,
    }
}

/// Everything the strategy saw and decided on one bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarEvaluation {
    pub snapshot: IchimokuSnapshot,
    pub crossover: Crossover,
    pub decision: Option<Decision>,
}

#[derive(Debug, Clone)]
pub struct IchimokuStrategy {
    ichimoku: Ichimoku,
    position: Position,
}

impl IchimokuStrategy {
    pub fn new(params: IchimokuParams) -> Self {
        Self {
            ichimoku: Ichimoku::new(params),
            position: Position::Flat,
        }
    }

    pub fn ichimoku(&self) -> &Ichimoku {
        &self.ichimoku
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Handed to the order tracker so fills can update the position.
    pub fn position_mut(&mut self) -> &mut Position {
        &mut self.position
    }

    /// Advance the indicator by one bar and evaluate the transition rule.
    /// While an order is in flight, or before the cloud lines are defined,
    /// no decision is made.
    pub fn on_bar(&mut self, bar: &OhlcvBar, order_in_flight: bool) -> BarEvaluation {
        let snapshot = self.ichimoku.update(bar);
        let crossover = Crossover::between(&self.ichimoku.tenkan, &self.ichimoku.kijun);

        debug!(
            close = bar.close,
            tenkan = ?snapshot.tenkan,
            kijun = ?snapshot.kijun,
            span_a = ?snapshot.span_a,
            span_b = ?snapshot.span_b,
            position = %self.position.side(),
            "bar"
        );

        let decision = match snapshot.cloud() {
            Some(cloud) if !order_in_flight => {
                decide(self.position.side(), bar.close, &cloud, crossover)
            }
            _ => None,
        };

        match decision {
            Some(Decision::Enter) => {
                info!(close = bar.close, "BUY SIGNAL (above cloud + tenkan/kijun cross up)")
            }
            Some(Decision::Exit) => {
                info!(close = bar.close, "SELL SIGNAL (not above cloud or tenkan/kijun cross down)")
            }
            None => {}
        }

        BarEvaluation {
            snapshot,
            crossover,
            decision,
        }
    }
}
