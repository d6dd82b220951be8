//! Per-bar processing loop.
//!
//! One bar is fully processed before the next is admitted:
//! 1. check the bar against the series (malformed bars stop here)
//! 2. deliver broker status updates to the order tracker
//! 3. append the bar, update the indicator and evaluate the strategy
//! 4. submit any decision to the broker
//! 5. emit a signal record
//!
//! The series, indicator lines and signal records only grow together, so
//! they stay aligned even when a bar is refused.

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::domain::bar_series::BarSeries;
use crate::domain::error::IchitraderError;
use crate::domain::execution_log::ExecutionLog;
use crate::domain::indicator::ichimoku::IchimokuParams;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::order_tracker::OrderTracker;
use crate::domain::position::{Position, PositionSide};
use crate::domain::strategy::{Decision, IchimokuStrategy};
use crate::ports::bar_source::BarSource;
use crate::ports::broker_port::Broker;

/// Per-bar output for logging or plotting.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRecord {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub tenkan: Option<f64>,
    pub kijun: Option<f64>,
    pub span_a: Option<f64>,
    pub span_b: Option<f64>,
    pub chikou: Option<f64>,
    pub position: PositionSide,
    pub decision: Option<Decision>,
}

/// A bar the run refused and stepped over.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedBar {
    /// Zero-based position in the bar source.
    pub position: usize,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub signals: Vec<SignalRecord>,
    pub execution_log: ExecutionLog,
    pub position: Position,
    pub last_close: Option<f64>,
    pub skipped: Vec<SkippedBar>,
}

impl BacktestResult {
    pub fn decisions(&self) -> impl Iterator<Item = (NaiveDateTime, Decision)> + '_ {
        self.signals
            .iter()
            .filter_map(|s| s.decision.map(|d| (s.timestamp, d)))
    }
}

#[derive(Debug, Clone)]
pub struct Engine {
    series: BarSeries,
    strategy: IchimokuStrategy,
    tracker: OrderTracker,
    signals: Vec<SignalRecord>,
    skipped: Vec<SkippedBar>,
}

impl Engine {
    pub fn new(params: IchimokuParams) -> Self {
        Self {
            series: BarSeries::new(),
            strategy: IchimokuStrategy::new(params),
            tracker: OrderTracker::new(),
            signals: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn series(&self) -> &BarSeries {
        &self.series
    }

    pub fn strategy(&self) -> &IchimokuStrategy {
        &self.strategy
    }

    pub fn tracker(&self) -> &OrderTracker {
        &self.tracker
    }

    pub fn position(&self) -> &Position {
        self.strategy.position()
    }

    pub fn signals(&self) -> &[SignalRecord] {
        &self.signals
    }

    /// Process one bar. A malformed bar is refused before anything changes.
    /// On an order protocol error the bar is not admitted, but the rest of
    /// the broker's updates for it are still applied.
    pub fn process_bar(
        &mut self,
        bar: OhlcvBar,
        broker: &mut dyn Broker,
    ) -> Result<&SignalRecord, IchitraderError> {
        self.series.check(&bar)?;

        let mut protocol_error = None;
        for update in broker.on_bar(&bar) {
            if let Err(e) = self
                .tracker
                .on_status_change(&update, self.strategy.position_mut())
            {
                warn!(error = %e, "broker update refused");
                if protocol_error.is_none() {
                    protocol_error = Some(e);
                }
            }
        }
        if let Some(e) = protocol_error {
            return Err(e);
        }

        self.series.push(bar.clone())?;

        let in_flight = self.tracker.in_flight().is_some();
        let eval = self.strategy.on_bar(&bar, in_flight);

        if let Some(decision) = eval.decision {
            let side = decision.order_side();
            let order_id = broker.submit_order(side, bar.timestamp);
            self.tracker.submit(order_id, side, bar.timestamp)?;
        }

        self.signals.push(SignalRecord {
            timestamp: bar.timestamp,
            close: bar.close,
            tenkan: eval.snapshot.tenkan,
            kijun: eval.snapshot.kijun,
            span_a: eval.snapshot.span_a,
            span_b: eval.snapshot.span_b,
            chikou: eval.snapshot.chikou,
            position: self.strategy.position().side(),
            decision: eval.decision,
        });
        let index = self.signals.len() - 1;
        Ok(&self.signals[index])
    }

    /// Drain `source` through the loop. Malformed bars are logged, recorded
    /// in `BacktestResult::skipped` and stepped over; order protocol and
    /// data errors end the run.
    pub fn run(
        mut self,
        source: &mut dyn BarSource,
        broker: &mut dyn Broker,
    ) -> Result<BacktestResult, IchitraderError> {
        let mut position = 0;
        while let Some(next) = source.next_bar() {
            let outcome = next.and_then(|bar| self.process_bar(bar, broker).map(|_| ()));
            match outcome {
                Ok(()) => {}
                Err(IchitraderError::MalformedBar { reason, .. }) => {
                    warn!(position, %reason, "skipping malformed bar");
                    self.skipped.push(SkippedBar { position, reason });
                }
                Err(e) => return Err(e),
            }
            position += 1;
        }
        debug!(bars = self.series.len(), "bar source exhausted");
        Ok(self.finish())
    }

    pub fn finish(self) -> BacktestResult {
        let last_close = self.series.current().map(|b| b.close);
        let position = *self.strategy.position();
        let log = self.tracker.into_log();
        info!(
            bars = self.signals.len(),
            events = log.len(),
            fills = log.fills().count(),
            failures = log.failures().count(),
            skipped = self.skipped.len(),
            position = %position.side(),
            "run finished"
        );
        BacktestResult {
            signals: self.signals,
            execution_log: log,
            position,
            last_close,
            skipped: self.skipped,
        }
    }
}
