//! CSV report adapter: signal records and the execution log.

use std::fs;
use std::path::Path;

use crate::domain::engine::{BacktestResult, SignalRecord};
use crate::domain::error::IchitraderError;
use crate::domain::execution_log::{EventKind, ExecutionEvent};
use crate::domain::strategy::Decision;
use crate::ports::report_port::ReportPort;

pub const SIGNALS_FILE: &str = "signals.csv";
pub const EXECUTIONS_FILE: &str = "executions.csv";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Default)]
pub struct CsvReportAdapter {
    /// Also write rows from before the cloud lines are defined.
    pub include_warmup: bool,
}

fn opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.4}")).unwrap_or_default()
}

fn report_err(e: impl std::fmt::Display) -> IchitraderError {
    IchitraderError::Report {
        reason: e.to_string(),
    }
}

fn signal_row(s: &SignalRecord) -> [String; 9] {
    let decision = match s.decision {
        Some(Decision::Enter) => "ENTER",
        Some(Decision::Exit) => "EXIT",
        None => "",
    };
    [
        s.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        format!("{:.4}", s.close),
        opt(s.tenkan),
        opt(s.kijun),
        opt(s.span_a),
        opt(s.span_b),
        opt(s.chikou),
        s.position.to_string(),
        decision.to_string(),
    ]
}

fn execution_row(e: &ExecutionEvent) -> [String; 8] {
    let (status, price, cost, commission) = match &e.kind {
        EventKind::Filled(exec) => (
            "COMPLETED".to_string(),
            format!("{:.4}", exec.price),
            format!("{:.4}", exec.cost),
            format!("{:.4}", exec.commission),
        ),
        EventKind::Failed(status) => (status.to_string(), String::new(), String::new(), String::new()),
        other => (other.label().to_string(), String::new(), String::new(), String::new()),
    };
    [
        e.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        e.order_id.0.to_string(),
        e.side.to_string(),
        e.kind.label().to_string(),
        status,
        price,
        cost,
        commission,
    ]
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), IchitraderError> {
        fs::create_dir_all(output_dir)?;

        let mut signals = csv::Writer::from_path(output_dir.join(SIGNALS_FILE)).map_err(report_err)?;
        signals
            .write_record([
                "timestamp", "close", "tenkan", "kijun", "span_a", "span_b", "chikou", "position",
                "decision",
            ])
            .map_err(report_err)?;
        for s in &result.signals {
            let ready = s.tenkan.is_some()
                && s.kijun.is_some()
                && s.span_a.is_some()
                && s.span_b.is_some();
            if ready || self.include_warmup {
                signals.write_record(signal_row(s)).map_err(report_err)?;
            }
        }
        signals.flush()?;

        let mut executions =
            csv::Writer::from_path(output_dir.join(EXECUTIONS_FILE)).map_err(report_err)?;
        executions
            .write_record([
                "timestamp", "order_id", "side", "event", "status", "price", "cost", "commission",
            ])
            .map_err(report_err)?;
        for e in result.execution_log.events() {
            executions.write_record(execution_row(e)).map_err(report_err)?;
        }
        executions.flush()?;

        Ok(())
    }
}
