//! Report output port.

use std::path::Path;

use crate::domain::engine::BacktestResult;
use crate::domain::error::IchitraderError;

/// Port for writing the per-bar signal records and the execution log.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_dir: &Path) -> Result<(), IchitraderError>;
}
