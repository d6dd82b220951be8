//! Bar supply port.

use crate::domain::error::IchitraderError;
use crate::domain::ohlcv::OhlcvBar;

/// Supplies bars in time order: replayed history for a backtest, or a live
/// feed. `None` signals end of stream.
pub trait BarSource {
    fn next_bar(&mut self) -> Option<Result<OhlcvBar, IchitraderError>>;
}
