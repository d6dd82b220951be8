//! Append-only bar history.
//!
//! Bars are addressed by how many bars ago they occurred: `ago(0)` is the
//! most recent bar, `ago(1)` the one before it. Consumers index by position,
//! never by time arithmetic.

use crate::domain::error::IchitraderError;
use crate::domain::ohlcv::OhlcvBar;

#[derive(Debug, Clone, Default)]
pub struct BarSeries {
    bars: Vec<OhlcvBar>,
}

impl BarSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a bar. Rejects bars with bad fields or a timestamp that does
    /// not strictly follow the last accepted bar; the series is left
    /// untouched on error.
    pub fn push(&mut self, bar: OhlcvBar) -> Result<&OhlcvBar, IchitraderError> {
        self.check(&bar)?;
        let index = self.bars.len();
        self.bars.push(bar);
        Ok(&self.bars[index])
    }

    /// Would `push` accept this bar?
    pub fn check(&self, bar: &OhlcvBar) -> Result<(), IchitraderError> {
        let index = self.bars.len();
        bar.check_fields()
            .map_err(|reason| IchitraderError::MalformedBar { index, reason })?;

        if let Some(last) = self.bars.last() {
            if bar.timestamp <= last.timestamp {
                return Err(IchitraderError::MalformedBar {
                    index,
                    reason: format!(
                        "timestamp {} does not follow {}",
                        bar.timestamp, last.timestamp
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn ago(&self, n: usize) -> Option<&OhlcvBar> {
        let len = self.bars.len();
        if n >= len {
            return None;
        }
        self.bars.get(len - 1 - n)
    }

    pub fn current(&self) -> Option<&OhlcvBar> {
        self.ago(0)
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn ts(minute: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::minutes(minute)
    }

    fn bar(minute: i64, close: f64) -> OhlcvBar {
        OhlcvBar {
            timestamp: ts(minute),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 10.0,
        }
    }

    #[test]
    fn empty_series() {
        let series = BarSeries::new();
        assert!(series.is_empty());
        assert!(series.current().is_none());
        assert!(series.ago(0).is_none());
    }

    #[test]
    fn lookback_indexes_from_most_recent() {
        let mut series = BarSeries::new();
        series.push(bar(0, 10.0)).unwrap();
        series.push(bar(1, 11.0)).unwrap();
        series.push(bar(2, 12.0)).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.ago(0).unwrap().close, 12.0);
        assert_eq!(series.ago(2).unwrap().close, 10.0);
        assert!(series.ago(3).is_none());
    }

    #[test]
    fn rejects_repeated_timestamp() {
        let mut series = BarSeries::new();
        series.push(bar(5, 10.0)).unwrap();
        let err = series.push(bar(5, 11.0)).unwrap_err();
        assert!(matches!(err, IchitraderError::MalformedBar { index: 1, .. }));
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn rejects_backwards_timestamp() {
        let mut series = BarSeries::new();
        series.push(bar(5, 10.0)).unwrap();
        assert!(series.push(bar(4, 11.0)).is_err());
        assert_eq!(series.current().unwrap().close, 10.0);
    }

    #[test]
    fn rejects_non_finite_fields() {
        let mut series = BarSeries::new();
        let mut b = bar(0, 10.0);
        b.high = f64::INFINITY;
        assert!(series.push(b).is_err());
        assert!(series.is_empty());
    }

    #[test]
    fn gaps_in_time_are_allowed() {
        let mut series = BarSeries::new();
        series.push(bar(0, 10.0)).unwrap();
        series.push(bar(600, 11.0)).unwrap();
        assert_eq!(series.len(), 2);
    }
}
