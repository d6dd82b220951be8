//! OHLCV bar representation.

use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// Check the bar's own fields. Ordering against earlier bars is the
    /// series' job (see `BarSeries::push`).
    pub fn check_fields(&self) -> Result<(), String> {
        let prices = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ];
        for (name, value) in prices {
            if !value.is_finite() {
                return Err(format!("{name} is not a finite number"));
            }
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err("volume must be a non-negative finite number".into());
        }
        if self.high < self.low {
            return Err(format!("high {} is below low {}", self.high, self.low));
        }
        Ok(())
    }
}
