//! Indicator line storage and the Ichimoku indicator.
//!
//! - `IndicatorLine`: append-only per-bar values, `None` until ready
//! - `LinePair`: the previous/current samples a crossover check needs

pub mod ichimoku;

/// One indicator output series, aligned 1:1 with the bar series.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorLine {
    name: &'static str,
    values: Vec<Option<f64>>,
}

/// The two most recent samples of a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePair {
    pub previous: Option<f64>,
    pub current: Option<f64>,
}

impl IndicatorLine {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            values: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn push(&mut self, value: Option<f64>) {
        self.values.push(value);
    }

    /// Value `n` bars ago; `None` if out of range or not ready at that bar.
    pub fn ago(&self, n: usize) -> Option<f64> {
        let len = self.values.len();
        if n >= len {
            return None;
        }
        self.values[len - 1 - n]
    }

    pub fn current(&self) -> Option<f64> {
        self.ago(0)
    }

    pub fn previous(&self) -> Option<f64> {
        self.ago(1)
    }

    pub fn pair(&self) -> LinePair {
        LinePair {
            previous: self.previous(),
            current: self.current(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Oldest-first values.
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }
}
