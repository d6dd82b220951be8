//! Rolling highest-high / lowest-low over a trailing window.
//!
//! Each side keeps a monotonic deque of `(bar_index, value)` pairs, so an
//! update costs O(1) amortized regardless of window length. The window
//! includes the current bar. Until `window` bars have been seen both
//! extremes are `None` (not ready).

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RollingExtremes {
    window: usize,
    seen: usize,
    highs: VecDeque<(usize, f64)>,
    lows: VecDeque<(usize, f64)>,
}

impl RollingExtremes {
    /// # Panics
    /// Panics if `window` is zero.
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "rolling window must be >= 1");
        Self {
            window,
            seen: 0,
            highs: VecDeque::new(),
            lows: VecDeque::new(),
        }
    }

    pub fn update(&mut self, high: f64, low: f64) {
        let index = self.seen;
        self.seen += 1;

        while matches!(self.highs.back(), Some(&(_, v)) if v <= high) {
            self.highs.pop_back();
        }
        self.highs.push_back((index, high));

        while matches!(self.lows.back(), Some(&(_, v)) if v >= low) {
            self.lows.pop_back();
        }
        self.lows.push_back((index, low));

        // Oldest index still inside the window.
        let oldest = (index + 1).saturating_sub(self.window);
        while matches!(self.highs.front(), Some(&(i, _)) if i < oldest) {
            self.highs.pop_front();
        }
        while matches!(self.lows.front(), Some(&(i, _)) if i < oldest) {
            self.lows.pop_front();
        }
    }

    pub fn is_ready(&self) -> bool {
        self.seen >= self.window
    }

    pub fn highest(&self) -> Option<f64> {
        if !self.is_ready() {
            return None;
        }
        self.highs.front().map(|&(_, v)| v)
    }

    pub fn lowest(&self) -> Option<f64> {
        if !self.is_ready() {
            return None;
        }
        self.lows.front().map(|&(_, v)| v)
    }

    /// (highest + lowest) / 2, the building block of every Ichimoku line.
    pub fn midpoint(&self) -> Option<f64> {
        Some((self.highest()? + self.lowest()?) / 2.0)
    }
}
