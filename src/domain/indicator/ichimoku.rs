//! Ichimoku Cloud indicator.
//!
//! TENKAN[i] = (HH(tenkan_period) + LL(tenkan_period)) / 2
//! KIJUN[i]  = (HH(kijun_period) + LL(kijun_period)) / 2
//! SPAN_A[i] = (TENKAN[i] + KIJUN[i]) / 2
//! SPAN_B[i] = (HH(senkou_b_period) + LL(senkou_b_period)) / 2
//! CHIKOU[i] = CLOSE[i - shift]
//!
//! The spans are not projected forward and chikou is not plotted backward:
//! every value at bar i depends only on bars 0..=i.

use std::collections::VecDeque;

use crate::domain::indicator::IndicatorLine;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::rolling::RollingExtremes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IchimokuParams {
    pub tenkan_period: usize,
    pub kijun_period: usize,
    pub senkou_b_period: usize,
    pub shift: usize,
}

impl Default for IchimokuParams {
    fn default() -> Self {
        IchimokuParams {
            tenkan_period: 9,
            kijun_period: 26,
            senkou_b_period: 52,
            shift: 26,
        }
    }
}

impl IchimokuParams {
    /// Bars needed before tenkan, kijun, span A and span B are all defined.
    pub fn warmup(&self) -> usize {
        self.tenkan_period
            .max(self.kijun_period)
            .max(self.senkou_b_period)
    }
}

/// Indicator values at a single bar. `None` means "not ready".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IchimokuSnapshot {
    pub tenkan: Option<f64>,
    pub kijun: Option<f64>,
    pub span_a: Option<f64>,
    pub span_b: Option<f64>,
    pub chikou: Option<f64>,
}

/// The four lines the cloud strategy needs, all defined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloudValues {
    pub tenkan: f64,
    pub kijun: f64,
    pub span_a: f64,
    pub span_b: f64,
}

impl CloudValues {
    pub fn cloud_top(&self) -> f64 {
        self.span_a.max(self.span_b)
    }

    pub fn cloud_bottom(&self) -> f64 {
        self.span_a.min(self.span_b)
    }
}

impl IchimokuSnapshot {
    pub fn cloud(&self) -> Option<CloudValues> {
        Some(CloudValues {
            tenkan: self.tenkan?,
            kijun: self.kijun?,
            span_a: self.span_a?,
            span_b: self.span_b?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Ichimoku {
    params: IchimokuParams,
    tenkan_window: RollingExtremes,
    kijun_window: RollingExtremes,
    senkou_b_window: RollingExtremes,
    // Last shift + 1 closes; the front is the close `shift` bars ago once full.
    closes: VecDeque<f64>,
    pub tenkan: IndicatorLine,
    pub kijun: IndicatorLine,
    pub span_a: IndicatorLine,
    pub span_b: IndicatorLine,
    pub chikou: IndicatorLine,
}

impl Ichimoku {
    /// # Panics
    /// Panics if any period is zero.
    pub fn new(params: IchimokuParams) -> Self {
        Self {
            params,
            tenkan_window: RollingExtremes::new(params.tenkan_period),
            kijun_window: RollingExtremes::new(params.kijun_period),
            senkou_b_window: RollingExtremes::new(params.senkou_b_period),
            closes: VecDeque::new(),
            tenkan: IndicatorLine::new("tenkan"),
            kijun: IndicatorLine::new("kijun"),
            span_a: IndicatorLine::new("span_a"),
            span_b: IndicatorLine::new("span_b"),
            chikou: IndicatorLine::new("chikou"),
        }
    }

    /// Feed the next bar and append one value to every line.
    pub fn update(&mut self, bar: &OhlcvBar) -> IchimokuSnapshot {
        self.tenkan_window.update(bar.high, bar.low);
        self.kijun_window.update(bar.high, bar.low);
        self.senkou_b_window.update(bar.high, bar.low);

        // Holds the current close plus `shift` earlier ones.
        self.closes.push_back(bar.close);
        if self.closes.len() - 1 > self.params.shift {
            self.closes.pop_front();
        }

        let tenkan = self.tenkan_window.midpoint();
        let kijun = self.kijun_window.midpoint();
        let span_a = match (tenkan, kijun) {
            (Some(t), Some(k)) => Some((t + k) / 2.0),
            _ => None,
        };
        let span_b = self.senkou_b_window.midpoint();
        let chikou = if self.closes.len() - 1 == self.params.shift {
            self.closes.front().copied()
        } else {
            None
        };

        self.tenkan.push(tenkan);
        self.kijun.push(kijun);
        self.span_a.push(span_a);
        self.span_b.push(span_b);
        self.chikou.push(chikou);

        IchimokuSnapshot {
            tenkan,
            kijun,
            span_a,
            span_b,
            chikou,
        }
    }

    /// Values at the most recent bar.
    pub fn snapshot(&self) -> IchimokuSnapshot {
        IchimokuSnapshot {
            tenkan: self.tenkan.current(),
            kijun: self.kijun.current(),
            span_a: self.span_a.current(),
            span_b: self.span_b.current(),
            chikou: self.chikou.current(),
        }
    }

    pub fn len(&self) -> usize {
        self.tenkan.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenkan.is_empty()
    }
}
