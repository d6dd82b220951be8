//! Crossover detection between two aligned series.
//!
//! CROSS_ABOVE at t: a[t] > b[t] and a[t-1] <= b[t-1]
//! CROSS_BELOW at t: a[t] < b[t] and a[t-1] >= b[t-1]
//!
//! Any undefined sample at t or t-1 yields `Crossover::None`.

use crate::domain::indicator::{IndicatorLine, LinePair};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossover {
    Above,
    Below,
    None,
}

impl Crossover {
    pub fn detect(a: LinePair, b: LinePair) -> Crossover {
        let (Some(a_prev), Some(a_cur), Some(b_prev), Some(b_cur)) =
            (a.previous, a.current, b.previous, b.current)
        else {
            return Crossover::None;
        };

        if a_cur > b_cur && a_prev <= b_prev {
            Crossover::Above
        } else if a_cur < b_cur && a_prev >= b_prev {
            Crossover::Below
        } else {
            Crossover::None
        }
    }

    pub fn between(a: &IndicatorLine, b: &IndicatorLine) -> Crossover {
        Self::detect(a.pair(), b.pair())
    }
}
