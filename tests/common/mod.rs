#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use ichitrader::domain::indicator::ichimoku::IchimokuParams;
pub use ichitrader::domain::ohlcv::OhlcvBar;

/// Short periods so a full trade fits in a few dozen bars.
pub const FAST_PARAMS: IchimokuParams = IchimokuParams {
    tenkan_period: 3,
    kijun_period: 5,
    senkou_b_period: 8,
    shift: 4,
};

pub fn ts(hour: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::hours(hour)
}

/// One bar per hour: high/low one point either side of the close, open at
/// the previous close.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    let mut prev = closes.first().copied().unwrap_or_default();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let bar = OhlcvBar {
                timestamp: ts(i as i64),
                open: prev,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000.0,
            };
            prev = close;
            bar
        })
        .collect()
}

/// 12 bars down from 100, 14 bars up, 12 bars down again.
///
/// With `FAST_PARAMS` this gives an ENTER on bar 14 (filled at bar 15 open,
/// 94.0) and an EXIT on bar 26 when the close touches the cloud top (filled
/// at bar 27 open, 114.0).
pub fn wave_closes() -> Vec<f64> {
    let mut closes = Vec::with_capacity(38);
    let mut c = 100.0;
    for _ in 0..12 {
        c -= 1.0;
        closes.push(c);
    }
    for _ in 0..14 {
        c += 2.0;
        closes.push(c);
    }
    for _ in 0..12 {
        c -= 2.0;
        closes.push(c);
    }
    closes
}

pub fn wave_bars() -> Vec<OhlcvBar> {
    bars_from_closes(&wave_closes())
}

pub fn bars_to_csv(bars: &[OhlcvBar]) -> String {
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d %H:%M:%S"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    out
}

/// Deterministic pseudo-random walk (LCG), for long-run invariant checks.
pub fn generate_bars(count: usize, start_price: f64, seed: u64) -> Vec<OhlcvBar> {
    let mut state = seed;
    let mut close = start_price;
    let mut closes = Vec::with_capacity(count);
    for _ in 0..count {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        let step = ((state >> 33) % 7) as f64 - 3.0;
        close = (close + step).max(5.0);
        closes.push(close);
    }
    bars_from_closes(&closes)
}
