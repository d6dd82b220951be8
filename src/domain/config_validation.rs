//! Configuration validation.
//!
//! Validates all config fields before a run starts.

use crate::domain::error::IchitraderError;
use crate::ports::config_port::ConfigPort;

const PERIOD_KEYS: [(&str, i64); 4] = [
    ("tenkan_period", 9),
    ("kijun_period", 26),
    ("senkou_b_period", 52),
    ("shift", 26),
];

/// Upper bound for any Ichimoku period or shift, in bars.
pub const MAX_PERIOD: i64 = 100_000;

pub fn validate_ichimoku_config(config: &dyn ConfigPort) -> Result<(), IchitraderError> {
    for (key, default) in PERIOD_KEYS {
        validate_period(config, key, default)?;
    }
    Ok(())
}

pub fn validate_broker_config(config: &dyn ConfigPort) -> Result<(), IchitraderError> {
    let cash = broker_number(config, "cash", 10_000.0)?;
    if cash < 0.0 {
        return Err(invalid("broker", "cash", "cash must be non-negative"));
    }
    let size = broker_number(config, "size", 1.0)?;
    if size <= 0.0 {
        return Err(invalid("broker", "size", "size must be positive"));
    }
    for key in ["commission_pct", "slippage_pct"] {
        if broker_number(config, key, 0.0)? < 0.0 {
            return Err(invalid("broker", key, &format!("{key} must be non-negative")));
        }
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> IchitraderError {
    IchitraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_period(config: &dyn ConfigPort, key: &str, default: i64) -> Result<(), IchitraderError> {
    // A present but non-numeric value would silently fall back to the default.
    if let Some(raw) = config.get_string("ichimoku", key) {
        if raw.trim().parse::<i64>().is_err() {
            return Err(invalid("ichimoku", key, "must be a whole number"));
        }
    }
    let value = config.get_int("ichimoku", key, default);
    if !(1..=MAX_PERIOD).contains(&value) {
        return Err(invalid(
            "ichimoku",
            key,
            &format!("{key} must be between 1 and {MAX_PERIOD}"),
        ));
    }
    Ok(())
}

/// A present `[broker]` value must be a finite number; absent keys take
/// `default`.
fn broker_number(config: &dyn ConfigPort, key: &str, default: f64) -> Result<f64, IchitraderError> {
    let Some(raw) = config.get_string("broker", key) else {
        return Ok(default);
    };
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(invalid("broker", key, "must be a finite number")),
    }
}
