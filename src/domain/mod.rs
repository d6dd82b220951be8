//! Core domain types and logic.

pub mod ohlcv;
pub mod bar_series;
pub mod rolling;
pub mod indicator;
pub mod crossover;
pub mod position;
pub mod order;
pub mod execution_log;
pub mod order_tracker;
pub mod strategy;
pub mod engine;
pub mod config_validation;
pub mod error;
