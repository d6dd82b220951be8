//! ichitrader: streaming Ichimoku cloud indicator, long-only cloud breakout
//! strategy, and order lifecycle tracking.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command line in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
