//! Port traits for the collaborators the core talks to.

pub mod bar_source;
pub mod broker_port;
pub mod config_port;
pub mod report_port;
