//! Command handlers: CLI args -> coordinator -> output formatting.

pub mod config_cmd;
pub mod sensors;
pub mod status;
pub mod watch;
