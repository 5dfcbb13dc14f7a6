//! Logging utilities.
//!
//! Centralizes logger initialization. Library code only talks to the `log` facade;
//! `env_logger` is installed here on request.

mod init;

pub use init::{init_logging, LoggingConfig};
