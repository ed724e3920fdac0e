//! # kmon Utilities
//!
//! Shared utilities and logging setup for kmon.
//!
//! The monitor binary and its library share one way of configuring `tracing`,
//! kept here so the core crate only ever depends on the `tracing` macros.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{
    default_log_file, init_logging, init_logging_from_env, LogConfig, LogFormat, LogLevel, LoggingError, LoggingGuard,
};
pub use tracing::{debug, error, info, trace, warn};
