//! Telemetry and logging infrastructure
//!
//! Provides structured logging with tracing and session tick profiling.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, init_logging_default, LogConfig};
pub use metrics::{TickProfiler, TickStats};
