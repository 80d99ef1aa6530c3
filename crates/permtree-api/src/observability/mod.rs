//! Observability: structured logging configuration.

mod logging;

pub use logging::{init_logging, LoggingConfig};
