//! Utility modules for puresign

pub mod logging;

pub use logging::{init_logging, LoggingConfig};
