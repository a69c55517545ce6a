//! Structured logging setup for puresign
//!
//! Built on the `tracing` ecosystem. Output goes to stderr so that
//! `--format json` on stdout stays machine-readable.
//!
//! - Console output with pretty formatting (default)
//! - Optional JSON output with source locations (`PURESIGN_LOG_JSON=true`)
//! - `RUST_LOG` overrides the default filter when set
//! - Initialized at most once per process
//!
//! # Example
//!
//! ```no_run
//! use puresign::util::logging::{init_logging, LoggingConfig};
//! use tracing::Level;
//!
//! init_logging(LoggingConfig::from_env(Level::INFO));
//!
//! tracing::info!("Application started");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Dependencies that are noisy at info level
const QUIET_TARGETS: [&str; 3] = ["h2=warn", "hyper=warn", "reqwest=warn"];

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level for puresign's own targets
    pub level: Level,

    /// Use JSON output format
    pub use_json: bool,

    /// Include the module target (e.g., puresign::pipeline) in logs
    pub include_target: bool,

    /// Include file and line number information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            use_json: false,
            include_target: true,
            include_location: false,
        }
    }
}

impl LoggingConfig {
    /// `level`, switched to JSON with source locations when
    /// `PURESIGN_LOG_JSON` is true
    pub fn from_env(level: Level) -> Self {
        let use_json = env::var("PURESIGN_LOG_JSON")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        Self {
            level,
            use_json,
            include_location: use_json,
            ..Default::default()
        }
    }
}

/// Parses a log level (case-insensitive), defaulting to INFO
///
/// ```
/// use puresign::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("debug"), Level::DEBUG);
/// assert_eq!(parse_level("invalid"), Level::INFO);
/// ```
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

/// Level from CLI flags: an explicit `--log-level` wins, then `-v`, then
/// `-q`, then `PURESIGN_LOG_LEVEL`
pub fn level_from_flags(log_level: Option<&str>, verbose: bool, quiet: bool) -> Level {
    if let Some(level_str) = log_level {
        parse_level(level_str)
    } else if verbose {
        Level::DEBUG
    } else if quiet {
        Level::ERROR
    } else {
        let level_str = env::var("PURESIGN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        parse_level(&level_str)
    }
}

fn build_filter(level: Level) -> EnvFilter {
    if env::var("RUST_LOG").is_ok() {
        return EnvFilter::from_default_env();
    }

    let mut filter = EnvFilter::new(format!("puresign={}", level));
    for directive in QUIET_TARGETS {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let filter = build_filter(config.level);

        if config.use_json {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .with_target(config.include_target)
                        .with_file(config.include_location)
                        .with_line_number(config.include_location)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    });
}


#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("WARN"), Level::WARN);
        assert_eq!(parse_level("Error"), Level::ERROR);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    #[serial]
    fn test_level_from_flags_precedence() {
        assert_eq!(level_from_flags(Some("trace"), true, true), Level::TRACE);
        assert_eq!(level_from_flags(None, true, true), Level::DEBUG);
        assert_eq!(level_from_flags(None, false, true), Level::ERROR);

        env::set_var("PURESIGN_LOG_LEVEL", "warn");
        assert_eq!(level_from_flags(None, false, false), Level::WARN);
        env::remove_var("PURESIGN_LOG_LEVEL");
        assert_eq!(level_from_flags(None, false, false), Level::INFO);
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.use_json);

        env::set_var("PURESIGN_LOG_JSON", "true");
        let config = LoggingConfig::from_env(Level::DEBUG);
        assert_eq!(config.level, Level::DEBUG);
        assert!(config.use_json);
        assert!(config.include_location);

        env::set_var("PURESIGN_LOG_JSON", "nope");
        assert!(!LoggingConfig::from_env(Level::INFO).use_json);
        env::remove_var("PURESIGN_LOG_JSON");
        assert!(!LoggingConfig::from_env(Level::INFO).include_location);
    }
}
