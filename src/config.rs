//! Configuration management for puresign
//!
//! Settings are loaded from environment variables with sensible defaults.
//!
//! # Environment Variables
//!
//! - `PURESIGN_API_BASE_URL`: Verification service base URL - default: "http://localhost:8000"
//! - `PURESIGN_MAX_UPLOAD_BYTES`: Largest accepted document in bytes - default: "10485760" (10 MiB)
//! - `PURESIGN_REQUEST_TIMEOUT`: Per-request timeout in seconds - default: "30"
//! - `PURESIGN_LOCAL_PROCESSING`: Prefer on-device detection (true|false) - default: "false"
//! - `PURESIGN_LOG_LEVEL`: Logging level - default: "info"
//! - `PURESIGN_USER_ID`: Active user identifier - default: unset
//!
//! # Example
//!
//! ```no_run
//! use puresign::PuresignConfig;
//!
//! let config = PuresignConfig::default();
//! config.validate().expect("Invalid configuration");
//! println!("{}", config);
//! ```

use crate::staging::{UploadStager, DEFAULT_MAX_UPLOAD_BYTES};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Failed to parse configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },
}

#[derive(Debug, Clone)]
pub struct PuresignConfig {
    /// Verification service base URL, without trailing slash
    pub api_base_url: String,

    /// Upload size limit in bytes
    pub max_upload_bytes: u64,

    /// Per-request transport timeout
    pub request_timeout: Duration,

    /// Default for the on-device detection toggle
    pub local_processing: bool,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Identity from `PURESIGN_USER_ID`
    pub user_id: Option<String>,
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl Default for PuresignConfig {
    /// Loads from `PURESIGN_*` environment variables, falling back to
    /// defaults for anything missing or unparseable
    fn default() -> Self {
        let api_base_url = env::var("PURESIGN_API_BASE_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let max_upload_bytes = env_parsed("PURESIGN_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES);
        let request_timeout = Duration::from_secs(env_parsed(
            "PURESIGN_REQUEST_TIMEOUT",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        ));
        let local_processing = env_parsed("PURESIGN_LOCAL_PROCESSING", false);

        let log_level = env::var("PURESIGN_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        let user_id = env::var("PURESIGN_USER_ID")
            .ok()
            .filter(|v| !v.trim().is_empty());

        Self {
            api_base_url,
            max_upload_bytes,
            request_timeout,
            local_processing,
            log_level,
            user_id,
        }
    }
}

impl PuresignConfig {
    /// Checks that:
    /// - the base URL uses http or https
    /// - the timeout is between 1 second and 10 minutes
    /// - the upload limit is non-zero
    /// - the log level is valid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(ConfigError::ParseError {
                field: "PURESIGN_API_BASE_URL".to_string(),
                error: format!("'{}' is not an http(s) URL", self.api_base_url),
            });
        }

        let timeout = self.request_timeout.as_secs();
        if timeout == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if timeout > MAX_REQUEST_TIMEOUT_SECS {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        if self.max_upload_bytes == 0 {
            return Err(ConfigError::ValidationFailed(
                "Upload limit must be at least 1 byte".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn stager(&self) -> UploadStager {
        UploadStager::new(self.max_upload_bytes)
    }

    pub fn to_display_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert("api_base_url".to_string(), self.api_base_url.clone());
        map.insert(
            "max_upload_bytes".to_string(),
            self.max_upload_bytes.to_string(),
        );
        map.insert(
            "request_timeout_secs".to_string(),
            self.request_timeout.as_secs().to_string(),
        );
        map.insert(
            "local_processing".to_string(),
            self.local_processing.to_string(),
        );
        map.insert("log_level".to_string(), self.log_level.clone());
        if let Some(ref user_id) = self.user_id {
            map.insert("user_id".to_string(), user_id.clone());
        }

        map
    }
}

impl fmt::Display for PuresignConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PureSign Configuration:")?;
        writeln!(f, "  API Base URL: {}", self.api_base_url)?;
        writeln!(f, "  Max Upload: {} bytes", self.max_upload_bytes)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout.as_secs())?;
        writeln!(f, "  Local Processing: {}", self.local_processing)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        if let Some(ref user_id) = self.user_id {
            writeln!(f, "  User: {}", user_id)?;
        }
        Ok(())
    }
}
