//! Collaborator failures
//!
//! Every failing collaborator call (network error, non-2xx status, unusable
//! body, or a stage the service could not complete) is a [`TransportError`].
//! The pipeline turns it into a Failed run and shows [`TransportError::user_message`].

use thiserror::Error;

/// Shown when the collaborator gave no detail of its own
pub const GENERIC_FAILURE_MESSAGE: &str = "Verification failed";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, timeout and the like
    #[error("Network error: {message}")]
    Network { message: String },

    /// Non-2xx status, with the service's `detail` text when it sent one
    #[error("Service returned {status}{}", detail_suffix(.detail))]
    Status { status: u16, detail: Option<String> },

    /// Body did not match the expected shape or values
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    /// Base URL the client cannot build request URLs from
    #[error("Invalid service URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// The collaborator answered but could not produce this stage's output
    #[error("{stage} unavailable: {message}")]
    Stage {
        stage: &'static str,
        message: String,
    },
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_ref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default()
}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        TransportError::Network {
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        TransportError::InvalidResponse {
            message: message.into(),
        }
    }

    pub fn stage(stage: &'static str, message: impl Into<String>) -> Self {
        TransportError::Stage {
            stage,
            message: message.into(),
        }
    }

    /// Text for the user: the collaborator's own detail if present
    pub fn user_message(&self) -> String {
        match self {
            TransportError::Status {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.clone(),
            TransportError::Stage { message, .. } if !message.trim().is_empty() => message.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            TransportError::invalid_response(e.to_string())
        } else if let Some(status) = e.status() {
            TransportError::Status {
                status: status.as_u16(),
                detail: None,
            }
        } else {
            TransportError::network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_detail() {
        let err = TransportError::Status {
            status: 404,
            detail: Some("User profile not found".to_string()),
        };
        assert_eq!(err.user_message(), "User profile not found");
        assert_eq!(err.to_string(), "Service returned 404: User profile not found");
    }

    #[test]
    fn test_user_message_falls_back() {
        let err = TransportError::Status {
            status: 500,
            detail: None,
        };
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
        assert_eq!(err.to_string(), "Service returned 500");

        let err = TransportError::network("connection refused");
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);

        let err = TransportError::Status {
            status: 500,
            detail: Some("  ".to_string()),
        };
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_stage_error_message() {
        let err = TransportError::stage("purification", "no signature to purify");
        assert_eq!(err.user_message(), "no signature to purify");
        assert_eq!(err.to_string(), "purification unavailable: no signature to purify");
    }
}
