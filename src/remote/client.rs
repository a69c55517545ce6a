//! HTTP client for the PureSign verification service

use super::error::TransportError;
use super::wire::{
    ErrorBody, HealthStatus, HistoryEntry, ProfileEnvelope, UserProfile, VerificationResponse,
    VerificationsEnvelope,
};
use crate::config::PuresignConfig;
use crate::session::UserId;
use crate::staging::StagedArtifact;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// One `/verify` submission
#[async_trait]
pub trait VerificationService: Send + Sync {
    async fn verify(
        &self,
        artifact: &StagedArtifact,
        user_id: &UserId,
        local_processing: bool,
    ) -> Result<VerificationResponse, TransportError>;
}

/// Source of a user's past verifications
#[async_trait]
pub trait HistorySource: Send + Sync {
    async fn verifications(&self, user_id: &UserId) -> Result<Vec<HistoryEntry>, TransportError>;
}

/// Thin reqwest wrapper over the service's REST endpoints.
///
/// No retries. Every failure, including the per-request timeout, is a
/// [`TransportError`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    base: Url,
    http_client: Client,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("puresign/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        let base = Url::parse(&base_url).map_err(|e| TransportError::InvalidUrl {
            url: base_url.clone(),
            message: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl {
                url: base_url,
                message: "not a hierarchical URL".to_string(),
            });
        }

        Ok(Self {
            base_url,
            base,
            http_client,
            timeout,
        })
    }

    pub fn from_config(config: &PuresignConfig) -> Result<Self, TransportError> {
        Self::new(config.api_base_url.clone(), config.request_timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL plus `segments`, each percent-encoded as one path segment
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub async fn profile(&self, user_id: &UserId) -> Result<UserProfile, TransportError> {
        let url = self.endpoint(&["profile", user_id.as_str()]);
        debug!("Fetching profile from {}", url);

        let response = self.send(self.http_client.get(url)).await?;
        let envelope: ProfileEnvelope = Self::decode(response).await?;
        Ok(envelope.profile)
    }

    pub async fn health(&self) -> Result<HealthStatus, TransportError> {
        let url = self.endpoint(&["health"]);
        debug!("Checking service health at {}", url);

        let response = self.send(self.http_client.get(url)).await?;
        Self::decode(response).await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, TransportError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                error!("Request timed out after {:?}", self.timeout);
                TransportError::network(format!(
                    "Request timed out after {}s",
                    self.timeout.as_secs()
                ))
            } else if e.is_connect() {
                error!("Cannot connect to {}", self.base_url);
                TransportError::network(format!("Connection failed: {}", e))
            } else {
                TransportError::from(e)
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_detail);
        error!("Service returned error status {}: {}", status, body);

        Err(TransportError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| {
            error!("Failed to parse service response: {}", e);
            TransportError::invalid_response(format!("JSON parse error: {}", e))
        })
    }
}

#[async_trait]
impl VerificationService for ApiClient {
    async fn verify(
        &self,
        artifact: &StagedArtifact,
        user_id: &UserId,
        local_processing: bool,
    ) -> Result<VerificationResponse, TransportError> {
        let url = self.endpoint(&["verify"]);

        let part = Part::stream(artifact.content())
            .file_name(artifact.name().to_string())
            .mime_str(artifact.mime().as_str())?;
        let form = Form::new()
            .part("file", part)
            .text("user_id", user_id.as_str().to_string());

        // The service reads user_id from the query string as well as the form
        let local_processing = if local_processing { "true" } else { "false" };
        let request = self
            .http_client
            .post(url.clone())
            .query(&[
                ("local_processing", local_processing),
                ("user_id", user_id.as_str()),
            ])
            .multipart(form);

        debug!(
            file = artifact.name(),
            size = artifact.size(),
            local_processing,
            "Submitting document to {}",
            url
        );
        let start = Instant::now();

        let response = self.send(request).await?;
        let verification: VerificationResponse = Self::decode(response).await?;

        info!(
            id = %verification.verification_id,
            status = %verification.status,
            "Verification response received in {:.2}s",
            start.elapsed().as_secs_f64()
        );
        Ok(verification)
    }
}

#[async_trait]
impl HistorySource for ApiClient {
    async fn verifications(&self, user_id: &UserId) -> Result<Vec<HistoryEntry>, TransportError> {
        let url = self.endpoint(&["verifications", user_id.as_str()]);
        debug!("Loading history from {}", url);

        let response = self.send(self.http_client.get(url)).await?;
        let envelope: VerificationsEnvelope = Self::decode(response).await?;
        Ok(envelope.verifications)
    }
}
