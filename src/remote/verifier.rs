use super::client::VerificationService;
use super::error::TransportError;
use super::wire::VerificationResponse;
use crate::pipeline::{
    ArtifactRef, Detection, Mode, Purification, RunToken, ScoreReport, StageCollaborator,
    StageJob, VerificationStatus,
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::debug;

type Submission = Arc<OnceCell<VerificationResponse>>;

/// Serves the three pipeline stages from a single `/verify` round trip.
///
/// The service runs detection, purification and scoring in one request, so
/// the document is submitted once per run token and each stage reads its
/// piece of that response. A failed submission is not cached; the pipeline
/// fails the run on the first error anyway.
pub struct RemoteVerifier {
    service: Arc<dyn VerificationService>,
    current: Mutex<Option<(RunToken, Submission)>>,
}

impl RemoteVerifier {
    pub fn new(service: Arc<dyn VerificationService>) -> Self {
        Self {
            service,
            current: Mutex::new(None),
        }
    }

    fn submission_for(&self, token: RunToken) -> Submission {
        let mut current = self.current.lock().unwrap_or_else(|p| p.into_inner());
        match current.as_ref() {
            Some((cached, cell)) if *cached == token => cell.clone(),
            _ => {
                let cell = Submission::default();
                *current = Some((token, cell.clone()));
                cell
            }
        }
    }

    async fn response(&self, job: &StageJob) -> Result<VerificationResponse, TransportError> {
        let cell = self.submission_for(job.token);
        let response = cell
            .get_or_try_init(|| async {
                debug!(token = %job.token, mode = %job.mode, "Submitting document for verification");
                self.service
                    .verify(&job.artifact, &job.user_id, job.mode == Mode::Local)
                    .await
            })
            .await?;
        Ok(response.clone())
    }
}

#[async_trait]
impl StageCollaborator for RemoteVerifier {
    async fn detect(&self, job: &StageJob) -> Result<Detection, TransportError> {
        let response = self.response(job).await?;
        let url = response
            .detected_sig_url
            .ok_or_else(|| TransportError::stage("detection", "No signature detected in document"))?;

        Ok(Detection {
            artifact: ArtifactRef::remote(url),
            confidence: None,
        })
    }

    async fn purify(&self, job: &StageJob) -> Result<Purification, TransportError> {
        let response = self.response(job).await?;
        let url = response
            .cleaned_sig_url
            .ok_or_else(|| TransportError::stage("purification", "Signature could not be purified"))?;

        Ok(Purification {
            artifact: ArtifactRef::remote(url),
        })
    }

    async fn score(&self, job: &StageJob) -> Result<ScoreReport, TransportError> {
        let response = self.response(job).await?;
        if response.status == VerificationStatus::Processing {
            return Err(TransportError::stage(
                "scoring",
                "Verification is still processing",
            ));
        }

        Ok(ScoreReport {
            verification_id: response.verification_id,
            score: response.confidence_score,
            status: response.status,
            timestamp: response.timestamp,
        })
    }

    fn name(&self) -> &str {
        "RemoteVerifier"
    }
}
