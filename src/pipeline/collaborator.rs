use super::mode::Mode;
use super::state::RunToken;
use super::types::{Detection, Purification, ScoreReport};
use crate::remote::TransportError;
use crate::session::UserId;
use crate::staging::StagedArtifact;
use async_trait::async_trait;

/// Everything a collaborator needs to serve one run
#[derive(Debug, Clone)]
pub struct StageJob {
    pub token: RunToken,
    pub mode: Mode,
    pub user_id: UserId,
    pub artifact: StagedArtifact,
}

/// The three remote stages of a verification run.
///
/// Calls for one run arrive in order (detect, purify, score), each only after
/// the previous one succeeded. `detect` is skipped when on-device detection
/// already produced a region.
#[async_trait]
pub trait StageCollaborator: Send + Sync {
    async fn detect(&self, job: &StageJob) -> Result<Detection, TransportError>;

    async fn purify(&self, job: &StageJob) -> Result<Purification, TransportError>;

    async fn score(&self, job: &StageJob) -> Result<ScoreReport, TransportError>;

    fn name(&self) -> &str;
}
