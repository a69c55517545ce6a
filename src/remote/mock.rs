use super::error::TransportError;
use crate::pipeline::{
    ArtifactRef, BoundingBox, Detection, Purification, RunToken, ScoreReport, Stage,
    StageCollaborator, StageJob, VerificationStatus, VERIFIED_THRESHOLD,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Holds stage calls until released, one call per `release()`
#[derive(Debug)]
pub struct Gate(Semaphore);

impl Gate {
    pub fn new() -> Self {
        Self(Semaphore::new(0))
    }

    /// Lets one held (or future) call through
    pub fn release(&self) {
        self.0.add_permits(1);
    }

    /// Lets every call through from now on
    pub fn open(&self) {
        self.0.close();
    }

    async fn pass(&self) {
        if let Ok(permit) = self.0.acquire().await {
            permit.forget();
        }
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct Queues {
    detections: VecDeque<Result<Detection, TransportError>>,
    purifications: VecDeque<Result<Purification, TransportError>>,
    scores: VecDeque<Result<ScoreReport, TransportError>>,
    calls: Vec<(Stage, RunToken)>,
}

/// Scripted collaborator: each stage pops its next queued response.
/// An empty queue yields a network error.
pub struct MockCollaborator {
    queues: Mutex<Queues>,
    gates: HashMap<Stage, Arc<Gate>>,
    name: String,
}

impl MockCollaborator {
    pub fn new() -> Self {
        Self {
            queues: Mutex::new(Queues::default()),
            gates: HashMap::new(),
            name: "MockCollaborator".to_string(),
        }
    }

    /// Calls for `stage` wait on `gate` before taking their response
    pub fn with_gate(mut self, stage: Stage, gate: Arc<Gate>) -> Self {
        self.gates.insert(stage, gate);
        self
    }

    pub fn add_detection(&self, response: Result<Detection, TransportError>) {
        self.queues().detections.push_back(response);
    }

    pub fn add_purification(&self, response: Result<Purification, TransportError>) {
        self.queues().purifications.push_back(response);
    }

    pub fn add_score(&self, response: Result<ScoreReport, TransportError>) {
        self.queues().scores.push_back(response);
    }

    /// Queues one full successful run ending in `score`
    pub fn succeed_with(&self, score: f64) {
        let mut queues = self.queues();
        queues
            .detections
            .push_back(Ok(Self::detected([100.0, 100.0, 400.0, 300.0])));
        queues
            .purifications
            .push_back(Ok(Self::purified("https://cdn.example/cleaned.jpg")));
        queues
            .scores
            .push_back(Ok(Self::report(uuid::Uuid::new_v4().to_string(), score)));
    }

    pub fn detected(bbox: [f64; 4]) -> Detection {
        let bbox = BoundingBox::from_array(bbox);
        Detection {
            artifact: ArtifactRef::remote(format!(
                "https://cdn.example/detected_{}x{}.jpg",
                bbox.width(),
                bbox.height()
            )),
            confidence: Some(0.9),
        }
    }

    pub fn purified(url: impl Into<String>) -> Purification {
        Purification {
            artifact: ArtifactRef::remote(url),
        }
    }

    /// Scored report with the service's verdict: success at or above the
    /// verified threshold, failed below it
    pub fn report(id: impl Into<String>, score: f64) -> ScoreReport {
        let status = if score >= VERIFIED_THRESHOLD {
            VerificationStatus::Success
        } else {
            VerificationStatus::Failed
        };
        Self::verdict(id, score, status)
    }

    pub fn verdict(id: impl Into<String>, score: f64, status: VerificationStatus) -> ScoreReport {
        ScoreReport {
            verification_id: id.into(),
            score,
            status,
            timestamp: None,
        }
    }

    pub fn calls_for(&self, stage: Stage) -> usize {
        self.queues().calls.iter().filter(|(s, _)| *s == stage).count()
    }

    /// Every call received so far, in arrival order
    pub fn calls(&self) -> Vec<(Stage, RunToken)> {
        self.queues().calls.clone()
    }

    pub fn remaining_scores(&self) -> usize {
        self.queues().scores.len()
    }

    fn queues(&self) -> std::sync::MutexGuard<'_, Queues> {
        self.queues.lock().unwrap_or_else(|p| p.into_inner())
    }

    async fn enter(&self, stage: Stage, token: RunToken) {
        self.queues().calls.push((stage, token));
        if let Some(gate) = self.gates.get(&stage) {
            gate.pass().await;
        }
    }
}

impl Default for MockCollaborator {
    fn default() -> Self {
        Self::new()
    }
}

fn exhausted<T>() -> Result<T, TransportError> {
    Err(TransportError::network("No more responses in queue"))
}

#[async_trait]
impl StageCollaborator for MockCollaborator {
    async fn detect(&self, job: &StageJob) -> Result<Detection, TransportError> {
        self.enter(Stage::Detection, job.token).await;
        self.queues().detections.pop_front().unwrap_or_else(exhausted)
    }

    async fn purify(&self, job: &StageJob) -> Result<Purification, TransportError> {
        self.enter(Stage::Purification, job.token).await;
        self.queues().purifications.pop_front().unwrap_or_else(exhausted)
    }

    async fn score(&self, job: &StageJob) -> Result<ScoreReport, TransportError> {
        self.enter(Stage::Scoring, job.token).await;
        self.queues().scores.pop_front().unwrap_or_else(exhausted)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Mode;
    use crate::session::UserId;
    use crate::staging::{UploadFile, UploadStager};

    fn job() -> StageJob {
        StageJob {
            token: RunToken::INITIAL.next(),
            mode: Mode::Remote,
            user_id: UserId::parse("u").unwrap(),
            artifact: UploadStager::default()
                .validate(UploadFile::new("a.png", "image/png", vec![0u8; 4]))
                .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_empty_queue_errors() {
        let mock = MockCollaborator::new();
        let err = mock.detect(&job()).await.unwrap_err();
        assert_eq!(err, TransportError::network("No more responses in queue"));
        assert_eq!(mock.calls_for(Stage::Detection), 1);
    }

    #[tokio::test]
    async fn test_queued_responses_in_order() {
        let mock = MockCollaborator::new();
        mock.add_score(Ok(MockCollaborator::report("a", 0.1)));
        mock.add_score(Ok(MockCollaborator::report("b", 0.2)));

        assert_eq!(mock.score(&job()).await.unwrap().verification_id, "a");
        assert_eq!(mock.score(&job()).await.unwrap().verification_id, "b");
        assert_eq!(mock.remaining_scores(), 0);
    }

    #[tokio::test]
    async fn test_open_gate_passes_everything() {
        let gate = Arc::new(Gate::new());
        gate.open();
        let mock = MockCollaborator::new().with_gate(Stage::Purification, gate);
        mock.succeed_with(0.5);

        assert!(mock.purify(&job()).await.is_ok());
        assert_eq!(mock.calls()[0].0, Stage::Purification);
    }
}
