use super::collaborator::{StageCollaborator, StageJob};
use super::confidence::Score;
use super::mode::{select_mode, Mode};
use super::state::{PipelineState, RunToken, Stage, Tagged};
use super::types::{ArtifactRef, Detection, Purification, ScoreReport, VerificationResult, VerificationStatus};
use crate::ondevice::OnDeviceDetector;
use crate::progress::{ProgressEvent, ProgressHandler};
use crate::remote::TransportError;
use crate::session::Session;
use crate::staging::StagedArtifact;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("A verification is already in progress")]
    Busy,

    #[error("No document staged. Select a file first")]
    NothingStaged,
}

/// How a run ended, from the caller's point of view
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Run reached Complete or Failed
    Finished(VerificationResult),
    /// Run was cancelled; its late responses were discarded
    Abandoned,
}

impl RunOutcome {
    pub fn result(self) -> Option<VerificationResult> {
        match self {
            RunOutcome::Finished(result) => Some(result),
            RunOutcome::Abandoned => None,
        }
    }
}

/// Result channel for one `run()`
#[derive(Debug)]
pub struct RunHandle {
    token: RunToken,
    task: JoinHandle<RunOutcome>,
}

impl RunHandle {
    pub fn token(&self) -> RunToken {
        self.token
    }

    pub async fn outcome(self) -> RunOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(token = %self.token, error = %e, "Pipeline task ended abnormally");
                RunOutcome::Abandoned
            }
        }
    }
}

struct Inner {
    state: PipelineState,
    last_token: RunToken,
    active: Option<RunToken>,
    staged: Option<StagedArtifact>,
    local_processing: bool,
    last_result: Option<VerificationResult>,
}

struct Core {
    inner: Mutex<Inner>,
    state_tx: watch::Sender<PipelineState>,
}

impl Core {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, inner: &mut Inner, state: PipelineState) {
        inner.state = state;
        self.state_tx.send_replace(state);
    }
}

/// Artifacts gathered so far; kept when a later stage fails
#[derive(Debug, Default)]
struct Partial {
    detected: Option<ArtifactRef>,
    purified: Option<ArtifactRef>,
}

enum Step<T> {
    Advance(T),
    Fail(TransportError),
    Stale,
}

/// Drives detection → purification → scoring for one staged document at a
/// time.
///
/// State and the current [`RunToken`] live behind a single lock that is never
/// held across an await. Every collaborator response is checked against the
/// current token before it may move the state, so responses that arrive after
/// `cancel()` (or after a newer run started) are dropped.
#[derive(Clone)]
pub struct PipelineOrchestrator {
    core: Arc<Core>,
    remote: Arc<dyn StageCollaborator>,
    on_device: OnDeviceDetector,
    session: Session,
    progress_handler: Option<Arc<dyn ProgressHandler>>,
}

impl PipelineOrchestrator {
    pub fn new(remote: Arc<dyn StageCollaborator>, session: Session) -> Self {
        let (state_tx, _) = watch::channel(PipelineState::Idle);
        Self {
            core: Arc::new(Core {
                inner: Mutex::new(Inner {
                    state: PipelineState::Idle,
                    last_token: RunToken::INITIAL,
                    active: None,
                    staged: None,
                    local_processing: false,
                    last_result: None,
                }),
                state_tx,
            }),
            remote,
            on_device: OnDeviceDetector::Unavailable,
            session,
            progress_handler: None,
        }
    }

    pub fn with_on_device(mut self, on_device: OnDeviceDetector) -> Self {
        self.on_device = on_device;
        self
    }

    pub fn with_progress(mut self, handler: Arc<dyn ProgressHandler>) -> Self {
        self.progress_handler = Some(handler);
        self
    }

    pub fn with_local_processing(self, enabled: bool) -> Self {
        self.set_local_processing(enabled);
        self
    }

    /// User toggle for on-device detection; read once per `run()`
    pub fn set_local_processing(&self, enabled: bool) {
        self.core.lock().local_processing = enabled;
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> PipelineState {
        self.core.lock().state
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.core.state_tx.subscribe()
    }

    /// Token of the run in flight, if any
    pub fn current_token(&self) -> Option<RunToken> {
        self.core.lock().active
    }

    pub fn last_result(&self) -> Option<VerificationResult> {
        self.core.lock().last_result.clone()
    }

    /// Hands a validated document to the pipeline. Replaces any document
    /// already staged; a finished run's state gives way to a fresh lifecycle.
    pub fn stage(&self, artifact: StagedArtifact) -> Result<(), PipelineError> {
        let mut inner = self.core.lock();
        if inner.state.is_running() {
            return Err(PipelineError::Busy);
        }

        debug!(file = artifact.name(), size = artifact.size(), "Document staged");
        inner.staged = Some(artifact);
        self.core.set_state(&mut inner, PipelineState::Staged);
        Ok(())
    }

    /// Starts a run over the staged document.
    ///
    /// Resolves the mode, mints a new token and moves to Detecting before
    /// returning, so a second call is rejected with `Busy` right away. Must be
    /// called from within a Tokio runtime.
    pub fn run(&self) -> Result<RunHandle, PipelineError> {
        let job = {
            let mut inner = self.core.lock();
            if inner.state.is_running() {
                return Err(PipelineError::Busy);
            }
            if inner.state != PipelineState::Staged {
                return Err(PipelineError::NothingStaged);
            }
            let artifact = inner.staged.take().ok_or(PipelineError::NothingStaged)?;

            let mode = select_mode(inner.local_processing, || self.on_device.is_available());
            let token = inner.last_token.next();
            inner.last_token = token;
            inner.active = Some(token);
            self.core.set_state(&mut inner, PipelineState::Detecting);

            StageJob {
                token,
                mode,
                user_id: self.session.user_id().clone(),
                artifact,
            }
        };

        let token = job.token;
        self.emit(ProgressEvent::RunStarted {
            token,
            mode: job.mode,
            file: job.artifact.name().to_string(),
        });

        let this = self.clone();
        let task = tokio::spawn(async move { this.drive(job).await });

        Ok(RunHandle { token, task })
    }

    /// Returns to Idle from Staged or any in-flight stage and invalidates the
    /// current token. Outstanding collaborator calls are not interrupted;
    /// their responses are discarded on arrival. Returns `false` when there
    /// was nothing to cancel.
    pub fn cancel(&self) -> bool {
        let token = {
            let mut inner = self.core.lock();
            if !inner.state.is_cancellable() {
                return false;
            }
            inner.staged = None;
            let token = inner.active.take();
            self.core.set_state(&mut inner, PipelineState::Idle);
            token
        };

        self.emit(ProgressEvent::Cancelled { token });
        true
    }

    async fn drive(self, job: StageJob) -> RunOutcome {
        let started = Instant::now();
        let mut partial = Partial::default();

        let issued = Instant::now();
        let response = self.detect(&job).await;
        let detection = match self.settle(response, Stage::Detection, issued) {
            Step::Advance(detection) => detection,
            Step::Fail(e) => return self.fail(&job, Stage::Detection, e, partial),
            Step::Stale => return RunOutcome::Abandoned,
        };
        partial.detected = Some(detection.artifact);

        let issued = Instant::now();
        let response = self.purify(&job).await;
        let purification = match self.settle(response, Stage::Purification, issued) {
            Step::Advance(purification) => purification,
            Step::Fail(e) => return self.fail(&job, Stage::Purification, e, partial),
            Step::Stale => return RunOutcome::Abandoned,
        };
        partial.purified = Some(purification.artifact);

        let response = self.score(&job).await;
        self.complete(&job, response, partial, started)
    }

    async fn detect(&self, job: &StageJob) -> Tagged<Result<Detection, TransportError>> {
        self.emit(ProgressEvent::StageStarted {
            token: job.token,
            stage: Stage::Detection,
        });

        if job.mode == Mode::Local {
            if let Some(detection) = self.on_device.detect(&job.artifact).await {
                return Tagged::new(job.token, Ok(detection));
            }
            if !self.is_current(job.token) {
                // settle() drops this without looking at the value
                return Tagged::new(
                    job.token,
                    Err(TransportError::stage("detection", "run no longer current")),
                );
            }
            self.emit(ProgressEvent::Escalated { token: job.token });
        }

        Tagged::new(job.token, self.remote.detect(job).await)
    }

    async fn purify(&self, job: &StageJob) -> Tagged<Result<Purification, TransportError>> {
        self.emit(ProgressEvent::StageStarted {
            token: job.token,
            stage: Stage::Purification,
        });
        Tagged::new(job.token, self.remote.purify(job).await)
    }

    async fn score(&self, job: &StageJob) -> Tagged<Result<ScoreReport, TransportError>> {
        self.emit(ProgressEvent::StageStarted {
            token: job.token,
            stage: Stage::Scoring,
        });
        Tagged::new(job.token, self.remote.score(job).await)
    }

    fn is_current(&self, token: RunToken) -> bool {
        self.core.lock().active == Some(token)
    }

    /// Accepts a detection or purification response: a success for the
    /// current run advances to the next stage's state.
    fn settle<T>(
        &self,
        response: Tagged<Result<T, TransportError>>,
        stage: Stage,
        issued: Instant,
    ) -> Step<T> {
        let Tagged { token, value } = response;
        let mut inner = self.core.lock();
        if inner.active != Some(token) {
            drop(inner);
            self.emit(ProgressEvent::StaleResponseDiscarded { token, stage });
            return Step::Stale;
        }

        let value = match value {
            Ok(value) => value,
            Err(e) => return Step::Fail(e),
        };

        let next = match stage {
            Stage::Detection => PipelineState::Purifying,
            Stage::Purification | Stage::Scoring => PipelineState::Scoring,
        };
        self.core.set_state(&mut inner, next);
        drop(inner);

        self.emit(ProgressEvent::StageComplete {
            token,
            stage,
            duration: issued.elapsed(),
        });
        Step::Advance(value)
    }

    fn complete(
        &self,
        job: &StageJob,
        response: Tagged<Result<ScoreReport, TransportError>>,
        partial: Partial,
        started: Instant,
    ) -> RunOutcome {
        let Tagged { token, value } = response;

        let scored = value.and_then(|report| {
            if report.status == VerificationStatus::Processing {
                return Err(TransportError::invalid_response(
                    "score reported while verification is still processing",
                ));
            }
            Score::new(report.score)
                .map(|score| (report, score))
                .map_err(|e| TransportError::invalid_response(e.to_string()))
        });

        let (report, score) = match scored {
            Ok(scored) => scored,
            Err(e) => return self.fail(job, Stage::Scoring, e, partial),
        };

        let result = VerificationResult::new(
            report.verification_id,
            partial.detected,
            partial.purified,
            score,
            report.status,
            job.mode,
            report.timestamp.unwrap_or_else(Utc::now),
            None,
        );

        if !self.finish(token, PipelineState::Complete, &result) {
            self.emit(ProgressEvent::StaleResponseDiscarded {
                token,
                stage: Stage::Scoring,
            });
            return RunOutcome::Abandoned;
        }

        info!(%token, id = result.id(), score = result.score(), band = %result.band(), "Run complete");
        self.emit(ProgressEvent::Completed {
            token,
            score: result.score(),
            band: result.band(),
            total_time: started.elapsed(),
        });
        RunOutcome::Finished(result)
    }

    fn fail(
        &self,
        job: &StageJob,
        stage: Stage,
        error: TransportError,
        partial: Partial,
    ) -> RunOutcome {
        let token = job.token;
        let result = VerificationResult::new(
            Uuid::new_v4().to_string(),
            partial.detected,
            partial.purified,
            Score::ZERO,
            VerificationStatus::Failed,
            job.mode,
            Utc::now(),
            Some(error.user_message()),
        );

        if !self.finish(token, PipelineState::Failed, &result) {
            self.emit(ProgressEvent::StaleResponseDiscarded { token, stage });
            return RunOutcome::Abandoned;
        }

        self.emit(ProgressEvent::Failed {
            token,
            stage,
            error: error.to_string(),
        });
        RunOutcome::Finished(result)
    }

    /// Moves the current run to a terminal state. `false` if `token` is stale.
    fn finish(&self, token: RunToken, state: PipelineState, result: &VerificationResult) -> bool {
        let mut inner = self.core.lock();
        if inner.active != Some(token) {
            return false;
        }
        inner.active = None;
        inner.last_result = Some(result.clone());
        self.core.set_state(&mut inner, state);
        true
    }

    fn emit(&self, event: ProgressEvent) {
        if let Some(handler) = &self.progress_handler {
            handler.on_progress(&event);
        }
    }
}

impl std::fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("state", &self.state())
            .field("remote", &self.remote.name())
            .field("on_device", &self.on_device)
            .field("user_id", self.session.user_id())
            .finish()
    }
}
