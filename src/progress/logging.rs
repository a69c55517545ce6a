//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::RunStarted { token, mode, file } => {
                info!(%token, %mode, file = %file, "Starting verification");
            }
            ProgressEvent::StageStarted { token, stage } => {
                info!(%token, stage = %stage, "Starting stage");
            }
            ProgressEvent::StageComplete {
                token,
                stage,
                duration,
            } => {
                info!(
                    %token,
                    stage = %stage,
                    duration_ms = duration.as_millis(),
                    "Stage complete"
                );
            }
            ProgressEvent::Escalated { token } => {
                info!(%token, "On-device detection unavailable, escalating to remote");
            }
            ProgressEvent::StaleResponseDiscarded { token, stage } => {
                debug!(%token, stage = %stage, "Discarding response for stale run");
            }
            ProgressEvent::Cancelled { token } => match token {
                Some(token) => info!(%token, "Verification cancelled"),
                None => info!("Staged upload discarded"),
            },
            ProgressEvent::Completed {
                token,
                score,
                band,
                total_time,
            } => {
                info!(
                    %token,
                    score,
                    band = %band,
                    total_time_ms = total_time.as_millis(),
                    "Verification complete"
                );
            }
            ProgressEvent::Failed {
                token,
                stage,
                error,
            } => {
                warn!(%token, stage = %stage, error = %error, "Verification failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{RunToken, Stage};

    #[test]
    fn test_logging_handler_handles_every_event() {
        let handler = LoggingHandler;
        let token = RunToken::INITIAL.next();

        handler.on_progress(&ProgressEvent::StaleResponseDiscarded {
            token,
            stage: Stage::Purification,
        });
        handler.on_progress(&ProgressEvent::Cancelled { token: Some(token) });
        handler.on_progress(&ProgressEvent::Failed {
            token,
            stage: Stage::Scoring,
            error: "boom".to_string(),
        });
    }
}
