//! Progress handler trait and events

use crate::pipeline::{Band, Mode, RunToken, Stage};
use std::time::Duration;

/// Events emitted while a verification run progresses
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Run accepted and mode resolved
    RunStarted {
        token: RunToken,
        mode: Mode,
        file: String,
    },

    /// Stage call issued
    StageStarted { token: RunToken, stage: Stage },

    /// Stage call succeeded
    StageComplete {
        token: RunToken,
        stage: Stage,
        duration: Duration,
    },

    /// On-device detection gave nothing usable; detection goes remote
    Escalated { token: RunToken },

    /// A response arrived for a run that is no longer current
    StaleResponseDiscarded { token: RunToken, stage: Stage },

    /// Run cancelled by the user
    Cancelled { token: Option<RunToken> },

    /// Run reached Complete
    Completed {
        token: RunToken,
        score: f64,
        band: Band,
        total_time: Duration,
    },

    /// Run reached Failed
    Failed {
        token: RunToken,
        stage: Stage,
        error: String,
    },
}

/// Trait for handling progress events during a run
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {
        // Intentionally empty
    }
}
