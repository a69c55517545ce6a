use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PipelineState {
    Idle,
    Staged,
    Detecting,
    Purifying,
    Scoring,
    Complete,
    Failed,
}

impl PipelineState {
    /// A run is in flight
    pub fn is_running(self) -> bool {
        matches!(
            self,
            PipelineState::Detecting | PipelineState::Purifying | PipelineState::Scoring
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Complete | PipelineState::Failed)
    }

    /// States from which `cancel()` returns to Idle
    pub fn is_cancellable(self) -> bool {
        self == PipelineState::Staged || self.is_running()
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One collaborator-backed phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Detection,
    Purification,
    Scoring,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Detection => "detection",
            Stage::Purification => "purification",
            Stage::Scoring => "scoring",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifies one `run()` invocation. Strictly increasing per orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RunToken(u64);

impl RunToken {
    pub(crate) const INITIAL: RunToken = RunToken(0);

    pub(crate) fn next(self) -> RunToken {
        RunToken(self.0 + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RunToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run#{}", self.0)
    }
}

/// A collaborator response stamped with the run it was issued for
#[derive(Debug)]
pub struct Tagged<T> {
    pub token: RunToken,
    pub value: T,
}

impl<T> Tagged<T> {
    pub fn new(token: RunToken, value: T) -> Self {
        Self { token, value }
    }
}
