pub mod collaborator;
pub mod confidence;
pub mod mode;
pub mod orchestrator;
pub mod state;
pub mod types;

pub use collaborator::{StageCollaborator, StageJob};
pub use confidence::{classify, Band, Score, ScoreError, UNCERTAIN_THRESHOLD, VERIFIED_THRESHOLD};
pub use mode::{select_mode, Mode};
pub use orchestrator::{PipelineError, PipelineOrchestrator, RunHandle, RunOutcome};
pub use state::{PipelineState, RunToken, Stage, Tagged};
pub use types::{
    ArtifactRef, BoundingBox, Detection, Purification, ScoreReport, VerificationResult,
    VerificationStatus,
};
