//! puresign - staged signature verification client
//!
//! Takes a document image through signature detection, purification and
//! scoring, either fully on the PureSign verification service or with
//! detection on-device, and classifies the final confidence score.
//!
//! # Core Concepts
//!
//! - **Staging**: local validation of the uploaded image (type, size)
//! - **Pipeline**: a state machine over detection → purification → scoring
//!   that owns cancellation and discards responses from stale runs
//! - **Bands**: Verified (≥ 0.70), Uncertain (≥ 0.50) or Failed
//! - **Presentation**: pure stage/gauge/history views for the output layer
//!
//! # Example Usage
//!
//! ```no_run
//! use puresign::{
//!     ApiClient, PipelineOrchestrator, PuresignConfig, RemoteVerifier, Session,
//! };
//! use puresign::session::IdentityStore;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = PuresignConfig::default();
//! let session = Session::resolve(None, config.user_id.as_deref(), &IdentityStore::default());
//! let client = Arc::new(ApiClient::from_config(&config)?);
//!
//! let orchestrator = PipelineOrchestrator::new(Arc::new(RemoteVerifier::new(client)), session);
//! let artifact = config.stager().stage_path(Path::new("scan.png"))?;
//! orchestrator.stage(artifact)?;
//!
//! if let Some(result) = orchestrator.run()?.outcome().await.result() {
//!     println!("{}: {:.2} ({})", result.status(), result.score(), result.band());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`pipeline`]: mode selection, confidence bands, the orchestrator
//! - [`staging`]: upload validation
//! - [`remote`]: REST client and stage adapter
//! - [`ondevice`]: on-device detection capability
//! - [`presenter`]: stage, gauge and history views
//! - [`history`]: snapshot cache of past verifications

pub mod cli;
pub mod config;
pub mod history;
pub mod ondevice;
pub mod pipeline;
pub mod presenter;
pub mod progress;
pub mod remote;
pub mod session;
pub mod staging;
pub mod util;

pub use config::{ConfigError, PuresignConfig};
pub use history::HistoryCache;
pub use ondevice::{DetectionEngine, LocalDetection, OnDeviceDetector};
pub use pipeline::{
    classify, select_mode, Band, Mode, PipelineError, PipelineOrchestrator, PipelineState,
    RunHandle, RunOutcome, RunToken, VerificationResult, VerificationStatus,
};
pub use presenter::{gauge, history_row, present, GaugeView, HistoryRow, StageStatus, StageView};
pub use progress::{LoggingHandler, NoOpHandler, ProgressEvent, ProgressHandler};
pub use remote::{ApiClient, HistoryEntry, RemoteVerifier, TransportError, UserProfile};
pub use session::{Session, UserId};
pub use staging::{StagedArtifact, UploadFile, UploadStager, ValidationError};
pub use util::{init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_puresign() {
        assert_eq!(NAME, "puresign");
    }
}
