//! Remote collaborators: the REST client, the stage adapter over `/verify`,
//! and a scripted mock for tests

pub mod client;
pub mod error;
pub mod mock;
pub mod verifier;
pub mod wire;

pub use client::{ApiClient, HistorySource, VerificationService};
pub use error::{TransportError, GENERIC_FAILURE_MESSAGE};
pub use mock::{Gate, MockCollaborator};
pub use verifier::RemoteVerifier;
pub use wire::{parse_timestamp, HealthStatus, HistoryEntry, UserProfile, VerificationResponse};
