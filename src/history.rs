//! Client-side snapshot of a user's past verifications
//!
//! The cache never patches entries. Every load replaces the whole sequence,
//! and a finished verification triggers a full reload so the snapshot always
//! matches what the service holds. Loads may overlap; whichever response
//! resolves last is the one kept.

use crate::pipeline::VerificationResult;
use crate::remote::{HistoryEntry, HistorySource, TransportError};
use crate::session::{Session, UserId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

pub struct HistoryCache {
    source: Arc<dyn HistorySource>,
    session: Session,
    snapshot: Mutex<Arc<[HistoryEntry]>>,
    loading: AtomicUsize,
}

/// Decrements the outstanding-load count even if the load future is dropped
struct LoadGuard<'a>(&'a AtomicUsize);

impl<'a> LoadGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl HistoryCache {
    pub fn new(source: Arc<dyn HistorySource>, session: Session) -> Self {
        Self {
            source,
            session,
            snapshot: Mutex::new(Arc::from(Vec::<HistoryEntry>::new())),
            loading: AtomicUsize::new(0),
        }
    }

    /// Current snapshot; cheap to clone and never partially updated
    pub fn entries(&self) -> Arc<[HistoryEntry]> {
        self.snapshot
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }

    /// Fetches the full history for `user_id` and replaces the snapshot.
    /// On error the previous snapshot is kept.
    pub async fn load(&self, user_id: &UserId) -> Result<Arc<[HistoryEntry]>, TransportError> {
        let _guard = LoadGuard::enter(&self.loading);
        debug!(user = %user_id, "Loading verification history");

        let entries: Arc<[HistoryEntry]> = match self.source.verifications(user_id).await {
            Ok(entries) => entries.into(),
            Err(e) => {
                warn!(user = %user_id, error = %e, "History load failed, keeping previous snapshot");
                return Err(e);
            }
        };

        *self.snapshot.lock().unwrap_or_else(|p| p.into_inner()) = entries.clone();
        info!(user = %user_id, count = entries.len(), "History snapshot replaced");
        Ok(entries)
    }

    /// Reloads the session user's history after a run finished
    pub async fn on_verification_complete(
        &self,
        result: &VerificationResult,
    ) -> Result<Arc<[HistoryEntry]>, TransportError> {
        debug!(id = result.id(), status = %result.status(), "Refreshing history after verification");
        self.load(self.session.user_id()).await
    }
}

impl std::fmt::Debug for HistoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryCache")
            .field("user_id", self.session.user_id())
            .field("entries", &self.len())
            .field("loading", &self.is_loading())
            .finish()
    }
}
