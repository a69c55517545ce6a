//! Explicit identity context
//!
//! The active user is resolved once at startup and passed into every
//! component that needs it, instead of being read ad hoc from shared storage.
//!
//! Resolution order:
//! 1. an explicit override (the `--user` flag)
//! 2. `PURESIGN_USER_ID` (via [`PuresignConfig`](crate::config::PuresignConfig))
//! 3. the persisted identity file written by `puresign login`
//! 4. [`DEFAULT_USER_ID`], a development placeholder and not an auth mechanism

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Fallback identity for non-production use
pub const DEFAULT_USER_ID: &str = "default-user-id";

const IDENTITY_FILE: &str = "identity";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Trims input; blank strings are not identities
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    Override,
    Environment,
    Persisted,
    Placeholder,
}

#[derive(Debug, Clone)]
pub struct Session {
    user_id: UserId,
    source: IdentitySource,
}

impl Session {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            source: IdentitySource::Override,
        }
    }

    pub fn resolve(
        override_id: Option<&str>,
        env_id: Option<&str>,
        store: &IdentityStore,
    ) -> Self {
        if let Some(user_id) = override_id.and_then(UserId::parse) {
            return Self {
                user_id,
                source: IdentitySource::Override,
            };
        }

        if let Some(user_id) = env_id.and_then(UserId::parse) {
            return Self {
                user_id,
                source: IdentitySource::Environment,
            };
        }

        if let Some(user_id) = store.load() {
            return Self {
                user_id,
                source: IdentitySource::Persisted,
            };
        }

        warn!(
            "No user identity configured, using placeholder '{}'. Run `puresign login <USER_ID>`",
            DEFAULT_USER_ID
        );
        Self {
            user_id: UserId(DEFAULT_USER_ID.to_string()),
            source: IdentitySource::Placeholder,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn source(&self) -> IdentitySource {
        self.source
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == IdentitySource::Placeholder
    }
}

/// Single key-value slot holding the active user identifier on disk
#[derive(Debug, Clone)]
pub struct IdentityStore {
    path: Option<PathBuf>,
}

impl Default for IdentityStore {
    /// `<config_dir>/puresign/identity`, or no store if the platform has no
    /// config directory
    fn default() -> Self {
        Self {
            path: dirs::config_dir().map(|dir| dir.join("puresign").join(IDENTITY_FILE)),
        }
    }
}

impl IdentityStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn load(&self) -> Option<UserId> {
        let path = self.path.as_ref()?;
        match std::fs::read_to_string(path) {
            Ok(contents) => UserId::parse(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read identity file");
                None
            }
        }
    }

    pub fn save(&self, user_id: &UserId) -> std::io::Result<()> {
        let path = self.path.as_ref().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no configuration directory available for the identity file",
            )
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, user_id.as_str())?;
        debug!(path = %path.display(), "Saved identity");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_user_id_parse() {
        assert_eq!(UserId::parse("  alice \n").unwrap().as_str(), "alice");
        assert!(UserId::parse("   ").is_none());
    }

    #[test]
    fn test_resolution_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = IdentityStore::at(temp_dir.path().join("identity"));
        store.save(&UserId::parse("persisted").unwrap()).unwrap();

        let session = Session::resolve(Some("flag"), Some("env"), &store);
        assert_eq!(session.user_id().as_str(), "flag");
        assert_eq!(session.source(), IdentitySource::Override);

        let session = Session::resolve(None, Some("env"), &store);
        assert_eq!(session.user_id().as_str(), "env");
        assert_eq!(session.source(), IdentitySource::Environment);

        let session = Session::resolve(None, Some(""), &store);
        assert_eq!(session.user_id().as_str(), "persisted");
        assert_eq!(session.source(), IdentitySource::Persisted);
    }

    #[test]
    fn test_placeholder_when_nothing_configured() {
        let session = Session::resolve(None, None, &IdentityStore::disabled());
        assert_eq!(session.user_id().as_str(), DEFAULT_USER_ID);
        assert!(session.is_placeholder());
    }

    #[test]
    fn test_store_roundtrip_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let store = IdentityStore::at(temp_dir.path().join("nested/dir/identity"));

        assert!(store.load().is_none());
        store.save(&UserId::parse("bob").unwrap()).unwrap();
        assert_eq!(store.load().unwrap().as_str(), "bob");
    }

    #[test]
    fn test_disabled_store_cannot_save() {
        let store = IdentityStore::disabled();
        assert!(store.save(&UserId::parse("bob").unwrap()).is_err());
        assert!(store.load().is_none());
    }
}
