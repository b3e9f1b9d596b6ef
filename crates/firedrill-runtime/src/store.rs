//! Session persistence.
//!
//! The live session is kept in `<state_dir>/session.json` as a
//! schema-versioned snapshot.
//!
//! # Crash Safety
//!
//! Writes use atomic write-to-tempfile + rename to prevent corruption if the
//! process crashes mid-write.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use firedrill_core::{IncidentSession, snapshot};
use tracing::{debug, warn};

use crate::error::RuntimeResult;

/// File name of the snapshot inside the state directory.
pub const SESSION_FILE: &str = "session.json";

/// Snapshot store for the live session.
///
/// The directory is created lazily on the first [`save`](Self::save).
#[derive(Debug)]
pub struct SessionStore {
    dir: PathBuf,
    dir_ensured: AtomicBool,
}

impl SessionStore {
    /// Create a store rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let exists = dir.is_dir();
        Self {
            dir,
            dir_ensured: AtomicBool::new(exists),
        }
    }

    /// Path of the snapshot file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    fn ensure_dir(&self) -> RuntimeResult<()> {
        if self.dir_ensured.load(Ordering::Relaxed) {
            return Ok(());
        }
        std::fs::create_dir_all(&self.dir)?;
        self.dir_ensured.store(true, Ordering::Relaxed);
        Ok(())
    }

    /// Write the session atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be encoded or written.
    pub fn save(&self, session: &IncidentSession) -> RuntimeResult<()> {
        self.ensure_dir()?;

        let path = self.path();
        let text = snapshot::encode(session)?;

        let temp_path = path.with_extension("json.tmp");
        std::fs::write(&temp_path, text)?;
        std::fs::rename(&temp_path, &path).inspect_err(|_| {
            let _ = std::fs::remove_file(&temp_path);
        })?;

        debug!(session_id = %session.id(), path = ?path, "session saved");
        Ok(())
    }

    /// Load the saved session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded
    /// (including an unsupported schema version).
    pub fn load(&self) -> RuntimeResult<Option<IncidentSession>> {
        let path = self.path();
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let session = snapshot::decode(&text)?;
        debug!(session_id = %session.id(), path = ?path, "session loaded");
        Ok(Some(session))
    }

    /// Load the saved session, discarding an unreadable one.
    ///
    /// A snapshot that fails to load is logged and treated as absent, so the
    /// caller starts a fresh incident.
    #[must_use]
    pub fn load_or_discard(&self) -> Option<IncidentSession> {
        match self.load() {
            Ok(session) => session,
            Err(e) => {
                warn!(
                    error = %e,
                    path = ?self.path(),
                    "discarding unreadable session snapshot"
                );
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use firedrill_core::Region;
    use firedrill_test::{fresh_session, investigated};

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested"));
        let mut session = fresh_session();
        investigated(&mut session, Region::EuWest);

        store.save(&session).unwrap();
        assert!(store.path().exists());
        assert!(!store.path().with_extension("json.tmp").exists());

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, session);
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SessionStore::new(dir.path()).load().unwrap().is_none());
    }

    #[test]
    fn snapshot_carries_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.save(&fresh_session()).unwrap();

        let text = std::fs::read_to_string(store.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["schema_version"], 2);
    }

    #[test]
    fn unsupported_version_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        std::fs::write(store.path(), r#"{"schema_version": 9, "session": {}}"#).unwrap();

        assert!(store.load().is_err());
        assert!(store.load_or_discard().is_none());
    }
}
