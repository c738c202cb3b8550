//! Local session state.
//!
//! Remembers the last joined event code across restarts. The file is
//! removed on full sign-out.

use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::exchange::{EventCode, ExchangeError, Result};

/// Persisted per-device state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Event joined most recently.
    pub last_event: Option<EventCode>,
}

/// JSON file holding the [`SessionState`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Uses `file_name` inside `data_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(data_dir: &Path, file_name: &str) -> Result<Self> {
        std::fs::create_dir_all(data_dir).map_err(|e| {
            ExchangeError::Session(format!("Failed to create data directory: {e}"))
        })?;
        Ok(Self {
            path: data_dir.join(file_name),
        })
    }

    /// Path of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the state; a missing file is an empty state.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<SessionState> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| ExchangeError::Session(format!("Invalid session file: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SessionState::default()),
            Err(e) => Err(ExchangeError::Session(format!(
                "Failed to read session file: {e}"
            ))),
        }
    }

    /// Loads the state, starting over from an empty one if the file is
    /// unreadable. The next save overwrites the bad file.
    fn load_or_reset(&self) -> SessionState {
        self.load().unwrap_or_else(|err| {
            warn!("event=session_reset module=session status=error error={err}");
            SessionState::default()
        })
    }

    /// Writes the state.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, state: &SessionState) -> Result<()> {
        let raw = serde_json::to_string_pretty(state)
            .map_err(|e| ExchangeError::Session(format!("Failed to encode session: {e}")))?;
        std::fs::write(&self.path, raw)
            .map_err(|e| ExchangeError::Session(format!("Failed to write session file: {e}")))
    }

    /// Remembers `code` as the last joined event.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn remember_event(&self, code: &EventCode) -> Result<()> {
        let mut state = self.load_or_reset();
        state.last_event = Some(code.clone());
        self.save(&state)
    }

    /// Forgets the last joined event.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn forget_event(&self) -> Result<()> {
        let mut state = self.load_or_reset();
        if state.last_event.take().is_none() {
            return Ok(());
        }
        self.save(&state)
    }

    /// Deletes the session file.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be removed.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ExchangeError::Session(format!(
                "Failed to remove session file: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(raw: &str) -> EventCode {
        EventCode::parse(raw).unwrap()
    }

    #[test]
    fn missing_file_loads_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path(), "session.json").unwrap();
        assert_eq!(store.load().unwrap(), SessionState::default());
    }

    #[test]
    fn remember_and_forget_event() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path(), "session.json").unwrap();

        store.remember_event(&code("abc123")).unwrap();
        assert_eq!(store.load().unwrap().last_event, Some(code("ABC123")));

        store.forget_event().unwrap();
        assert_eq!(store.load().unwrap().last_event, None);
    }

    #[test]
    fn state_survives_new_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        SessionStore::new(dir.path(), "session.json")
            .unwrap()
            .remember_event(&code("KEEP01"))
            .unwrap();

        let reopened = SessionStore::new(dir.path(), "session.json").unwrap();
        assert_eq!(reopened.load().unwrap().last_event, Some(code("KEEP01")));
    }

    #[test]
    fn clear_removes_file_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path(), "session.json").unwrap();
        store.remember_event(&code("GONE01")).unwrap();
        assert!(store.path().exists());

        store.clear().unwrap();
        assert!(!store.path().exists());
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path(), "session.json").unwrap();
        std::fs::write(store.path(), "{not json").unwrap();

        assert!(matches!(store.load(), Err(ExchangeError::Session(_))));
    }

    #[test]
    fn remember_replaces_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path(), "session.json").unwrap();
        std::fs::write(store.path(), "{not json").unwrap();

        store.remember_event(&code("NEW001")).unwrap();
        assert_eq!(store.load().unwrap().last_event, Some(code("NEW001")));
    }

    #[test]
    fn forget_on_corrupt_file_leaves_it_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path(), "session.json").unwrap();
        std::fs::write(store.path(), "{not json").unwrap();

        store.forget_event().unwrap();
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "{not json");
    }

    #[test]
    fn new_creates_nested_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = SessionStore::new(&nested, "session.json").unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.path(), nested.join("session.json"));
    }
}
