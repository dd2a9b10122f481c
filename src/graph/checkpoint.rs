//! Session checkpoint store
//!
//! Keyed map from session id to `SessionState`, with optional JSON files on
//! disk so a session survives process restarts. The graph saves after every
//! committed delta; a turn abandoned mid-invocation therefore leaves the
//! last fully committed state behind.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::warn;

use crate::core::Result;
use crate::graph::state::SessionState;

/// Store of per-session conversation state
pub struct CheckpointStore {
    sessions: Mutex<HashMap<String, SessionState>>,
    /// Directory for persisted sessions; None keeps everything in memory
    dir: Option<PathBuf>,
}

impl CheckpointStore {
    /// In-memory store
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            dir: None,
        }
    }

    /// Store that also persists each session as `<dir>/<session_id>.json`
    pub fn with_dir(dir: PathBuf) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            dir: Some(dir),
        }
    }

    /// Load a session's state, falling back to disk
    pub fn load(&self, session_id: &str) -> Option<SessionState> {
        if let Some(state) = self.sessions.lock().unwrap().get(session_id) {
            return Some(state.clone());
        }

        let path = self.session_file(session_id)?;
        let content = fs::read_to_string(path).ok()?;
        match serde_json::from_str::<SessionState>(&content) {
            Ok(state) => {
                self.sessions
                    .lock()
                    .unwrap()
                    .insert(session_id.to_string(), state.clone());
                Some(state)
            }
            Err(e) => {
                warn!(session_id, error = %e, "discarding unreadable session file");
                None
            }
        }
    }

    /// Save a session's state; disk write failures are logged, not fatal
    pub fn save(&self, session_id: &str, state: &SessionState) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session_id.to_string(), state.clone());

        if let Some(path) = self.session_file(session_id) {
            let write = || -> Result<()> {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, serde_json::to_string_pretty(state)?)?;
                Ok(())
            };
            if let Err(e) = write() {
                warn!(session_id, error = %e, "failed to persist session checkpoint");
            }
        }
    }

    /// Remove a session entirely (explicit reset)
    pub fn reset(&self, session_id: &str) {
        self.sessions.lock().unwrap().remove(session_id);
        if let Some(path) = self.session_file(session_id) {
            let _ = fs::remove_file(path);
        }
    }

    fn session_file(&self, session_id: &str) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|d| d.join(format!("{}.json", session_id)))
    }
}

impl Default for CheckpointStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Message;

    #[test]
    fn test_memory_round_trip() {
        let store = CheckpointStore::new();
        assert!(store.load("s1").is_none());

        let mut state = SessionState::new(Some("data.csv".into()));
        state.append(vec![Message::user("hi")]);
        store.save("s1", &state);

        let loaded = store.load("s1").unwrap();
        assert_eq!(loaded.messages.len(), 1);
        assert_eq!(loaded.data_path.as_deref(), Some("data.csv"));

        store.reset("s1");
        assert!(store.load("s1").is_none());
    }

    #[test]
    fn test_disk_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let state = SessionState::new(Some("data.csv".into()));

        {
            let store = CheckpointStore::with_dir(dir.path().to_path_buf());
            store.save("s1", &state);
        }

        // A fresh store over the same directory sees the session
        let store = CheckpointStore::with_dir(dir.path().to_path_buf());
        let loaded = store.load("s1").unwrap();
        assert_eq!(loaded.data_path.as_deref(), Some("data.csv"));
    }
}
