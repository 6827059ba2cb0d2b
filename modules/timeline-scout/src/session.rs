use std::path::{Path, PathBuf};

use browser_client::SessionCookie;
use tracing::{debug, info};

use crate::error::{Result, ScoutError};

/// Cookie jar persisted as a pretty-printed JSON array between runs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved cookies, or `None` when there is no usable session file.
    /// A missing or corrupt file is not an error.
    pub fn load(&self) -> Option<Vec<SessionCookie>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                info!(path = %self.path.display(), error = %e, "No saved session found");
                return None;
            }
        };
        match serde_json::from_str::<Vec<SessionCookie>>(&content) {
            Ok(cookies) => {
                debug!(path = %self.path.display(), count = cookies.len(), "Loaded session cookies");
                Some(cookies)
            }
            Err(e) => {
                info!(path = %self.path.display(), error = %e, "Saved session is unreadable, ignoring");
                None
            }
        }
    }

    pub fn persist(&self, cookies: &[SessionCookie]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ScoutError::Session(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        let json = serde_json::to_string_pretty(cookies)
            .map_err(|e| ScoutError::Session(format!("failed to encode cookies: {e}")))?;
        std::fs::write(&self.path, json).map_err(|e| {
            ScoutError::Session(format!("failed to write {}: {e}", self.path.display()))
        })?;
        info!(path = %self.path.display(), count = cookies.len(), "Session saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie(name: &str) -> SessionCookie {
        SessionCookie {
            name: name.into(),
            value: "v".into(),
            domain: ".x.com".into(),
            path: "/".into(),
            expires: 1_900_000_000.0,
            http_only: true,
            secure: true,
            session: false,
        }
    }

    #[test]
    fn missing_file_is_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nope.json"));
        assert!(store.load().is_none());
    }

    #[test]
    fn corrupt_file_is_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(SessionStore::new(path).load().is_none());
    }

    #[test]
    fn persist_creates_parent_dirs_and_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("cookies").join("session.json"));
        store.persist(&[cookie("auth_token"), cookie("ct0")]).unwrap();

        let loaded = store.load().unwrap();
        let names: Vec<_> = loaded.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["auth_token", "ct0"]);
    }
}
