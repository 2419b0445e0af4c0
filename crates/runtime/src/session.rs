//! Locally persisted sessions for reconnection.
//!
//! One small JSON file per game under the platform data directory, so a
//! participant (or the board itself) can find its way back into a game
//! after a restart without retyping the join code.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use parlor_core::PlayerId;

use crate::codes::JoinCode;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no platform data directory available")]
    NoDataDir,

    #[error("session file I/O failed")]
    Io(#[from] std::io::Error),

    #[error("session file is not valid JSON")]
    Malformed(#[from] serde_json::Error),
}

/// Which side of the game this process was on.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionRole {
    Board,
    Player,
}

/// Everything needed to rejoin one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSession {
    pub code: JoinCode,
    pub player: PlayerId,
    pub role: SessionRole,
}

/// File-per-game session storage.
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Opens the store under the platform data directory, creating it on
    /// first use.
    pub fn open() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "parlor")
            .ok_or(SessionError::NoDataDir)?;
        let dir = dirs.data_local_dir().join("sessions");
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Opens the store at an explicit directory (tests, unusual setups).
    pub fn at(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, code: &JoinCode) -> PathBuf {
        self.dir.join(format!("{}.json", code.as_str()))
    }

    pub fn save(&self, session: &SavedSession) -> Result<()> {
        let json = serde_json::to_vec_pretty(session)?;
        fs::write(self.path_for(&session.code), json)?;
        Ok(())
    }

    pub fn load(&self, code: &JoinCode) -> Result<Option<SavedSession>> {
        match fs::read(self.path_for(code)) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn clear(&self, code: &JoinCode) -> Result<()> {
        match fs::remove_file(self.path_for(code)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// All saved sessions, for a "rejoin a game" listing.
    pub fn list(&self) -> Result<Vec<SavedSession>> {
        let mut sessions = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Ok(bytes) = fs::read(&path)
                && let Ok(session) = serde_json::from_slice(&bytes)
            {
                sessions.push(session);
            }
        }
        sessions.sort_by(|a: &SavedSession, b: &SavedSession| a.code.cmp(&b.code));
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(code: &str) -> SavedSession {
        SavedSession {
            code: JoinCode::from(code),
            player: PlayerId::from("p1"),
            role: SessionRole::Player,
        }
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path()).unwrap();

        store.save(&session("GAME01")).unwrap();
        let loaded = store.load(&JoinCode::from("GAME01")).unwrap();
        assert_eq!(loaded, Some(session("GAME01")));
    }

    #[test]
    fn loading_a_missing_session_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path()).unwrap();
        assert_eq!(store.load(&JoinCode::from("NOPE")).unwrap(), None);
    }

    #[test]
    fn clear_removes_the_file_and_tolerates_absence() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path()).unwrap();

        store.save(&session("GAME01")).unwrap();
        store.clear(&JoinCode::from("GAME01")).unwrap();
        assert_eq!(store.load(&JoinCode::from("GAME01")).unwrap(), None);
        store.clear(&JoinCode::from("GAME01")).unwrap();
    }

    #[test]
    fn list_returns_sessions_sorted_by_code() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::at(dir.path()).unwrap();

        store.save(&session("ZZZZZZ")).unwrap();
        store.save(&session("AAAAAA")).unwrap();

        let codes: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|s| s.code.as_str().to_owned())
            .collect();
        assert_eq!(codes, vec!["AAAAAA".to_owned(), "ZZZZZZ".to_owned()]);
    }
}
