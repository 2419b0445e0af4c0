//! Store-layer errors.

use crate::codes::JoinCode;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Clone, Debug, thiserror::Error)]
pub enum StoreError {
    #[error("game {0} already exists")]
    AlreadyExists(JoinCode),

    #[error("game {0} not found")]
    NotFound(JoinCode),

    #[error("store lock poisoned")]
    LockPoisoned,

    /// Escape hatch for backend-specific failures (network, permissions).
    #[error("store backend error: {0}")]
    Backend(String),
}
