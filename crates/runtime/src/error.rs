//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from the store, the session files, and board worker
//! coordination so clients can bubble them up with consistent context.

use thiserror::Error;
use tokio::sync::oneshot;

use parlor_core::GameStatus;

use crate::codes::JoinCode;
use crate::session::SessionError;
use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("game {0} not found")]
    GameNotFound(JoinCode),

    #[error("game {code} is not joinable while {status}")]
    NotJoinable { code: JoinCode, status: GameStatus },

    #[error("game {code} is {actual}, expected {expected}")]
    InvalidStatus {
        code: JoinCode,
        expected: GameStatus,
        actual: GameStatus,
    },

    #[error("could not allocate an unused join code")]
    JoinCodesExhausted,

    #[error("board command channel closed")]
    CommandChannelClosed,

    #[error("board reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("board worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Session(#[from] SessionError),
}
