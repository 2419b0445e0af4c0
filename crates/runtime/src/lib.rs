//! Authoritative host around the [`parlor_core`] engine.
//!
//! `parlor-runtime` owns everything the pure engine treats as a boundary:
//! the game-document store and its action queues, join codes, locally
//! persisted sessions, and the per-game board worker that turns queued
//! actions and advance requests into consolidated document writes.

mod board;
pub mod codes;
pub mod error;
pub mod events;
mod handle;
mod runtime;
pub mod session;
pub mod store;

pub use codes::{CODE_LEN, JoinCode};
pub use error::{Result, RuntimeError};
pub use events::GameEvent;
pub use handle::BoardHandle;
pub use runtime::{Board, GameRuntime, GameRuntimeBuilder, RuntimeOptions};
pub use session::{SavedSession, SessionError, SessionRole, SessionStore};
pub use store::{
    ActionSubmission, GameDoc, GamePatch, GameStore, MemoryStore, StoreError,
};
