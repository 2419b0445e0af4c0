//! Store contracts for shared game documents and their action queues.
//!
//! The engine is pure; everything it reads or writes crosses one of these
//! boundaries. A backend must keep two guarantees: queued actions come back
//! oldest-first, and engine-context fields are only ever written through
//! [`GamePatch`] by the authoritative board.

mod doc;
mod error;
mod memory;

pub use doc::GameDoc;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;

use async_trait::async_trait;
use tokio::sync::watch;

use parlor_core::{ActionId, EngineContext, PendingAction, PlayerId};

use crate::codes::JoinCode;

/// A new action as a participant submits it; the store stamps id and
/// creation time on enqueue.
#[derive(Clone, Debug)]
pub struct ActionSubmission {
    pub kind: String,
    pub payload: serde_json::Value,
    pub submitter: PlayerId,
}

/// Partial document update.
///
/// Restricted to the fields the engine computes plus the plumbing fields
/// (`players`, `meta`); absent fields are left untouched.
#[derive(Clone, Debug)]
pub struct GamePatch<S> {
    pub state: Option<S>,
    pub context: Option<EngineContext>,
    pub players: Option<Vec<PlayerId>>,
    pub meta: Option<serde_json::Value>,
}

impl<S> GamePatch<S> {
    pub fn new() -> Self {
        Self {
            state: None,
            context: None,
            players: None,
            meta: None,
        }
    }

    pub fn with_state(mut self, state: S) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_context(mut self, context: EngineContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_players(mut self, players: Vec<PlayerId>) -> Self {
        self.players = Some(players);
        self
    }

    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_none()
            && self.context.is_none()
            && self.players.is_none()
            && self.meta.is_none()
    }
}

impl<S> Default for GamePatch<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Authoritative store for game documents.
///
/// Subscriptions are tokio `watch` channels: always-current, lossy in the
/// middle, which matches a remote document store's snapshot semantics.
#[async_trait]
pub trait GameStore<S>: Send + Sync {
    /// Inserts a new document; fails if the code is taken.
    async fn create(&self, doc: GameDoc<S>) -> Result<()>;

    async fn fetch(&self, code: &JoinCode) -> Result<Option<GameDoc<S>>>;

    /// Applies a partial update and notifies document watchers.
    async fn apply_patch(&self, code: &JoinCode, patch: GamePatch<S>) -> Result<()>;

    /// Yields the current document whenever it changes.
    async fn watch(&self, code: &JoinCode) -> Result<watch::Receiver<GameDoc<S>>>;

    /// Appends a pending action, stamping id and creation time. Any
    /// participant may call this.
    async fn enqueue(&self, code: &JoinCode, submission: ActionSubmission) -> Result<ActionId>;

    /// Oldest-first window of at most `limit` queued actions.
    async fn pending(&self, code: &JoinCode, limit: usize) -> Result<Vec<PendingAction>>;

    /// Versioned signal that the action queue changed.
    async fn watch_queue(&self, code: &JoinCode) -> Result<watch::Receiver<u64>>;

    /// Removes one consumed action; removing an already-gone id is a no-op.
    async fn remove_action(&self, code: &JoinCode, id: &ActionId) -> Result<()>;
}
