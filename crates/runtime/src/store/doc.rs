//! The persisted game document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use parlor_core::{EngineContext, GameStatus, PlayerId};

use crate::codes::JoinCode;

/// One record per game in the authoritative store.
///
/// `context` (and `state`, once the game runs) are written only by the
/// board; `players` and `meta` are plumbing fields any caller may touch
/// through a patch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameDoc<S> {
    pub code: JoinCode,

    /// Identifier of the authoritative board process.
    pub board: PlayerId,

    /// Participants, in join order.
    pub players: Vec<PlayerId>,

    /// Free-form metadata the engine never inspects.
    pub meta: serde_json::Value,

    pub created_at: DateTime<Utc>,

    /// Engine-owned counters and ordering, including the status.
    pub context: EngineContext,

    /// Author-defined game state, replaced wholesale by the board.
    pub state: S,
}

impl<S> GameDoc<S> {
    pub fn status(&self) -> GameStatus {
        self.context.status
    }
}
