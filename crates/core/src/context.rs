//! Engine-owned context for a running game.
//!
//! [`EngineContext`] carries the counters and ordering the engine controls.
//! Reducers only ever see a shared reference to it; the fields change solely
//! through the turn/phase advancers or the explicit setters below.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier for a participant (a player or the board process itself).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Lifecycle status of a game document.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameStatus {
    /// Created; participants may still join.
    Waiting,
    /// Started; moves are processed and turns/phases advance.
    Active,
    /// Finished; the document is read-only history.
    Ended,
}

/// Counters and ordering owned by the engine.
///
/// Always reconstructable from the four counters plus `turn_order`; the
/// `phases` sequence is derived once from the phase graph and stored so
/// advancement stays deterministic for the life of the game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineContext {
    /// Monotonic counter, incremented once per completed turn.
    pub turn: u64,

    /// Monotonic counter, incremented once per full wrap of either the
    /// turn order or the phase sequence.
    pub round: u64,

    /// Current phase name; empty when no phases are configured.
    pub phase: String,

    pub status: GameStatus,

    /// Ordered participant identifiers. Empty = turn order not enforced.
    pub turn_order: Vec<PlayerId>,

    /// Index into `turn_order`; meaningful only when `turn_order` is
    /// non-empty, and then always `< turn_order.len()`.
    pub current_player_index: usize,

    /// Phase order derived from the configuration graph.
    pub phases: Vec<String>,
}

impl EngineContext {
    /// Fresh context for a game that has not started.
    pub fn new() -> Self {
        Self {
            turn: 0,
            round: 0,
            phase: String::new(),
            status: GameStatus::Waiting,
            turn_order: Vec::new(),
            current_player_index: 0,
            phases: Vec::new(),
        }
    }

    /// The participant whose turn it is, when a turn order is enforced.
    pub fn current_player(&self) -> Option<&PlayerId> {
        if self.turn_order.is_empty() {
            None
        } else {
            Some(&self.turn_order[self.current_player_index % self.turn_order.len()])
        }
    }

    /// Explicit setter; status is never changed by move reducers.
    pub fn set_status(&mut self, status: GameStatus) {
        self.status = status;
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self::new()
    }
}
