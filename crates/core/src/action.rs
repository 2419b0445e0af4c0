//! Queued action requests submitted by participants.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::PlayerId;

/// Identifier for a queued action, assigned by the store on enqueue.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub String);

impl ActionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ActionId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// A participant's request to run a move reducer.
///
/// Lives in the per-game queue until the board consumes it by applying it
/// successfully; a rejected action stays queued.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingAction {
    pub id: ActionId,

    /// Action-type name, resolved against the move tables.
    pub kind: String,

    /// Opaque move payload; only the reducer interprets it.
    pub payload: serde_json::Value,

    pub submitter: PlayerId,

    pub created_at: DateTime<Utc>,
}
