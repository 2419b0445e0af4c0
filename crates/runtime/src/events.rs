//! Notifications published by the board worker.
//!
//! UI bindings subscribe to these instead of polling the store; they are
//! also the observable channel for hook faults and rejected actions the
//! engine absorbs (the transitions themselves never abort on either).

use parlor_core::{ActionId, PlayerId};

/// Broadcast by the board as it drives a game.
#[derive(Clone, Debug)]
pub enum GameEvent {
    /// The game moved from waiting to active.
    Started,

    /// A consolidated state update was written back to the store.
    StateWritten {
        turn: u64,
        round: u64,
        phase: String,
    },

    /// One queued action was applied and removed from the queue.
    ActionApplied { id: ActionId, kind: String },

    /// One queued action was left in the queue.
    ActionRejected {
        id: ActionId,
        kind: String,
        reason: String,
    },

    TurnEnded {
        turn: u64,
        current_player: Option<PlayerId>,
    },

    PhaseEnded {
        phase: String,
    },

    /// A lifecycle hook faulted; the transition still completed.
    HookFaulted { hook: String, message: String },

    GameOver,
}
