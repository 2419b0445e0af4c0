//! Deterministic game-state transition engine for shared game documents.
//!
//! `parlor-core` turns a declarative configuration of phases and moves into
//! pure transition functions: applying queued actions, ending turns, and
//! ending phases. All state mutation flows through [`engine::Engine`]; the
//! host process (the board) decides when to invoke a transition and writes
//! the result back to the shared document.

pub mod action;
pub mod apply;
pub mod config;
pub mod context;
pub mod engine;
pub mod phase;
pub mod turn;

pub use action::{ActionId, PendingAction};
pub use apply::{HookFault, HookPoint, MoveError, ReducerFault};
pub use config::{
    ConfigError, GameConfig, GameConfigBuilder, HookFn, MoveContext, MoveFn, PhaseConfig,
    SetupContext, SetupFn,
};
pub use context::{EngineContext, GameStatus, PlayerId};
pub use engine::{BatchOutcome, Engine, RejectReason, Rejection, Transition};
pub use phase::{PhaseAdvance, PhasePlan, compute_next_phase};
pub use turn::{TurnAdvance, compute_next_turn};
