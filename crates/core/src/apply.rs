//! Uniform reducer execution with fail-soft fault absorption.
//!
//! Every author-supplied reducer (move, phase hook, turn hook) runs through
//! this boundary. A reducer that returns an error or panics never aborts the
//! surrounding transition: the caller keeps the prior state and receives a
//! structured [`ReducerFault`] it can report.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::config::{HookFn, MoveContext, MoveFn, SetupContext, SetupFn};
use crate::context::EngineContext;

/// Error returned by an author-supplied reducer to reject its input.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct MoveError(String);

impl MoveError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<&str> for MoveError {
    fn from(message: &str) -> Self {
        Self(message.to_owned())
    }
}

impl From<String> for MoveError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

/// Why a reducer produced no usable result.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ReducerFault {
    /// The reducer rejected its input.
    #[error(transparent)]
    Rejected(#[from] MoveError),

    /// The reducer panicked; the panic was contained at the engine boundary.
    #[error("reducer panicked: {0}")]
    Panicked(String),
}

/// Which lifecycle hook a fault was absorbed from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HookPoint {
    Setup,
    TurnBegin,
    TurnEnd,
    PhaseBegin(String),
    PhaseEnd(String),
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPoint::Setup => write!(f, "setup"),
            HookPoint::TurnBegin => write!(f, "turn onBegin"),
            HookPoint::TurnEnd => write!(f, "turn onEnd"),
            HookPoint::PhaseBegin(phase) => write!(f, "phase {phase:?} onBegin"),
            HookPoint::PhaseEnd(phase) => write!(f, "phase {phase:?} onEnd"),
        }
    }
}

/// A hook fault absorbed during a transition.
///
/// The transition still completed; the host decides whether to log or
/// surface the fault.
#[derive(Clone, Debug)]
pub struct HookFault {
    pub hook: HookPoint,
    pub fault: ReducerFault,
}

/// Runs a move reducer. On any fault the caller keeps the prior state.
pub(crate) fn run_move<S>(
    reducer: &MoveFn<S>,
    state: &S,
    mctx: &MoveContext<'_>,
    payload: &serde_json::Value,
) -> Result<S, ReducerFault> {
    match panic::catch_unwind(AssertUnwindSafe(|| reducer(state, mctx, payload))) {
        Ok(Ok(next)) => Ok(next),
        Ok(Err(err)) => Err(ReducerFault::Rejected(err)),
        Err(panicked) => Err(ReducerFault::Panicked(panic_message(panicked))),
    }
}

/// Runs a lifecycle hook under the same policy as [`run_move`].
pub(crate) fn run_hook<S>(
    hook: &HookFn<S>,
    state: &S,
    ctx: &EngineContext,
) -> Result<S, ReducerFault> {
    match panic::catch_unwind(AssertUnwindSafe(|| hook(state, ctx))) {
        Ok(Ok(next)) => Ok(next),
        Ok(Err(err)) => Err(ReducerFault::Rejected(err)),
        Err(panicked) => Err(ReducerFault::Panicked(panic_message(panicked))),
    }
}

/// Runs the author's setup function; a panic is contained like any other
/// reducer fault.
pub(crate) fn run_setup<S>(
    setup: &SetupFn<S>,
    sctx: &SetupContext<'_>,
) -> Result<S, ReducerFault> {
    match panic::catch_unwind(AssertUnwindSafe(|| setup(sctx))) {
        Ok(state) => Ok(state),
        Err(panicked) => Err(ReducerFault::Panicked(panic_message(panicked))),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
