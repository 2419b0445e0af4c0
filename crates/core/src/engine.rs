//! Board-facing transition API.
//!
//! [`Engine`] is the authoritative reducer for a game document: it computes
//! the result of starting a game, ending a turn or phase, and applying a
//! batch of queued actions. Every operation is a synchronous pure
//! computation over a snapshot; the host writes the outcome back to the
//! shared document. The engine never decides *when* to advance, only what
//! an advance produces.

use crate::action::{ActionId, PendingAction};
use crate::apply::{self, HookFault, HookPoint, ReducerFault};
use crate::config::{GameConfig, MoveContext, SetupContext};
use crate::context::{EngineContext, GameStatus, PlayerId};
use crate::phase::{self, PhasePlan};
use crate::turn;

/// Outcome of a lifecycle transition: the replacement state, the advanced
/// context, and any hook faults absorbed along the way.
///
/// Faults never abort the transition; they are surfaced here so the host
/// can log or report them.
#[derive(Clone, Debug)]
pub struct Transition<S> {
    pub state: S,
    pub context: EngineContext,
    pub faults: Vec<HookFault>,
}

/// Why one queued action was not consumed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("not allowed in phase {phase:?}")]
    NotAllowed { phase: String },

    #[error("no reducer registered")]
    NoReducer,

    #[error(transparent)]
    Fault(#[from] ReducerFault),
}

/// A queued action left unconsumed by a batch.
#[derive(Clone, Debug)]
pub struct Rejection {
    pub id: ActionId,
    pub kind: String,
    pub reason: RejectReason,
}

/// Consolidated result of applying a batch of queued actions.
///
/// `state` is the single value to write back; the engine context passes
/// through a batch untouched (only turn/phase advances move it). Rejected
/// actions stay queued.
#[derive(Clone, Debug)]
pub struct BatchOutcome<S> {
    pub state: S,
    pub consumed: Vec<ActionId>,
    pub rejections: Vec<Rejection>,
}

/// The game-state transition engine for one configuration.
pub struct Engine<S> {
    config: GameConfig<S>,
    plan: PhasePlan,
}

impl<S: Clone> Engine<S> {
    /// Derives the phase plan once and keeps it for the engine's lifetime.
    pub fn new(config: GameConfig<S>) -> Self {
        let plan = PhasePlan::from_config(&config);
        Self { config, plan }
    }

    pub fn config(&self) -> &GameConfig<S> {
        &self.config
    }

    pub fn plan(&self) -> &PhasePlan {
        &self.plan
    }

    /// Context for a freshly created game that has not started.
    pub fn waiting_context(&self) -> EngineContext {
        let mut ctx = EngineContext::new();
        ctx.phase = self.plan.initial_phase().unwrap_or_default().to_owned();
        ctx.phases = self.plan.ordered().to_vec();
        ctx
    }

    /// Starts the game: runs `setup` (falling back to `S::default()`), then
    /// the initial phase's `on_begin`, then the turn `on_begin`, and moves
    /// the context to `Active` with the counters at their opening values.
    pub fn start(&self, players: &[PlayerId]) -> Transition<S>
    where
        S: Default,
    {
        let mut faults = Vec::new();

        let sctx = SetupContext { players };
        let mut state = match self.config.setup_fn() {
            Some(setup) => match apply::run_setup(setup, &sctx) {
                Ok(state) => state,
                Err(fault) => {
                    faults.push(HookFault {
                        hook: HookPoint::Setup,
                        fault,
                    });
                    S::default()
                }
            },
            None => S::default(),
        };

        let mut context = self.waiting_context();
        context.set_status(GameStatus::Active);
        context.turn = 1;
        context.round = 1;
        context.current_player_index = 0;
        context.turn_order = players.to_vec();

        if !context.phase.is_empty()
            && let Some(hook) = self
                .config
                .phase(&context.phase)
                .and_then(|p| p.on_begin_fn())
        {
            match apply::run_hook(hook, &state, &context) {
                Ok(next) => state = next,
                Err(fault) => faults.push(HookFault {
                    hook: HookPoint::PhaseBegin(context.phase.clone()),
                    fault,
                }),
            }
        }

        if let Some(hook) = self.config.on_turn_begin_fn() {
            match apply::run_hook(hook, &state, &context) {
                Ok(next) => state = next,
                Err(fault) => faults.push(HookFault {
                    hook: HookPoint::TurnBegin,
                    fault,
                }),
            }
        }

        Transition {
            state,
            context,
            faults,
        }
    }

    /// Ends the current turn: advances the counters, then runs the turn
    /// `on_end` hook against the outgoing context and the turn `on_begin`
    /// hook against the incoming one, threading state through each.
    pub fn end_turn(&self, state: &S, ctx: &EngineContext) -> Transition<S> {
        let advance = turn::compute_next_turn(ctx);

        let mut incoming = ctx.clone();
        incoming.turn = advance.turn;
        if let Some(index) = advance.current_player_index {
            incoming.current_player_index = index;
        }
        if let Some(round) = advance.round {
            incoming.round = round;
        }

        let mut faults = Vec::new();
        let mut state = state.clone();

        if let Some(hook) = self.config.on_turn_end_fn() {
            match apply::run_hook(hook, &state, ctx) {
                Ok(next) => state = next,
                Err(fault) => faults.push(HookFault {
                    hook: HookPoint::TurnEnd,
                    fault,
                }),
            }
        }

        if let Some(hook) = self.config.on_turn_begin_fn() {
            match apply::run_hook(hook, &state, &incoming) {
                Ok(next) => state = next,
                Err(fault) => faults.push(HookFault {
                    hook: HookPoint::TurnBegin,
                    fault,
                }),
            }
        }

        Transition {
            state,
            context: incoming,
            faults,
        }
    }

    /// Ends the current phase, advancing to `target` when given, otherwise
    /// to the next entry of the derived order. Runs the leaving phase's
    /// `on_end` against the pre-transition context, then the entering
    /// phase's `on_begin` against the context with the new phase set.
    ///
    /// Returns `None` when there is nothing to advance to (no derived
    /// order and no explicit target); that is a no-op, not an error.
    pub fn end_phase(
        &self,
        state: &S,
        ctx: &EngineContext,
        target: Option<&str>,
    ) -> Option<Transition<S>> {
        let advance = phase::compute_next_phase(ctx, target)?;

        let mut incoming = ctx.clone();
        incoming.phase = advance.phase.clone();
        if let Some(round) = advance.round {
            incoming.round = round;
        }

        let mut faults = Vec::new();
        let mut state = state.clone();

        if let Some(hook) = self.config.phase(&ctx.phase).and_then(|p| p.on_end_fn()) {
            match apply::run_hook(hook, &state, ctx) {
                Ok(next) => state = next,
                Err(fault) => faults.push(HookFault {
                    hook: HookPoint::PhaseEnd(ctx.phase.clone()),
                    fault,
                }),
            }
        }

        if let Some(hook) = self
            .config
            .phase(&advance.phase)
            .and_then(|p| p.on_begin_fn())
        {
            match apply::run_hook(hook, &state, &incoming) {
                Ok(next) => state = next,
                Err(fault) => faults.push(HookFault {
                    hook: HookPoint::PhaseBegin(advance.phase.clone()),
                    fault,
                }),
            }
        }

        Some(Transition {
            state,
            context: incoming,
            faults,
        })
    }

    /// Applies a batch of queued actions strictly in queue order against a
    /// snapshot of state and context.
    ///
    /// The allowed-move set is fixed for the whole batch (moves never change
    /// the phase). A disallowed kind, a missing reducer, or a reducer fault
    /// leaves the action unconsumed and the running state untouched for that
    /// action; a successful reducer replaces the running state wholesale.
    pub fn process_actions(
        &self,
        state: &S,
        ctx: &EngineContext,
        queue: &[PendingAction],
    ) -> BatchOutcome<S> {
        let allowed = self.config.allowed_moves(&ctx.phase);

        let mut running = state.clone();
        let mut consumed = Vec::new();
        let mut rejections = Vec::new();

        for action in queue {
            if !allowed.contains(action.kind.as_str()) {
                rejections.push(Rejection {
                    id: action.id.clone(),
                    kind: action.kind.clone(),
                    reason: RejectReason::NotAllowed {
                        phase: ctx.phase.clone(),
                    },
                });
                continue;
            }

            let Some(reducer) = self.config.resolve_move(&ctx.phase, &action.kind) else {
                rejections.push(Rejection {
                    id: action.id.clone(),
                    kind: action.kind.clone(),
                    reason: RejectReason::NoReducer,
                });
                continue;
            };

            let mctx = MoveContext {
                ctx,
                submitter: &action.submitter,
            };
            match apply::run_move(reducer, &running, &mctx, &action.payload) {
                Ok(next) => {
                    running = next;
                    consumed.push(action.id.clone());
                }
                Err(fault) => rejections.push(Rejection {
                    id: action.id.clone(),
                    kind: action.kind.clone(),
                    reason: RejectReason::Fault(fault),
                }),
            }
        }

        BatchOutcome {
            state: running,
            consumed,
            rejections,
        }
    }

    /// Moves the context to `Ended`. No hooks run; history stays readable.
    pub fn finish(&self, ctx: &EngineContext) -> EngineContext {
        let mut next = ctx.clone();
        next.set_status(GameStatus::Ended);
        next
    }
}
