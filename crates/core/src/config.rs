//! Declarative game configuration: moves, phases, and lifecycle hooks.
//!
//! A [`GameConfig`] is author-supplied and immutable for the life of a game.
//! Phases are an explicitly ordered list, so the default initial phase and
//! the default phase order are deterministic by construction. Move lookup
//! goes through a two-tier table (global, then phase-scoped) assembled once
//! when the configuration is built.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::apply::MoveError;
use crate::context::{EngineContext, PlayerId};

/// Produces the initial game state when the board starts a game.
pub type SetupFn<S> = Box<dyn Fn(&SetupContext<'_>) -> S + Send + Sync>;

/// A move reducer: prior state in, replacement state (or rejection) out.
pub type MoveFn<S> =
    Box<dyn Fn(&S, &MoveContext<'_>, &serde_json::Value) -> Result<S, MoveError> + Send + Sync>;

/// A lifecycle hook reducer (turn or phase begin/end).
pub type HookFn<S> = Box<dyn Fn(&S, &EngineContext) -> Result<S, MoveError> + Send + Sync>;

/// Context handed to the author's setup function.
#[derive(Clone, Copy, Debug)]
pub struct SetupContext<'a> {
    /// Participants in turn order at game start.
    pub players: &'a [PlayerId],
}

/// Context handed to a move reducer for one queued action.
#[derive(Clone, Copy, Debug)]
pub struct MoveContext<'a> {
    pub ctx: &'a EngineContext,

    /// The participant that submitted the action.
    pub submitter: &'a PlayerId,
}

impl MoveContext<'_> {
    /// Whether the submitter is the participant whose turn it is.
    ///
    /// Always `false` when no turn order is enforced.
    pub fn is_current_player(&self) -> bool {
        self.ctx.current_player() == Some(self.submitter)
    }
}

/// One phase of the game flow.
///
/// Built with chained setters and handed to [`GameConfigBuilder::phase`].
/// Declaration order is meaningful: the first declared phase is the initial
/// phase when none carries [`PhaseConfig::start`].
pub struct PhaseConfig<S> {
    name: String,
    start: bool,
    on_begin: Option<HookFn<S>>,
    on_end: Option<HookFn<S>>,
    moves: BTreeMap<String, MoveFn<S>>,
    next: Option<String>,
}

impl<S> PhaseConfig<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: false,
            on_begin: None,
            on_end: None,
            moves: BTreeMap::new(),
            next: None,
        }
    }

    /// Marks this phase as the initial one. At most one phase per
    /// configuration may carry this flag.
    pub fn start(mut self) -> Self {
        self.start = true;
        self
    }

    /// Phase to advance to when the board ends this phase without an
    /// explicit target.
    pub fn next(mut self, name: impl Into<String>) -> Self {
        self.next = Some(name.into());
        self
    }

    pub fn on_begin(
        mut self,
        hook: impl Fn(&S, &EngineContext) -> Result<S, MoveError> + Send + Sync + 'static,
    ) -> Self {
        self.on_begin = Some(Box::new(hook));
        self
    }

    pub fn on_end(
        mut self,
        hook: impl Fn(&S, &EngineContext) -> Result<S, MoveError> + Send + Sync + 'static,
    ) -> Self {
        self.on_end = Some(Box::new(hook));
        self
    }

    /// Registers a phase-local move. Re-registering a name replaces the
    /// earlier reducer. A global move of the same name shadows this one.
    pub fn on_move(
        mut self,
        kind: impl Into<String>,
        reducer: impl Fn(&S, &MoveContext<'_>, &serde_json::Value) -> Result<S, MoveError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.moves.insert(kind.into(), Box::new(reducer));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_start(&self) -> bool {
        self.start
    }

    pub fn next_phase(&self) -> Option<&str> {
        self.next.as_deref()
    }

    pub(crate) fn on_begin_fn(&self) -> Option<&HookFn<S>> {
        self.on_begin.as_ref()
    }

    pub(crate) fn on_end_fn(&self) -> Option<&HookFn<S>> {
        self.on_end.as_ref()
    }

    pub(crate) fn moves(&self) -> &BTreeMap<String, MoveFn<S>> {
        &self.moves
    }
}

/// Configuration faults detected when the builder assembles the tables.
///
/// Graph-shape problems (cycles, dangling `next` pointers) are deliberately
/// *not* errors; the phase order silently truncates instead.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("phases {first:?} and {second:?} both declare start")]
    MultipleStartPhases { first: String, second: String },

    #[error("phase {0:?} is declared more than once")]
    DuplicatePhase(String),
}

/// Immutable, validated game configuration.
pub struct GameConfig<S> {
    setup: Option<SetupFn<S>>,
    moves: BTreeMap<String, MoveFn<S>>,
    on_turn_begin: Option<HookFn<S>>,
    on_turn_end: Option<HookFn<S>>,
    phases: Vec<PhaseConfig<S>>,
    phase_index: HashMap<String, usize>,
}

impl<S> GameConfig<S> {
    pub fn builder() -> GameConfigBuilder<S> {
        GameConfigBuilder::new()
    }

    /// Phases in declaration order.
    pub fn phases(&self) -> &[PhaseConfig<S>] {
        &self.phases
    }

    pub fn phase(&self, name: &str) -> Option<&PhaseConfig<S>> {
        self.phase_index.get(name).map(|&i| &self.phases[i])
    }

    /// Action-type names allowed in `phase`: global moves plus that
    /// phase's moves. Global moves are allowed regardless of phase.
    pub fn allowed_moves(&self, phase: &str) -> BTreeSet<&str> {
        let mut allowed: BTreeSet<&str> = self.moves.keys().map(String::as_str).collect();
        if let Some(phase) = self.phase(phase) {
            allowed.extend(phase.moves().keys().map(String::as_str));
        }
        allowed
    }

    /// Looks up the reducer for `kind` in `phase`: global table first, then
    /// the phase table, so a global move shadows a same-named phase move.
    pub fn resolve_move(&self, phase: &str, kind: &str) -> Option<&MoveFn<S>> {
        self.moves
            .get(kind)
            .or_else(|| self.phase(phase).and_then(|p| p.moves().get(kind)))
    }

    pub(crate) fn setup_fn(&self) -> Option<&SetupFn<S>> {
        self.setup.as_ref()
    }

    pub(crate) fn on_turn_begin_fn(&self) -> Option<&HookFn<S>> {
        self.on_turn_begin.as_ref()
    }

    pub(crate) fn on_turn_end_fn(&self) -> Option<&HookFn<S>> {
        self.on_turn_end.as_ref()
    }
}

/// Builder for [`GameConfig`] with flexible registration order.
pub struct GameConfigBuilder<S> {
    setup: Option<SetupFn<S>>,
    moves: BTreeMap<String, MoveFn<S>>,
    on_turn_begin: Option<HookFn<S>>,
    on_turn_end: Option<HookFn<S>>,
    phases: Vec<PhaseConfig<S>>,
}

impl<S> GameConfigBuilder<S> {
    fn new() -> Self {
        Self {
            setup: None,
            moves: BTreeMap::new(),
            on_turn_begin: None,
            on_turn_end: None,
            phases: Vec::new(),
        }
    }

    pub fn setup(mut self, setup: impl Fn(&SetupContext<'_>) -> S + Send + Sync + 'static) -> Self {
        self.setup = Some(Box::new(setup));
        self
    }

    /// Registers a global move, allowed in every phase. Re-registering a
    /// name replaces the earlier reducer.
    pub fn on_move(
        mut self,
        kind: impl Into<String>,
        reducer: impl Fn(&S, &MoveContext<'_>, &serde_json::Value) -> Result<S, MoveError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.moves.insert(kind.into(), Box::new(reducer));
        self
    }

    pub fn on_turn_begin(
        mut self,
        hook: impl Fn(&S, &EngineContext) -> Result<S, MoveError> + Send + Sync + 'static,
    ) -> Self {
        self.on_turn_begin = Some(Box::new(hook));
        self
    }

    pub fn on_turn_end(
        mut self,
        hook: impl Fn(&S, &EngineContext) -> Result<S, MoveError> + Send + Sync + 'static,
    ) -> Self {
        self.on_turn_end = Some(Box::new(hook));
        self
    }

    /// Appends a phase; declaration order decides the default initial phase.
    pub fn phase(mut self, phase: PhaseConfig<S>) -> Self {
        self.phases.push(phase);
        self
    }

    /// Validates the declarations and assembles the lookup tables.
    pub fn build(self) -> Result<GameConfig<S>, ConfigError> {
        let mut phase_index = HashMap::with_capacity(self.phases.len());
        let mut start: Option<&str> = None;

        for (i, phase) in self.phases.iter().enumerate() {
            if phase_index.insert(phase.name().to_owned(), i).is_some() {
                return Err(ConfigError::DuplicatePhase(phase.name().to_owned()));
            }
            if phase.is_start() {
                if let Some(first) = start {
                    return Err(ConfigError::MultipleStartPhases {
                        first: first.to_owned(),
                        second: phase.name().to_owned(),
                    });
                }
                start = Some(phase.name());
            }
        }

        Ok(GameConfig {
            setup: self.setup,
            moves: self.moves,
            on_turn_begin: self.on_turn_begin,
            on_turn_end: self.on_turn_end,
            phases: self.phases,
            phase_index,
        })
    }
}
