//! High-level runtime: create, join, resume, and observe games.
//!
//! [`GameRuntime`] wires a validated configuration and a store together and
//! spawns one board worker per game the local process is authoritative for.
//! Everyone else talks to the store through the participant-side helpers
//! (`join_game`, `submit_action`, `watch_game`).

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

use parlor_core::{ActionId, Engine, GameConfig, GameStatus, PlayerId};

use crate::board::BoardWorker;
use crate::codes::JoinCode;
use crate::error::{Result, RuntimeError};
use crate::events::GameEvent;
use crate::handle::BoardHandle;
use crate::session::{SavedSession, SessionRole, SessionStore};
use crate::store::{ActionSubmission, GameDoc, GamePatch, GameStore};

/// Attempts at finding an unused join code before giving up.
const CODE_ATTEMPTS: usize = 16;

/// Tunables shared by every board the runtime spawns.
#[derive(Clone, Copy, Debug)]
pub struct RuntimeOptions {
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Oldest-first queue window read per batch.
    pub batch_limit: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            event_buffer_size: 100,
            command_buffer_size: 32,
            batch_limit: 32,
        }
    }
}

/// A spawned board: the handle plus the worker task it controls.
pub struct Board<S> {
    code: JoinCode,
    handle: BoardHandle<S>,
    worker: JoinHandle<()>,
}

impl<S> Board<S> {
    pub fn code(&self) -> &JoinCode {
        &self.code
    }

    pub fn handle(&self) -> BoardHandle<S> {
        self.handle.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.handle.subscribe()
    }

    /// Stops the worker and waits for it to finish. Handle clones held
    /// elsewhere keep working as plain senders but get closed-channel
    /// errors afterwards.
    pub async fn shutdown(self) -> Result<()> {
        let Board { handle, worker, .. } = self;
        handle.stop().await;
        drop(handle);
        worker.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Runtime for one game configuration over one store backend.
pub struct GameRuntime<S, G> {
    engine: Arc<Engine<S>>,
    store: Arc<G>,
    sessions: Option<SessionStore>,
    options: RuntimeOptions,
}

impl<S, G> GameRuntime<S, G>
where
    S: Clone + Default + Send + Sync + 'static,
    G: GameStore<S> + 'static,
{
    pub fn new(config: GameConfig<S>, store: G) -> Self {
        Self::builder(config, store).build()
    }

    pub fn builder(config: GameConfig<S>, store: G) -> GameRuntimeBuilder<S, G> {
        GameRuntimeBuilder {
            config,
            store,
            sessions: None,
            options: RuntimeOptions::default(),
        }
    }

    /// Creates a game document with a fresh join code and spawns its board.
    ///
    /// The document starts `Waiting` with the default state; the real
    /// opening state is computed by `setup` when the board starts the game.
    pub async fn create_game(&self, board: PlayerId, meta: serde_json::Value) -> Result<Board<S>> {
        let code = self.allocate_code().await?;
        let doc = GameDoc {
            code: code.clone(),
            board: board.clone(),
            players: Vec::new(),
            meta,
            created_at: chrono::Utc::now(),
            context: self.engine.waiting_context(),
            state: S::default(),
        };
        self.store.create(doc).await?;
        info!(code = %code, "game created");

        if let Some(sessions) = &self.sessions {
            sessions.save(&SavedSession {
                code: code.clone(),
                player: board,
                role: SessionRole::Board,
            })?;
        }

        Ok(self.spawn_board(code))
    }

    /// Re-attaches a board worker to an existing game, e.g. after the
    /// authoritative process restarted.
    pub async fn resume_board(&self, code: &JoinCode) -> Result<Board<S>> {
        if self.store.fetch(code).await?.is_none() {
            return Err(RuntimeError::GameNotFound(code.clone()));
        }
        Ok(self.spawn_board(code.clone()))
    }

    /// Adds a participant to a waiting game. Joining twice is a no-op.
    pub async fn join_game(&self, code: &JoinCode, player: PlayerId) -> Result<GameDoc<S>> {
        let mut doc = self
            .store
            .fetch(code)
            .await?
            .ok_or_else(|| RuntimeError::GameNotFound(code.clone()))?;

        if doc.status() != GameStatus::Waiting {
            return Err(RuntimeError::NotJoinable {
                code: code.clone(),
                status: doc.status(),
            });
        }

        if !doc.players.contains(&player) {
            doc.players.push(player.clone());
            self.store
                .apply_patch(code, GamePatch::new().with_players(doc.players.clone()))
                .await?;
        }

        if let Some(sessions) = &self.sessions {
            sessions.save(&SavedSession {
                code: code.clone(),
                player,
                role: SessionRole::Player,
            })?;
        }

        Ok(doc)
    }

    /// Enqueues a move request. Any participant may call this; only the
    /// board ever applies it.
    pub async fn submit_action(
        &self,
        code: &JoinCode,
        submitter: PlayerId,
        kind: impl Into<String>,
        payload: serde_json::Value,
    ) -> Result<ActionId> {
        Ok(self
            .store
            .enqueue(
                code,
                ActionSubmission {
                    kind: kind.into(),
                    payload,
                    submitter,
                },
            )
            .await?)
    }

    /// Read-only subscription to the game document.
    pub async fn watch_game(&self, code: &JoinCode) -> Result<watch::Receiver<GameDoc<S>>> {
        Ok(self.store.watch(code).await?)
    }

    pub fn sessions(&self) -> Option<&SessionStore> {
        self.sessions.as_ref()
    }

    pub fn store(&self) -> &G {
        &self.store
    }

    async fn allocate_code(&self) -> Result<JoinCode> {
        for _ in 0..CODE_ATTEMPTS {
            let code = JoinCode::generate(&mut rand::thread_rng());
            if self.store.fetch(&code).await?.is_none() {
                return Ok(code);
            }
        }
        Err(RuntimeError::JoinCodesExhausted)
    }

    fn spawn_board(&self, code: JoinCode) -> Board<S> {
        let (command_tx, command_rx) = mpsc::channel(self.options.command_buffer_size);
        let (event_tx, _) = broadcast::channel(self.options.event_buffer_size);

        let worker = BoardWorker::new(
            Arc::clone(&self.engine),
            Arc::clone(&self.store),
            code.clone(),
            self.options.batch_limit,
            command_rx,
            event_tx.clone(),
        );
        let worker = tokio::spawn(worker.run());

        Board {
            code,
            handle: BoardHandle::new(command_tx, event_tx),
            worker,
        }
    }
}

/// Builder for [`GameRuntime`] with flexible configuration.
pub struct GameRuntimeBuilder<S, G> {
    config: GameConfig<S>,
    store: G,
    sessions: Option<SessionStore>,
    options: RuntimeOptions,
}

impl<S, G> GameRuntimeBuilder<S, G>
where
    S: Clone + Default + Send + Sync + 'static,
    G: GameStore<S> + 'static,
{
    /// Persist sessions for reconnection.
    pub fn sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Override the channel and batch tunables.
    pub fn options(mut self, options: RuntimeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> GameRuntime<S, G> {
        GameRuntime {
            engine: Arc::new(Engine::new(self.config)),
            store: Arc::new(self.store),
            sessions: self.sessions,
            options: self.options,
        }
    }
}
