//! Authoritative board worker that owns one game's transition loop.
//!
//! Receives commands from [`crate::BoardHandle`], watches the action queue,
//! computes transitions via [`parlor_core::Engine`], and writes each
//! consolidated result back to the store. One worker task per game is the
//! serialization guarantee: at most one batch is ever in flight, and the
//! lease dies with the task.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, error, warn};

use parlor_core::{Engine, GameStatus, HookFault, PlayerId, Transition};

use crate::codes::JoinCode;
use crate::error::{Result, RuntimeError};
use crate::events::GameEvent;
use crate::store::{GameDoc, GamePatch, GameStore};

/// Commands the handle can send to the worker.
pub(crate) enum Command<S> {
    Start {
        turn_order: Option<Vec<PlayerId>>,
        reply: oneshot::Sender<Result<()>>,
    },
    EndTurn {
        reply: oneshot::Sender<Result<()>>,
    },
    EndPhase {
        target: Option<String>,
        reply: oneshot::Sender<Result<()>>,
    },
    Finish {
        reply: oneshot::Sender<Result<()>>,
    },
    Drain {
        reply: oneshot::Sender<Result<usize>>,
    },
    Snapshot {
        reply: oneshot::Sender<Result<GameDoc<S>>>,
    },
    /// Stop the worker even while other handle clones are alive.
    Stop,
}

/// Background task that drives one game.
pub(crate) struct BoardWorker<S, G> {
    engine: Arc<Engine<S>>,
    store: Arc<G>,
    code: JoinCode,
    batch_limit: usize,
    command_rx: mpsc::Receiver<Command<S>>,
    event_tx: broadcast::Sender<GameEvent>,
    /// Queue version as of the last completed drain; stale signals (often
    /// our own deletes) are skipped.
    drained_version: u64,
}

impl<S, G> BoardWorker<S, G>
where
    S: Clone + Default + Send + Sync + 'static,
    G: GameStore<S>,
{
    pub(crate) fn new(
        engine: Arc<Engine<S>>,
        store: Arc<G>,
        code: JoinCode,
        batch_limit: usize,
        command_rx: mpsc::Receiver<Command<S>>,
        event_tx: broadcast::Sender<GameEvent>,
    ) -> Self {
        Self {
            engine,
            store,
            code,
            batch_limit,
            command_rx,
            event_tx,
            drained_version: 0,
        }
    }

    /// Main worker loop. Exits when the handle side is dropped.
    pub(crate) async fn run(mut self) {
        let mut queue_rx = match self.store.watch_queue(&self.code).await {
            Ok(rx) => rx,
            Err(err) => {
                error!(code = %self.code, %err, "board cannot watch the action queue");
                return;
            }
        };

        // Anything queued before this board came up (e.g. after a resume)
        // is drained immediately.
        if let Err(err) = self.drain(&mut queue_rx).await {
            warn!(code = %self.code, %err, "initial queue drain failed");
        }

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(Command::Stop) | None => break,
                    Some(cmd) => self.handle_command(cmd, &mut queue_rx).await,
                },
                changed = queue_rx.changed() => match changed {
                    Ok(()) => {
                        let version = *queue_rx.borrow_and_update();
                        if version == self.drained_version {
                            continue;
                        }
                        if let Err(err) = self.drain(&mut queue_rx).await {
                            warn!(
                                code = %self.code, %err,
                                "queue drain failed; retrying on the next signal"
                            );
                        }
                    }
                    Err(_) => break,
                },
            }
        }

        debug!(code = %self.code, "board worker stopped");
    }

    async fn handle_command(&mut self, cmd: Command<S>, queue_rx: &mut watch::Receiver<u64>) {
        match cmd {
            Command::Start { turn_order, reply } => {
                let _ = reply.send(self.start(turn_order).await);
            }
            Command::EndTurn { reply } => {
                let _ = reply.send(self.end_turn().await);
            }
            Command::EndPhase { target, reply } => {
                let _ = reply.send(self.end_phase(target).await);
            }
            Command::Finish { reply } => {
                let _ = reply.send(self.finish().await);
            }
            Command::Drain { reply } => {
                let _ = reply.send(self.drain(queue_rx).await);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot().await);
            }
            // Intercepted by the run loop.
            Command::Stop => {}
        }
    }

    async fn snapshot(&self) -> Result<GameDoc<S>> {
        self.store
            .fetch(&self.code)
            .await?
            .ok_or_else(|| RuntimeError::GameNotFound(self.code.clone()))
    }

    fn expect_status(&self, doc: &GameDoc<S>, expected: GameStatus) -> Result<()> {
        if doc.status() != expected {
            return Err(RuntimeError::InvalidStatus {
                code: self.code.clone(),
                expected,
                actual: doc.status(),
            });
        }
        Ok(())
    }

    fn report_faults(&self, faults: &[HookFault]) {
        for fault in faults {
            warn!(
                code = %self.code,
                hook = %fault.hook,
                fault = %fault.fault,
                "lifecycle hook faulted; transition completed without it"
            );
            let _ = self.event_tx.send(GameEvent::HookFaulted {
                hook: fault.hook.to_string(),
                message: fault.fault.to_string(),
            });
        }
    }

    async fn write_transition(&self, transition: Transition<S>) -> Result<()> {
        self.report_faults(&transition.faults);
        self.store
            .apply_patch(
                &self.code,
                GamePatch::new()
                    .with_state(transition.state)
                    .with_context(transition.context),
            )
            .await?;
        Ok(())
    }

    async fn start(&mut self, turn_order: Option<Vec<PlayerId>>) -> Result<()> {
        let doc = self.snapshot().await?;
        self.expect_status(&doc, GameStatus::Waiting)?;

        let players = turn_order.unwrap_or_else(|| doc.players.clone());
        let transition = self.engine.start(&players);
        self.write_transition(transition).await?;

        let _ = self.event_tx.send(GameEvent::Started);
        Ok(())
    }

    async fn end_turn(&mut self) -> Result<()> {
        let doc = self.snapshot().await?;
        self.expect_status(&doc, GameStatus::Active)?;

        let transition = self.engine.end_turn(&doc.state, &doc.context);
        let turn = transition.context.turn;
        let current_player = transition.context.current_player().cloned();
        self.write_transition(transition).await?;

        let _ = self.event_tx.send(GameEvent::TurnEnded {
            turn,
            current_player,
        });
        Ok(())
    }

    async fn end_phase(&mut self, target: Option<String>) -> Result<()> {
        let doc = self.snapshot().await?;
        self.expect_status(&doc, GameStatus::Active)?;

        let leaving = doc.context.phase.clone();
        match self
            .engine
            .end_phase(&doc.state, &doc.context, target.as_deref())
        {
            Some(transition) => {
                self.write_transition(transition).await?;
                let _ = self.event_tx.send(GameEvent::PhaseEnded { phase: leaving });
            }
            None => {
                debug!(code = %self.code, "no phase order and no target; end_phase is a no-op");
            }
        }
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        let doc = self.snapshot().await?;
        let context = self.engine.finish(&doc.context);
        self.store
            .apply_patch(&self.code, GamePatch::new().with_context(context))
            .await?;
        let _ = self.event_tx.send(GameEvent::GameOver);
        Ok(())
    }

    /// Reads the queue window, applies it, writes the consolidated state,
    /// and deletes the consumed actions, in that order, so a crash can
    /// only ever re-deliver actions, never lose them.
    async fn drain(&mut self, queue_rx: &mut watch::Receiver<u64>) -> Result<usize> {
        let doc = self.snapshot().await?;
        if doc.status() != GameStatus::Active {
            self.drained_version = *queue_rx.borrow_and_update();
            return Ok(0);
        }

        let queue = self.store.pending(&self.code, self.batch_limit).await?;
        if queue.is_empty() {
            self.drained_version = *queue_rx.borrow_and_update();
            return Ok(0);
        }

        let outcome = self.engine.process_actions(&doc.state, &doc.context, &queue);

        for rejection in &outcome.rejections {
            debug!(
                code = %self.code,
                id = %rejection.id,
                kind = %rejection.kind,
                reason = %rejection.reason,
                "action left queued"
            );
            let _ = self.event_tx.send(GameEvent::ActionRejected {
                id: rejection.id.clone(),
                kind: rejection.kind.clone(),
                reason: rejection.reason.to_string(),
            });
        }

        let consumed = outcome.consumed.len();
        if consumed > 0 {
            self.store
                .apply_patch(&self.code, GamePatch::new().with_state(outcome.state))
                .await?;
            for id in &outcome.consumed {
                self.store.remove_action(&self.code, id).await?;
                let kind = queue
                    .iter()
                    .find(|action| action.id == *id)
                    .map(|action| action.kind.clone())
                    .unwrap_or_default();
                let _ = self.event_tx.send(GameEvent::ActionApplied {
                    id: id.clone(),
                    kind,
                });
            }
            let _ = self.event_tx.send(GameEvent::StateWritten {
                turn: doc.context.turn,
                round: doc.context.round,
                phase: doc.context.phase.clone(),
            });
        }

        self.drained_version = *queue_rx.borrow_and_update();
        Ok(consumed)
    }
}
