//! Cloneable façade for issuing commands to a board worker.
//!
//! Hides the channel plumbing and offers async helpers for starting the
//! game, advancing turns and phases, and draining the action queue.

use tokio::sync::{broadcast, mpsc, oneshot};

use parlor_core::PlayerId;

use crate::board::Command;
use crate::error::{Result, RuntimeError};
use crate::events::GameEvent;
use crate::store::GameDoc;

/// Client-facing handle to one game's board worker.
pub struct BoardHandle<S> {
    command_tx: mpsc::Sender<Command<S>>,
    event_tx: broadcast::Sender<GameEvent>,
}

impl<S> Clone for BoardHandle<S> {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            event_tx: self.event_tx.clone(),
        }
    }
}

impl<S> BoardHandle<S> {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command<S>>,
        event_tx: broadcast::Sender<GameEvent>,
    ) -> Self {
        Self {
            command_tx,
            event_tx,
        }
    }

    async fn send(
        &self,
        cmd: Command<S>,
        reply_rx: oneshot::Receiver<Result<()>>,
    ) -> Result<()> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Starts the game. `turn_order` defaults to the joined players in
    /// join order.
    pub async fn start(&self, turn_order: Option<Vec<PlayerId>>) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Start { turn_order, reply: reply_tx }, reply_rx)
            .await
    }

    /// Ends the current turn, running the turn hooks around the advance.
    pub async fn end_turn(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::EndTurn { reply: reply_tx }, reply_rx).await
    }

    /// Ends the current phase, advancing to `target` when given.
    pub async fn end_phase(&self, target: Option<&str>) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(
            Command::EndPhase {
                target: target.map(str::to_owned),
                reply: reply_tx,
            },
            reply_rx,
        )
        .await
    }

    /// Marks the game ended.
    pub async fn finish(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Command::Finish { reply: reply_tx }, reply_rx).await
    }

    /// Drains the action queue now instead of waiting for the watch signal.
    /// Returns how many actions were consumed.
    pub async fn drain_now(&self) -> Result<usize> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::Drain { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Current document snapshot, read through the worker.
    pub async fn snapshot(&self) -> Result<GameDoc<S>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;
        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Subscribe to the board's event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.event_tx.subscribe()
    }

    /// Asks the worker to stop; a closed channel means it already did.
    pub(crate) async fn stop(&self) {
        let _ = self.command_tx.send(Command::Stop).await;
    }
}
