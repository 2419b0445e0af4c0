//! In-memory GameStore implementation for tests and local play.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;

use parlor_core::{ActionId, PendingAction};

use crate::codes::JoinCode;
use crate::store::{ActionSubmission, GameDoc, GamePatch, GameStore, Result, StoreError};

struct GameEntry<S> {
    doc: GameDoc<S>,
    queue: Vec<PendingAction>,
    next_action: u64,
    queue_version: u64,
    doc_tx: watch::Sender<GameDoc<S>>,
    queue_tx: watch::Sender<u64>,
}

impl<S: Clone> GameEntry<S> {
    fn new(doc: GameDoc<S>) -> Self {
        let (doc_tx, _) = watch::channel(doc.clone());
        let (queue_tx, _) = watch::channel(0);
        Self {
            doc,
            queue: Vec::new(),
            next_action: 0,
            queue_version: 0,
            doc_tx,
            queue_tx,
        }
    }

    fn bump_queue(&mut self) {
        self.queue_version += 1;
        let _ = self.queue_tx.send(self.queue_version);
    }
}

/// In-memory store keyed by join code.
///
/// Append order is creation order, so the queue is sorted by construction.
pub struct MemoryStore<S> {
    games: RwLock<HashMap<JoinCode, GameEntry<S>>>,
}

impl<S: Clone> MemoryStore<S> {
    pub fn new() -> Self {
        Self {
            games: RwLock::new(HashMap::new()),
        }
    }
}

impl<S: Clone> Default for MemoryStore<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> GameStore<S> for MemoryStore<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn create(&self, doc: GameDoc<S>) -> Result<()> {
        let mut games = self.games.write().map_err(|_| StoreError::LockPoisoned)?;
        if games.contains_key(&doc.code) {
            return Err(StoreError::AlreadyExists(doc.code.clone()));
        }
        games.insert(doc.code.clone(), GameEntry::new(doc));
        Ok(())
    }

    async fn fetch(&self, code: &JoinCode) -> Result<Option<GameDoc<S>>> {
        let games = self.games.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(games.get(code).map(|entry| entry.doc.clone()))
    }

    async fn apply_patch(&self, code: &JoinCode, patch: GamePatch<S>) -> Result<()> {
        let mut games = self.games.write().map_err(|_| StoreError::LockPoisoned)?;
        let entry = games
            .get_mut(code)
            .ok_or_else(|| StoreError::NotFound(code.clone()))?;

        if let Some(state) = patch.state {
            entry.doc.state = state;
        }
        if let Some(context) = patch.context {
            entry.doc.context = context;
        }
        if let Some(players) = patch.players {
            entry.doc.players = players;
        }
        if let Some(meta) = patch.meta {
            entry.doc.meta = meta;
        }

        let _ = entry.doc_tx.send(entry.doc.clone());
        Ok(())
    }

    async fn watch(&self, code: &JoinCode) -> Result<watch::Receiver<GameDoc<S>>> {
        let games = self.games.read().map_err(|_| StoreError::LockPoisoned)?;
        let entry = games
            .get(code)
            .ok_or_else(|| StoreError::NotFound(code.clone()))?;
        Ok(entry.doc_tx.subscribe())
    }

    async fn enqueue(&self, code: &JoinCode, submission: ActionSubmission) -> Result<ActionId> {
        let mut games = self.games.write().map_err(|_| StoreError::LockPoisoned)?;
        let entry = games
            .get_mut(code)
            .ok_or_else(|| StoreError::NotFound(code.clone()))?;

        let id = ActionId::new(format!("a{:08}", entry.next_action));
        entry.next_action += 1;
        entry.queue.push(PendingAction {
            id: id.clone(),
            kind: submission.kind,
            payload: submission.payload,
            submitter: submission.submitter,
            created_at: Utc::now(),
        });
        entry.bump_queue();
        Ok(id)
    }

    async fn pending(&self, code: &JoinCode, limit: usize) -> Result<Vec<PendingAction>> {
        let games = self.games.read().map_err(|_| StoreError::LockPoisoned)?;
        let entry = games
            .get(code)
            .ok_or_else(|| StoreError::NotFound(code.clone()))?;
        Ok(entry.queue.iter().take(limit).cloned().collect())
    }

    async fn watch_queue(&self, code: &JoinCode) -> Result<watch::Receiver<u64>> {
        let games = self.games.read().map_err(|_| StoreError::LockPoisoned)?;
        let entry = games
            .get(code)
            .ok_or_else(|| StoreError::NotFound(code.clone()))?;
        Ok(entry.queue_tx.subscribe())
    }

    async fn remove_action(&self, code: &JoinCode, id: &ActionId) -> Result<()> {
        let mut games = self.games.write().map_err(|_| StoreError::LockPoisoned)?;
        let entry = games
            .get_mut(code)
            .ok_or_else(|| StoreError::NotFound(code.clone()))?;

        let before = entry.queue.len();
        entry.queue.retain(|action| action.id != *id);
        if entry.queue.len() != before {
            entry.bump_queue();
        }
        Ok(())
    }
}
