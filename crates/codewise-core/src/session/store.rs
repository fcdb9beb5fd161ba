use super::turn::{ConversationSession, HistoryEntry, Turn, TurnRole};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Per-session state: the turn log and the exchange lock.
#[derive(Debug)]
struct SessionSlot {
    /// Held only while reading or appending turns.
    log: Mutex<ConversationSession>,
    /// Held across a whole chat exchange (read → model call → append).
    exchange: Arc<Mutex<()>>,
}

impl SessionSlot {
    fn new(session_id: &str) -> Self {
        Self {
            log: Mutex::new(ConversationSession::new(session_id)),
            exchange: Arc::new(Mutex::new(())),
        }
    }
}

/// Exclusive right to run one chat exchange on a session.
///
/// Dropping the guard lets the next exchange for the same session proceed.
pub struct ExchangeGuard {
    _guard: OwnedMutexGuard<()>,
}

/// Process-lifetime, append-only conversation log keyed by session id.
///
/// Appends to one session are linearized by that session's own lock; the
/// outer map is write-locked only to insert a session seen for the first time,
/// so different sessions never wait on each other while appending.
///
/// Sessions are never evicted.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<SessionSlot>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn existing_slot(&self, session_id: &str) -> Option<Arc<SessionSlot>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    async fn slot(&self, session_id: &str) -> Arc<SessionSlot> {
        if let Some(slot) = self.existing_slot(session_id).await {
            return slot;
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::debug!("[SessionStore] Creating session: {}", session_id);
                Arc::new(SessionSlot::new(session_id))
            })
            .clone()
    }

    /// Appends one turn and returns its sequence number.
    pub async fn append(
        &self,
        session_id: &str,
        role: TurnRole,
        content: impl Into<String>,
    ) -> u64 {
        let slot = self.slot(session_id).await;
        let mut log = slot.log.lock().await;
        log.push(role, content.into())
    }

    /// Appends a user turn and the assistant reply as adjacent turns.
    ///
    /// Returns both sequence numbers.
    pub async fn append_exchange(
        &self,
        session_id: &str,
        user: impl Into<String>,
        assistant: impl Into<String>,
    ) -> (u64, u64) {
        let slot = self.slot(session_id).await;
        let mut log = slot.log.lock().await;
        let user_seq = log.push(TurnRole::User, user.into());
        let assistant_seq = log.push(TurnRole::Assistant, assistant.into());
        (user_seq, assistant_seq)
    }

    /// All turns in append order. Unknown sessions yield an empty list.
    pub async fn read(&self, session_id: &str) -> Vec<Turn> {
        match self.existing_slot(session_id).await {
            Some(slot) => slot.log.lock().await.turns().to_vec(),
            None => Vec::new(),
        }
    }

    /// `{ role, content }` view of [`read`](Self::read).
    pub async fn history(&self, session_id: &str) -> Vec<HistoryEntry> {
        self.read(session_id)
            .await
            .iter()
            .map(HistoryEntry::from)
            .collect()
    }

    pub async fn turn_count(&self, session_id: &str) -> usize {
        match self.existing_slot(session_id).await {
            Some(slot) => slot.log.lock().await.turns().len(),
            None => 0,
        }
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Waits until no other exchange runs on `session_id`, then claims it.
    pub async fn begin_exchange(&self, session_id: &str) -> ExchangeGuard {
        let slot = self.slot(session_id).await;
        let guard = slot.exchange.clone().lock_owned().await;
        ExchangeGuard { _guard: guard }
    }
}
