use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use quiz_core::model::{ChatId, Prompt, Session};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Concurrency-safe store of every live quiz session, keyed by chat.
///
/// Individual operations are atomic per chat through the sharded map. Callers
/// that need a read-modify-write sequence spanning an `.await` (an evaluator
/// call, for instance) take a [`ChatLease`] first; leases serialize work for
/// one chat without blocking any other chat.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<ChatId, Session>,
    leases: DashMap<ChatId, Arc<Mutex<()>>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session for `chat_id` with the given (already shuffled) prompts.
    ///
    /// Returns `false` without touching the registry if a session already exists
    /// for the chat or if `prompts` is empty.
    pub fn create(&self, chat_id: ChatId, prompts: Vec<Prompt>) -> bool {
        match self.sessions.entry(chat_id) {
            Entry::Occupied(_) => {
                debug!(%chat_id, "session already live, create ignored");
                false
            }
            Entry::Vacant(slot) => match Session::new(chat_id, prompts) {
                Ok(session) => {
                    debug!(%chat_id, prompts = session.remaining_len(), "session created");
                    slot.insert(session);
                    true
                }
                Err(_) => false,
            },
        }
    }

    /// Snapshot of the live session for `chat_id`.
    #[must_use]
    pub fn get(&self, chat_id: ChatId) -> Option<Session> {
        self.sessions.get(&chat_id).map(|entry| entry.value().clone())
    }

    /// The prompt currently awaiting an answer in `chat_id`.
    #[must_use]
    pub fn current(&self, chat_id: ChatId) -> Option<Prompt> {
        self.sessions
            .get(&chat_id)
            .and_then(|entry| entry.current().cloned())
    }

    #[must_use]
    pub fn contains(&self, chat_id: ChatId) -> bool {
        self.sessions.contains_key(&chat_id)
    }

    /// Take the session for `chat_id` out of the registry, if any.
    pub fn remove(&self, chat_id: ChatId) -> Option<Session> {
        let (_, session) = self.sessions.remove(&chat_id)?;
        debug!(%chat_id, asked = session.asked(), "session removed");
        Some(session)
    }

    /// Pop the front prompt, record it as current and return it.
    ///
    /// Returns `None`, leaving `current` untouched, when the queue is empty or
    /// no session exists.
    pub fn advance(&self, chat_id: ChatId) -> Option<Prompt> {
        self.sessions.get_mut(&chat_id)?.advance().cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Wait for exclusive access to `chat_id`.
    ///
    /// The lease is released on drop. Idle lease slots are pruned on release so
    /// the map only holds chats with in-flight work.
    pub async fn lease(&self, chat_id: ChatId) -> ChatLease<'_> {
        let lock = Arc::clone(&self.leases.entry(chat_id).or_default());
        let guard = lock.lock_owned().await;
        ChatLease {
            chat_id,
            guard: Some(guard),
            leases: &self.leases,
        }
    }

    #[cfg(test)]
    fn lease_slots(&self) -> usize {
        self.leases.len()
    }
}

/// Exclusive per-chat access token handed out by [`SessionRegistry::lease`].
pub struct ChatLease<'a> {
    chat_id: ChatId,
    guard: Option<OwnedMutexGuard<()>>,
    leases: &'a DashMap<ChatId, Arc<Mutex<()>>>,
}

impl ChatLease<'_> {
    #[must_use]
    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }
}

impl Drop for ChatLease<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the map's own handle left means nobody holds or waits on it.
        self.leases
            .remove_if(&self.chat_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
