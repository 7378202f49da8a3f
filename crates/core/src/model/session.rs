use std::collections::VecDeque;

use thiserror::Error;

use crate::model::{ChatId, Prompt};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no prompts available for session")]
    Empty,
}

/// Live quiz state for one chat.
///
/// Prompts are consumed front-to-back in the order given at construction;
/// callers shuffle before building the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    chat_id: ChatId,
    remaining: VecDeque<Prompt>,
    current: Option<Prompt>,
    asked: usize,
}

impl Session {
    /// Create a session over an already ordered prompt queue.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no prompts are provided.
    pub fn new(chat_id: ChatId, prompts: Vec<Prompt>) -> Result<Self, SessionError> {
        if prompts.is_empty() {
            return Err(SessionError::Empty);
        }
        Ok(Self {
            chat_id,
            remaining: prompts.into(),
            current: None,
            asked: 0,
        })
    }

    #[must_use]
    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    /// The prompt most recently handed out, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Prompt> {
        self.current.as_ref()
    }

    /// Prompts not yet handed out, front first.
    pub fn remaining(&self) -> impl ExactSizeIterator<Item = &Prompt> {
        self.remaining.iter()
    }

    #[must_use]
    pub fn remaining_len(&self) -> usize {
        self.remaining.len()
    }

    /// Number of prompts handed out so far.
    #[must_use]
    pub fn asked(&self) -> usize {
        self.asked
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Pop the next prompt and make it current.
    ///
    /// When the queue is empty nothing changes and `None` is returned.
    pub fn advance(&mut self) -> Option<&Prompt> {
        let next = self.remaining.pop_front()?;
        self.asked += 1;
        self.current = Some(next);
        self.current.as_ref()
    }
}
