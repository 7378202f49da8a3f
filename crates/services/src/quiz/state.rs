use quiz_core::model::{ChatId, Prompt};
use storage::SessionRegistry;

use super::command::Command;

/// Protocol phase of a single chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatState {
    NoSession,
    AwaitingAnswer { current: Prompt },
    /// A session exists but has no prompt left to grade; it only needs closing.
    Exhausted,
}

impl ChatState {
    /// Observe the phase of `chat_id`. Callers hold the chat's lease.
    #[must_use]
    pub fn observe(registry: &SessionRegistry, chat_id: ChatId) -> Self {
        match registry.current(chat_id) {
            Some(current) => Self::AwaitingAnswer { current },
            None if registry.contains(chat_id) => Self::Exhausted,
            None => Self::NoSession,
        }
    }

    /// Phase after trying to hand out the next prompt.
    #[must_use]
    pub fn after_advance(next: Option<Prompt>) -> Self {
        match next {
            Some(current) => Self::AwaitingAnswer { current },
            None => Self::Exhausted,
        }
    }
}

/// Work the controller has to do for one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Ignore,
    /// Fetch prompts, open a session and ask the first prompt.
    Begin,
    /// Close the session with a completion message.
    Finish,
    /// Grade `answer` against `prompt`, then move on.
    Grade { prompt: Prompt, answer: String },
}

/// Quiz transition table.
#[must_use]
pub fn transition(state: &ChatState, command: &Command<'_>) -> Transition {
    match (state, command) {
        (ChatState::NoSession, Command::Start) => Transition::Begin,
        (_, Command::Start) => Transition::Ignore,
        (ChatState::NoSession, Command::Stop | Command::Answer(_)) => Transition::Ignore,
        (ChatState::AwaitingAnswer { .. } | ChatState::Exhausted, Command::Stop) => {
            Transition::Finish
        }
        (ChatState::AwaitingAnswer { current }, Command::Answer(text)) => Transition::Grade {
            prompt: current.clone(),
            answer: (*text).to_owned(),
        },
        (ChatState::Exhausted, Command::Answer(_)) => Transition::Finish,
    }
}
