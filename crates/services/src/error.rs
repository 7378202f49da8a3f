//! Shared error types for the services crate.

use std::time::Duration;

use thiserror::Error;

/// Coarse classification of evaluator failures, used to pick the user notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatorErrorKind {
    /// The process could not be run to a clean exit.
    Unavailable,
    /// The process exited cleanly but its output was unusable.
    Protocol,
    /// The prompt listing succeeded but contained nothing.
    EmptyCorpus,
}

/// Errors emitted by `Evaluator` implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EvaluatorError {
    #[error("failed to launch evaluator: {0}")]
    Launch(#[source] std::io::Error),
    #[error("evaluator exited with status {code}")]
    ExitStatus { code: i32 },
    #[error("evaluator did not finish within {0:?}")]
    TimedOut(Duration),
    #[error("evaluator produced no output")]
    EmptyOutput,
    #[error("malformed evaluator output: {0}")]
    Malformed(String),
    #[error("evaluator returned no prompts")]
    EmptyCorpus,
}

impl EvaluatorError {
    #[must_use]
    pub fn kind(&self) -> EvaluatorErrorKind {
        match self {
            Self::Launch(_) | Self::ExitStatus { .. } | Self::TimedOut(_) => {
                EvaluatorErrorKind::Unavailable
            }
            Self::EmptyOutput | Self::Malformed(_) => EvaluatorErrorKind::Protocol,
            Self::EmptyCorpus => EvaluatorErrorKind::EmptyCorpus,
        }
    }
}

impl From<serde_json::Error> for EvaluatorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Errors emitted by `MessageSink` implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    #[error("failed to deliver message to chat {chat_id}: {reason}")]
    Delivery { chat_id: i64, reason: String },
}
