//! Prompt listing and answer grading, delegated to an external evaluator.

mod client;
mod fixed;
mod process;

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{EvaluationOutcome, Prompt};

use crate::error::EvaluatorError;

pub use client::{ProcessEvaluator, parse_check_output, parse_prompt_listing};
pub use fixed::StaticEvaluator;
pub use process::{Invocation, ProcessOutput, ProcessRunner, ScriptedRunner, TokioProcessRunner};

/// Capability the quiz controller needs from an evaluator.
///
/// Implementations must not keep state between calls that affects grading.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Fetch the full prompt corpus in evaluator order.
    ///
    /// # Errors
    ///
    /// Returns `EvaluatorError::EmptyCorpus` when no usable prompt is produced,
    /// or another `EvaluatorError` when the evaluator cannot be run.
    async fn list_prompts(&self) -> Result<Vec<Prompt>, EvaluatorError>;

    /// Grade `answer` against `prompt`.
    ///
    /// # Errors
    ///
    /// Returns `EvaluatorError` when the evaluator fails or its output is malformed.
    async fn check_answer(
        &self,
        prompt: &Prompt,
        answer: &str,
    ) -> Result<EvaluationOutcome, EvaluatorError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvaluatorConfig {
    pub executable: PathBuf,
    pub timeout: Option<Duration>,
}

impl EvaluatorConfig {
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Reads `VERBS_EVALUATOR` and the optional `VERBS_EVALUATOR_TIMEOUT_SECS`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let executable = env::var("VERBS_EVALUATOR").ok()?;
        if executable.trim().is_empty() {
            return None;
        }
        let timeout = env::var("VERBS_EVALUATOR_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        Some(Self {
            executable: PathBuf::from(executable),
            timeout,
        })
    }

    /// Directory the evaluator runs in: the one containing the executable.
    #[must_use]
    pub fn working_dir(&self) -> PathBuf {
        match self.executable.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        }
    }
}
