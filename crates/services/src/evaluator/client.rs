use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{EvaluationOutcome, Prompt};
use serde::Deserialize;
use tracing::warn;

use super::process::{Invocation, ProcessRunner, TokioProcessRunner};
use super::{Evaluator, EvaluatorConfig};
use crate::error::EvaluatorError;

const LIST_COMMAND: &str = "verbs";
const CHECK_COMMAND: &str = "check";
const PROMPT_FLAG: &str = "-v";
const ANSWER_FLAG: &str = "-f";

/// Evaluator backed by one external process run per call.
#[derive(Clone)]
pub struct ProcessEvaluator {
    config: EvaluatorConfig,
    runner: Arc<dyn ProcessRunner>,
}

impl ProcessEvaluator {
    #[must_use]
    pub fn new(config: EvaluatorConfig) -> Self {
        Self {
            config,
            runner: Arc::new(TokioProcessRunner),
        }
    }

    #[must_use]
    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    #[must_use]
    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    fn invocation(&self, args: Vec<String>) -> Invocation {
        Invocation {
            program: self.config.executable.clone(),
            args,
            working_dir: self.config.working_dir(),
            timeout: self.config.timeout,
        }
    }

    async fn run(&self, args: Vec<String>) -> Result<String, EvaluatorError> {
        let invocation = self.invocation(args);
        let output = self.runner.run(&invocation).await?;
        if output.exit_code != 0 {
            warn!(
                exit_code = output.exit_code,
                stderr = %output.stderr.trim(),
                "evaluator exited with failure"
            );
            return Err(EvaluatorError::ExitStatus {
                code: output.exit_code,
            });
        }
        Ok(output.stdout)
    }
}

#[async_trait]
impl Evaluator for ProcessEvaluator {
    async fn list_prompts(&self) -> Result<Vec<Prompt>, EvaluatorError> {
        let stdout = self.run(vec![LIST_COMMAND.to_owned()]).await?;
        parse_prompt_listing(&stdout)
    }

    async fn check_answer(
        &self,
        prompt: &Prompt,
        answer: &str,
    ) -> Result<EvaluationOutcome, EvaluatorError> {
        let args = vec![
            CHECK_COMMAND.to_owned(),
            PROMPT_FLAG.to_owned(),
            prompt.as_str().to_owned(),
            ANSWER_FLAG.to_owned(),
            answer.to_owned(),
        ];
        let stdout = self.run(args).await?;
        parse_check_output(&stdout)
    }
}

/// Split a prompt listing into trimmed, non-empty prompts in listing order.
///
/// Accepts both `\n` and `\r\n` line endings.
///
/// # Errors
///
/// Returns `EvaluatorError::EmptyCorpus` if no line carries a prompt.
pub fn parse_prompt_listing(stdout: &str) -> Result<Vec<Prompt>, EvaluatorError> {
    let prompts: Vec<Prompt> = stdout
        .lines()
        .filter_map(|line| Prompt::parse(line).ok())
        .collect();
    if prompts.is_empty() {
        return Err(EvaluatorError::EmptyCorpus);
    }
    Ok(prompts)
}

#[derive(Debug, Deserialize)]
struct CheckRecord {
    is_success: bool,
    #[serde(default)]
    msg: Option<String>,
}

/// Parse the JSON record printed by a `check` run.
///
/// # Errors
///
/// Returns `EvaluatorError::EmptyOutput` for blank output and
/// `EvaluatorError::Malformed` when the record does not match
/// `{"is_success": bool, "msg": string|null}`.
pub fn parse_check_output(stdout: &str) -> Result<EvaluationOutcome, EvaluatorError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(EvaluatorError::EmptyOutput);
    }
    let record: CheckRecord = serde_json::from_str(trimmed)?;
    Ok(EvaluationOutcome::from_parts(record.is_success, record.msg))
}
