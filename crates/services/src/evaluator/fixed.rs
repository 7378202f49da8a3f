use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use quiz_core::model::{EvaluationOutcome, Prompt};

use super::Evaluator;
use crate::error::EvaluatorError;

/// In-process evaluator over a fixed answer key.
///
/// Answers are compared case-insensitively with runs of whitespace collapsed.
/// Failures can be injected for either operation, which makes it the
/// evaluator of choice for tests and local prototyping.
#[derive(Default)]
pub struct StaticEvaluator {
    key: Vec<(Prompt, String)>,
    listing_failure: Option<fn() -> EvaluatorError>,
    check_failure: Option<(usize, fn() -> EvaluatorError)>,
    listings: AtomicUsize,
    checks: AtomicUsize,
}

impl StaticEvaluator {
    /// Build an evaluator from `(prompt, expected answer)` pairs.
    ///
    /// Pairs whose prompt is blank are skipped.
    #[must_use]
    pub fn new<P, A>(key: impl IntoIterator<Item = (P, A)>) -> Self
    where
        P: AsRef<str>,
        A: Into<String>,
    {
        let key = key
            .into_iter()
            .filter_map(|(prompt, answer)| Some((Prompt::parse(prompt).ok()?, answer.into())))
            .collect();
        Self {
            key,
            ..Self::default()
        }
    }

    /// Make every `list_prompts` call fail with the produced error.
    #[must_use]
    pub fn failing_listing(mut self, error: fn() -> EvaluatorError) -> Self {
        self.listing_failure = Some(error);
        self
    }

    /// Let the first `after` checks succeed, then fail every later one.
    #[must_use]
    pub fn failing_checks_after(mut self, after: usize, error: fn() -> EvaluatorError) -> Self {
        self.check_failure = Some((after, error));
        self
    }

    #[must_use]
    pub fn listing_calls(&self) -> usize {
        self.listings.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn check_calls(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    /// Expected answer for `prompt`, first match wins.
    #[must_use]
    pub fn expected(&self, prompt: &Prompt) -> Option<&str> {
        self.key
            .iter()
            .find(|(candidate, _)| candidate == prompt)
            .map(|(_, answer)| answer.as_str())
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[async_trait]
impl Evaluator for StaticEvaluator {
    async fn list_prompts(&self) -> Result<Vec<Prompt>, EvaluatorError> {
        self.listings.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.listing_failure {
            return Err(error());
        }
        if self.key.is_empty() {
            return Err(EvaluatorError::EmptyCorpus);
        }
        Ok(self.key.iter().map(|(prompt, _)| prompt.clone()).collect())
    }

    async fn check_answer(
        &self,
        prompt: &Prompt,
        answer: &str,
    ) -> Result<EvaluationOutcome, EvaluatorError> {
        let seen = self.checks.fetch_add(1, Ordering::SeqCst);
        if let Some((after, error)) = self.check_failure {
            if seen >= after {
                return Err(error());
            }
        }
        let expected = self
            .expected(prompt)
            .ok_or_else(|| EvaluatorError::Malformed(format!("unknown prompt {prompt:?}")))?;
        if normalize(expected) == normalize(answer) {
            Ok(EvaluationOutcome::Correct)
        } else {
            Ok(EvaluationOutcome::Incorrect {
                correction: Some(expected.to_owned()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator() -> StaticEvaluator {
        StaticEvaluator::new([("go", "went gone"), ("do", "did done")])
    }

    #[tokio::test]
    async fn lists_prompts_in_key_order() {
        let prompts = evaluator().list_prompts().await.unwrap();
        let names: Vec<&str> = prompts.iter().map(Prompt::as_str).collect();
        assert_eq!(names, vec!["go", "do"]);
    }

    #[tokio::test]
    async fn grading_ignores_case_and_spacing() {
        let evaluator = evaluator();
        let go = Prompt::parse("go").unwrap();

        let outcome = evaluator.check_answer(&go, "  Went   GONE ").await.unwrap();
        assert!(outcome.is_correct());

        let outcome = evaluator.check_answer(&go, "goed goed").await.unwrap();
        assert_eq!(outcome.correction(), Some("went gone"));
        assert_eq!(evaluator.check_calls(), 2);
    }

    #[tokio::test]
    async fn injected_failures_fire() {
        let evaluator = evaluator()
            .failing_listing(|| EvaluatorError::ExitStatus { code: 1 })
            .failing_checks_after(1, || EvaluatorError::EmptyOutput);
        let go = Prompt::parse("go").unwrap();

        assert!(evaluator.list_prompts().await.is_err());
        assert!(evaluator.check_answer(&go, "went gone").await.is_ok());
        assert!(matches!(
            evaluator.check_answer(&go, "went gone").await,
            Err(EvaluatorError::EmptyOutput)
        ));
    }

    #[tokio::test]
    async fn empty_key_is_empty_corpus() {
        let evaluator = StaticEvaluator::new(Vec::<(&str, &str)>::new());
        assert!(matches!(
            evaluator.list_prompts().await,
            Err(EvaluatorError::EmptyCorpus)
        ));
    }
}
