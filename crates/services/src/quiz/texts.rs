use quiz_core::model::Prompt;

use crate::error::EvaluatorErrorKind;

/// Every user-facing string the quiz sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizTexts {
    pub instructions: String,
    pub correct: String,
    pub incorrect: String,
    pub done: String,
    pub evaluator_unavailable: String,
    pub check_failed: String,
}

impl Default for QuizTexts {
    fn default() -> Self {
        Self {
            instructions: "Give me a proper past and past participle form of the verbs \
                           (separate forms by whitespace)."
                .into(),
            correct: "Correct!".into(),
            incorrect: "Incorrect!".into(),
            done: "Done!".into(),
            evaluator_unavailable: "Check function returns error".into(),
            check_failed: "Something went wrong during checking of the verb".into(),
        }
    }
}

impl QuizTexts {
    #[must_use]
    pub fn greeting(&self, sender: Option<&str>) -> String {
        match sender.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => format!("Hello {name}! Let's start!\n{}", self.instructions),
            None => format!("Hello! Let's start!\n{}", self.instructions),
        }
    }

    #[must_use]
    pub fn prompt(&self, prompt: &Prompt) -> String {
        format!("\"{prompt}\"")
    }

    #[must_use]
    pub fn correct(&self) -> String {
        self.correct.clone()
    }

    #[must_use]
    pub fn incorrect(&self, correction: Option<&str>) -> String {
        match correction {
            Some(correction) => format!("{} The correct answer is: {correction}", self.incorrect),
            None => self.incorrect.clone(),
        }
    }

    #[must_use]
    pub fn done(&self) -> String {
        self.done.clone()
    }

    /// Notice sent before a session is aborted by an evaluator failure.
    #[must_use]
    pub fn evaluator_failure(&self, kind: EvaluatorErrorKind, prompt: &Prompt) -> String {
        match kind {
            EvaluatorErrorKind::Unavailable => self.evaluator_unavailable.clone(),
            EvaluatorErrorKind::Protocol | EvaluatorErrorKind::EmptyCorpus => {
                format!("{} \"{prompt}\"", self.check_failed)
            }
        }
    }
}
