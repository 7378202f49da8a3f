/// Result of grading one submitted answer against one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationOutcome {
    Correct,
    /// The answer was wrong. `correction` carries the expected forms when
    /// the evaluator supplies them.
    Incorrect { correction: Option<String> },
}

impl EvaluationOutcome {
    /// Builds an outcome from the evaluator's success flag and message.
    ///
    /// Blank messages are treated as missing.
    #[must_use]
    pub fn from_parts(is_success: bool, message: Option<String>) -> Self {
        if is_success {
            return Self::Correct;
        }
        let correction = message
            .map(|m| m.trim().to_owned())
            .filter(|m| !m.is_empty());
        Self::Incorrect { correction }
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        matches!(self, Self::Correct)
    }

    #[must_use]
    pub fn correction(&self) -> Option<&str> {
        match self {
            Self::Correct => None,
            Self::Incorrect { correction } => correction.as_deref(),
        }
    }
}
