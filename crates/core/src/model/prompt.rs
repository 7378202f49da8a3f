use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PromptError {
    #[error("prompt must not be empty")]
    Empty,
}

/// One quiz item (e.g. an infinitive) shown to the user.
///
/// Stored trimmed; equality is exact string equality on the trimmed text.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Prompt(String);

impl Prompt {
    /// Builds a prompt from raw evaluator text.
    ///
    /// # Errors
    ///
    /// Returns `PromptError::Empty` if the text is blank after trimming.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, PromptError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(PromptError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Prompt({:?})", self.0)
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Prompt {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
