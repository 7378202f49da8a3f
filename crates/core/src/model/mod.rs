mod ids;
mod outcome;
mod prompt;
mod session;

pub use ids::ChatId;
pub use outcome::EvaluationOutcome;
pub use prompt::{Prompt, PromptError};
pub use session::{Session, SessionError};
