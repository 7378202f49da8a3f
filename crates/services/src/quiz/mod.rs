mod command;
mod controller;
mod state;
mod texts;

// Public API of the quiz subsystem.
pub use command::{Command, START_COMMAND, STOP_COMMAND};
pub use controller::QuizController;
pub use state::{ChatState, Transition, transition};
pub use texts::QuizTexts;
