#![forbid(unsafe_code)]

pub mod dispatcher;
pub mod error;
pub mod evaluator;
pub mod quiz;

pub use quiz_core::Shuffler;

pub use dispatcher::{ChatMessage, Dispatcher, InboundEvent, MessageKind, MessageSink};
pub use error::{EvaluatorError, EvaluatorErrorKind, TransportError};
pub use evaluator::{Evaluator, EvaluatorConfig, ProcessEvaluator, StaticEvaluator};
pub use quiz::{ChatState, Command, QuizController, QuizTexts};
