use std::sync::Arc;

use quiz_core::Shuffler;
use quiz_core::model::{ChatId, EvaluationOutcome, Prompt};
use storage::SessionRegistry;
use tracing::{debug, info, warn};

use super::command::Command;
use super::state::{ChatState, Transition, transition};
use super::texts::QuizTexts;
use crate::dispatcher::{ChatMessage, MessageSink};
use crate::evaluator::Evaluator;

/// Drives each chat through the quiz protocol.
///
/// Every inbound message is handled under the chat's lease, so steps for one
/// chat run one at a time while other chats proceed independently. Sessions
/// live only in the registry; the controller holds no per-chat state.
#[derive(Clone)]
pub struct QuizController {
    registry: Arc<SessionRegistry>,
    evaluator: Arc<dyn Evaluator>,
    shuffler: Shuffler,
    texts: QuizTexts,
}

impl QuizController {
    #[must_use]
    pub fn new(registry: Arc<SessionRegistry>, evaluator: Arc<dyn Evaluator>) -> Self {
        Self {
            registry,
            evaluator,
            shuffler: Shuffler::default(),
            texts: QuizTexts::default(),
        }
    }

    #[must_use]
    pub fn with_shuffler(mut self, shuffler: Shuffler) -> Self {
        self.shuffler = shuffler;
        self
    }

    #[must_use]
    pub fn with_texts(mut self, texts: QuizTexts) -> Self {
        self.texts = texts;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn texts(&self) -> &QuizTexts {
        &self.texts
    }

    /// Handle one message and return the replies in delivery order.
    ///
    /// The chat's lease is released before the replies are returned, so
    /// callers that send them afterwards may interleave replies from two
    /// messages of the same chat. Use `handle_and_deliver` when replies go
    /// straight to a transport.
    pub async fn handle(&self, message: &ChatMessage) -> Vec<String> {
        let _lease = self.registry.lease(message.chat_id).await;
        self.step(message).await
    }

    /// Handle one message and push the replies through `sink` before the
    /// chat's lease is released, keeping per-chat order across messages.
    ///
    /// Delivery is best-effort: failures are logged and the remaining replies
    /// are still attempted. Returns the number of replies delivered.
    pub async fn handle_and_deliver(
        &self,
        message: &ChatMessage,
        sink: &dyn MessageSink,
    ) -> usize {
        let _lease = self.registry.lease(message.chat_id).await;
        let replies = self.step(message).await;

        let mut delivered = 0;
        for reply in &replies {
            match sink.send(message.chat_id, reply).await {
                Ok(()) => delivered += 1,
                Err(err) => warn!(chat_id = %message.chat_id, error = %err, "reply not delivered"),
            }
        }
        delivered
    }

    async fn step(&self, message: &ChatMessage) -> Vec<String> {
        let chat_id = message.chat_id;
        let state = ChatState::observe(&self.registry, chat_id);
        let command = Command::parse(&message.text);

        match transition(&state, &command) {
            Transition::Ignore => {
                debug!(%chat_id, ?state, "message ignored");
                Vec::new()
            }
            Transition::Begin => self.begin(message).await,
            Transition::Finish => self.finish(chat_id, Vec::new()),
            Transition::Grade { prompt, answer } => self.grade(chat_id, &prompt, &answer).await,
        }
    }

    async fn begin(&self, message: &ChatMessage) -> Vec<String> {
        let chat_id = message.chat_id;
        let prompts = match self.evaluator.list_prompts().await {
            Ok(prompts) if !prompts.is_empty() => prompts,
            Ok(_) => {
                debug!(%chat_id, "evaluator listed no prompts");
                return Vec::new();
            }
            Err(err) => {
                warn!(%chat_id, error = %err, kind = ?err.kind(), "prompt listing failed");
                return Vec::new();
            }
        };

        let total = prompts.len();
        if !self.registry.create(chat_id, self.shuffler.shuffle(prompts)) {
            return Vec::new();
        }
        let Some(first) = self.registry.advance(chat_id) else {
            self.registry.remove(chat_id);
            return Vec::new();
        };

        info!(%chat_id, prompts = total, "quiz started");
        vec![
            self.texts.greeting(message.sender.as_deref()),
            self.texts.prompt(&first),
        ]
    }

    async fn grade(&self, chat_id: ChatId, prompt: &Prompt, answer: &str) -> Vec<String> {
        let outcome = match self.evaluator.check_answer(prompt, answer).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(%chat_id, %prompt, error = %err, kind = ?err.kind(), "answer check failed");
                let notice = self.texts.evaluator_failure(err.kind(), prompt);
                return self.finish(chat_id, vec![notice]);
            }
        };

        let verdict = match &outcome {
            EvaluationOutcome::Correct => self.texts.correct(),
            EvaluationOutcome::Incorrect { correction } => {
                self.texts.incorrect(correction.as_deref())
            }
        };
        debug!(%chat_id, %prompt, correct = outcome.is_correct(), "answer graded");

        match ChatState::after_advance(self.registry.advance(chat_id)) {
            ChatState::AwaitingAnswer { current } => vec![verdict, self.texts.prompt(&current)],
            ChatState::Exhausted | ChatState::NoSession => self.finish(chat_id, vec![verdict]),
        }
    }

    fn finish(&self, chat_id: ChatId, mut replies: Vec<String>) -> Vec<String> {
        let asked = self.registry.remove(chat_id).map(|session| session.asked());
        info!(%chat_id, asked, "quiz finished");
        replies.push(self.texts.done());
        replies
    }
}
