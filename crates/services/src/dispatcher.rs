//! Boundary between a chat transport and the quiz controller.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::ChatId;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendError;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::quiz::QuizController;

/// Payload class of an inbound transport event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    /// Stickers, photos, voice notes and the like.
    Other,
}

/// Raw event as handed over by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub chat_id: ChatId,
    pub kind: MessageKind,
    pub text: Option<String>,
    pub sender: Option<String>,
}

impl InboundEvent {
    #[must_use]
    pub fn text(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            kind: MessageKind::Text,
            text: Some(text.into()),
            sender: None,
        }
    }

    #[must_use]
    pub fn other(chat_id: ChatId) -> Self {
        Self {
            chat_id,
            kind: MessageKind::Other,
            text: None,
            sender: None,
        }
    }

    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Keep only text events whose text is not blank.
    #[must_use]
    pub fn into_message(self) -> Option<ChatMessage> {
        if self.kind != MessageKind::Text {
            return None;
        }
        let text = self.text.filter(|text| !text.trim().is_empty())?;
        Some(ChatMessage {
            chat_id: self.chat_id,
            text,
            sender: self.sender,
        })
    }
}

/// A text message accepted for the quiz protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub chat_id: ChatId,
    pub text: String,
    pub sender: Option<String>,
}

/// Outbound side of a chat transport.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Send `text` to `chat_id`.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` when the transport rejects or loses the message.
    async fn send(&self, chat_id: ChatId, text: &str) -> Result<(), TransportError>;
}

/// Routes inbound events to the controller and replies back to the transport.
pub struct Dispatcher {
    controller: Arc<QuizController>,
    sink: Arc<dyn MessageSink>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(controller: Arc<QuizController>, sink: Arc<dyn MessageSink>) -> Self {
        Self { controller, sink }
    }

    #[must_use]
    pub fn controller(&self) -> &Arc<QuizController> {
        &self.controller
    }

    /// Handle one event end to end. Returns the number of replies delivered.
    pub async fn dispatch(&self, event: InboundEvent) -> usize {
        let chat_id = event.chat_id;
        let Some(message) = event.into_message() else {
            debug!(%chat_id, "dropping non-text or blank event");
            return 0;
        };
        self.controller
            .handle_and_deliver(&message, self.sink.as_ref())
            .await
    }

    /// Consume `events` until the channel closes.
    ///
    /// Each chat gets its own worker fed by a bounded queue, so one chat's
    /// messages reach the controller in arrival order while different chats
    /// run in parallel. Workers for chats with nothing queued are retired
    /// every `SWEEP_EVERY` events; a chat's next worker waits for the retired
    /// one to finish first. Queued work is drained before returning.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<InboundEvent>) {
        let mut queues: HashMap<ChatId, ChatQueue> = HashMap::new();
        let mut retired: HashMap<ChatId, JoinHandle<()>> = HashMap::new();
        let mut received = 0_usize;
        info!("dispatcher started");

        while let Some(event) = events.recv().await {
            let chat_id = event.chat_id;
            let Some(message) = event.into_message() else {
                debug!(%chat_id, "dropping non-text or blank event");
                continue;
            };

            let queue = queues
                .entry(chat_id)
                .or_insert_with(|| spawn_chat_worker(&self, chat_id, retired.remove(&chat_id)));
            if let Err(SendError(message)) = queue.events.send(message).await {
                warn!(%chat_id, "chat worker stopped early; restarting it");
                let stopped = queues.remove(&chat_id).map(|queue| queue.worker);
                let queue = queues
                    .entry(chat_id)
                    .or_insert_with(|| spawn_chat_worker(&self, chat_id, stopped));
                if queue.events.send(message).await.is_err() {
                    warn!(%chat_id, "dropping event after worker restart failed");
                }
            }

            received += 1;
            if received % SWEEP_EVERY == 0 {
                retire_idle(&mut queues, &mut retired);
            }
        }

        let workers: Vec<JoinHandle<()>> = queues
            .into_values()
            .map(|queue| queue.worker)
            .chain(retired.into_values())
            .collect();
        for worker in workers {
            log_join(worker.await);
        }
        info!("dispatcher stopped");
    }
}

/// Events buffered per chat before intake waits on that chat.
const CHAT_QUEUE_DEPTH: usize = 32;
/// Accepted events between sweeps for idle chat workers.
const SWEEP_EVERY: usize = 64;

struct ChatQueue {
    events: mpsc::Sender<ChatMessage>,
    worker: JoinHandle<()>,
}

impl ChatQueue {
    fn is_idle(&self) -> bool {
        self.events.capacity() == self.events.max_capacity()
    }
}

fn spawn_chat_worker(
    dispatcher: &Arc<Dispatcher>,
    chat_id: ChatId,
    previous: Option<JoinHandle<()>>,
) -> ChatQueue {
    let (events, mut inbox) = mpsc::channel::<ChatMessage>(CHAT_QUEUE_DEPTH);
    let dispatcher = Arc::clone(dispatcher);
    let worker = tokio::spawn(async move {
        if let Some(previous) = previous {
            log_join(previous.await);
        }
        while let Some(message) = inbox.recv().await {
            dispatcher
                .controller
                .handle_and_deliver(&message, dispatcher.sink.as_ref())
                .await;
        }
        debug!(%chat_id, "chat worker finished");
    });
    ChatQueue { events, worker }
}

/// Drop the queue of every chat with nothing buffered. Its worker finishes
/// the step in hand and exits.
fn retire_idle(
    queues: &mut HashMap<ChatId, ChatQueue>,
    retired: &mut HashMap<ChatId, JoinHandle<()>>,
) {
    retired.retain(|_, worker| !worker.is_finished());
    let idle: Vec<ChatId> = queues
        .iter()
        .filter(|(_, queue)| queue.is_idle())
        .map(|(chat_id, _)| *chat_id)
        .collect();
    for chat_id in idle {
        if let Some(queue) = queues.remove(&chat_id) {
            retired.insert(chat_id, queue.worker);
        }
    }
    debug!(live = queues.len(), retiring = retired.len(), "swept chat workers");
}

fn log_join(joined: Result<(), JoinError>) {
    if let Err(err) = joined {
        warn!(error = %err, "chat worker failed");
    }
}
