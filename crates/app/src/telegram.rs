//! Telegram transport glue.

use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::ChatId;
use services::{Dispatcher, InboundEvent, MessageSink, TransportError};
use teloxide::requests::Requester;
use teloxide::types::Message;
use teloxide::{Bot, respond};
use tracing::info;

/// Delivers replies with `sendMessage`.
pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    #[must_use]
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MessageSink for TelegramSink {
    async fn send(&self, chat_id: ChatId, text: &str) -> Result<(), TransportError> {
        self.bot
            .send_message(teloxide::types::ChatId(chat_id.value()), text)
            .await
            .map(|_| ())
            .map_err(|err| TransportError::Delivery {
                chat_id: chat_id.value(),
                reason: err.to_string(),
            })
    }
}

/// Map a Telegram message onto the transport-neutral event.
#[must_use]
pub fn inbound_event(message: &Message) -> InboundEvent {
    let chat_id = ChatId::new(message.chat.id.0);
    let event = match message.text() {
        Some(text) => InboundEvent::text(chat_id, text),
        None => InboundEvent::other(chat_id),
    };
    match message.chat.username() {
        Some(username) => event.with_sender(username),
        None => event,
    }
}

/// Long-poll Telegram until the process is interrupted.
pub async fn serve(bot: Bot, dispatcher: Arc<Dispatcher>) {
    info!("polling telegram for updates");
    teloxide::repl(bot, move |message: Message| {
        let dispatcher = Arc::clone(&dispatcher);
        async move {
            dispatcher.dispatch(inbound_event(&message)).await;
            respond(())
        }
    })
    .await;
}
