//! The chat aggregate.

use crate::{
    message::{ChatId, Message},
    store::{MemoryStore, MessageStore},
    turn::{AssistantConfig, Turn},
};
use compact_str::CompactString;
use model::{Provider, Registry};
use std::sync::Arc;
use tcore::{Adapter, Error, Result};
use tokio::{sync::Mutex, task::JoinHandle};
use ulid::Ulid;

/// A conversation between a user and the assistant.
///
/// Cheap to clone; clones share the same registry, store and turn lock.
/// Turns of one chat never overlap.
pub struct Chat<A: Adapter = Provider, S: MessageStore = MemoryStore> {
    id: ChatId,
    registry: Arc<Registry<A>>,
    store: Arc<S>,
    config: Arc<AssistantConfig>,
    turn: Arc<Mutex<()>>,
}

impl<A: Adapter, S: MessageStore> Clone for Chat<A, S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            registry: self.registry.clone(),
            store: self.store.clone(),
            config: self.config.clone(),
            turn: self.turn.clone(),
        }
    }
}

impl<A: Adapter, S: MessageStore> Chat<A, S> {
    /// Start a new chat.
    pub fn new(registry: Arc<Registry<A>>, store: Arc<S>, config: AssistantConfig) -> Self {
        Self::with_id(Ulid::new(), registry, store, config)
    }

    /// Open a chat with a known id.
    pub fn with_id(
        id: ChatId,
        registry: Arc<Registry<A>>,
        store: Arc<S>,
        config: AssistantConfig,
    ) -> Self {
        Self {
            id,
            registry,
            store,
            config: Arc::new(config),
            turn: Arc::new(Mutex::new(())),
        }
    }

    /// The chat id.
    pub fn id(&self) -> ChatId {
        self.id
    }

    /// The chat's messages, oldest first.
    pub fn messages(&self) -> Vec<Message> {
        self.store.messages(self.id)
    }

    /// Validate and store a user message.
    pub fn create_user_message(
        &self,
        content: impl Into<String>,
        ai_model: impl Into<CompactString>,
    ) -> Result<Message> {
        let message = Message::user(self.id, content, ai_model);
        message.validate(self.registry.as_ref())?;
        self.store.insert(message)
    }

    /// Answer a user message of this chat, waiting for the turn to finish.
    pub async fn ask_assistant(&self, message: &Message) -> Result<Message> {
        if !message.is_user() {
            return Err(Error::InvalidRequest(format!(
                "message {} is not a user message",
                message.id
            )));
        }
        if message.chat_id != self.id {
            return Err(Error::InvalidRequest(format!(
                "message {} belongs to chat {}, not {}",
                message.id, message.chat_id, self.id
            )));
        }

        let _turn = self.turn.lock().await;
        Turn::new(self.registry.as_ref(), self.store.as_ref(), self.config.as_ref())
            .run(message)
            .await
    }

    /// Remove the chat and all its messages.
    pub fn destroy(&self) -> Result<usize> {
        let removed = self.store.destroy_chat(self.id)?;
        tracing::debug!("destroyed chat {} with {removed} messages", self.id);
        Ok(removed)
    }
}

impl<A: Adapter + 'static, S: MessageStore + 'static> Chat<A, S> {
    /// Answer a user message on a background task.
    pub fn ask_assistant_later(&self, message: Message) -> JoinHandle<Result<Message>> {
        let chat = self.clone();
        tokio::spawn(async move { chat.ask_assistant(&message).await })
    }

    /// Store a user message and queue the assistant's answer.
    pub fn send_user_message(
        &self,
        content: impl Into<String>,
        ai_model: impl Into<CompactString>,
    ) -> Result<(Message, JoinHandle<Result<Message>>)> {
        let message = self.create_user_message(content, ai_model)?;
        let reply = self.ask_assistant_later(message.clone());
        Ok((message, reply))
    }
}
