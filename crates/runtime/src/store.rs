//! Message persistence.
//!
//! [`MessageStore`] is the seam to durable storage. [`MemoryStore`] is the
//! in-process reference implementation; it publishes a [`MessageEvent`]
//! after every committed mutation for whoever pushes updates to clients.

use crate::message::{ChatId, Message, MessageId, Status, ToolCall};
use parking_lot::Mutex;
use tcore::{Error, Result};
use tokio::sync::broadcast;

/// Capacity of the commit notification channel.
const EVENT_CAPACITY: usize = 256;

/// A committed change to a message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageEvent {
    /// A message was inserted.
    Created(Message),
    /// A message was changed; carries the new state.
    Updated(Message),
    /// A message and its tool calls were removed.
    Destroyed {
        /// The removed message.
        id: MessageId,
        /// Its chat.
        chat_id: ChatId,
    },
}

/// Durable message storage.
///
/// Every method is one atomic mutation; streaming deltas are applied with
/// one `append_text` each.
pub trait MessageStore: Send + Sync {
    /// Insert a new message.
    fn insert(&self, message: Message) -> Result<Message>;

    /// Look a message up.
    fn get(&self, id: MessageId) -> Option<Message>;

    /// Messages of a chat, oldest first.
    fn messages(&self, chat_id: ChatId) -> Vec<Message>;

    /// Append streamed text to a pending message.
    fn append_text(&self, id: MessageId, text: &str) -> Result<Message>;

    /// Move a message to a new status.
    fn set_status(&self, id: MessageId, status: Status) -> Result<Message>;

    /// Store the provider response id and requested tool calls.
    fn record_response(
        &self,
        id: MessageId,
        response_id: Option<String>,
        tool_calls: Vec<ToolCall>,
    ) -> Result<Message>;

    /// Remove a message together with its tool calls.
    fn destroy(&self, id: MessageId) -> Result<()>;

    /// Remove every message of a chat. Returns how many were removed.
    fn destroy_chat(&self, chat_id: ChatId) -> Result<usize>;
}

/// In-memory store backed by `Mutex<Vec<Message>>`.
pub struct MemoryStore {
    messages: Mutex<Vec<Message>>,
    events: broadcast::Sender<MessageEvent>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            events: broadcast::channel(EVENT_CAPACITY).0,
        }
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to commit notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<MessageEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: MessageEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn update(
        &self,
        id: MessageId,
        apply: impl FnOnce(&mut Message) -> Result<()>,
    ) -> Result<Message> {
        let updated = {
            let mut messages = self.messages.lock();
            let message = messages
                .iter_mut()
                .find(|message| message.id == id)
                .ok_or_else(|| Error::Store(format!("message {id} not found")))?;
            apply(message)?;
            message.clone()
        };
        self.publish(MessageEvent::Updated(updated.clone()));
        Ok(updated)
    }
}

impl MessageStore for MemoryStore {
    fn insert(&self, message: Message) -> Result<Message> {
        {
            let mut messages = self.messages.lock();
            if messages.iter().any(|existing| existing.id == message.id) {
                return Err(Error::Store(format!("message {} already exists", message.id)));
            }
            messages.push(message.clone());
        }
        self.publish(MessageEvent::Created(message.clone()));
        Ok(message)
    }

    fn get(&self, id: MessageId) -> Option<Message> {
        self.messages
            .lock()
            .iter()
            .find(|message| message.id == id)
            .cloned()
    }

    fn messages(&self, chat_id: ChatId) -> Vec<Message> {
        self.messages
            .lock()
            .iter()
            .filter(|message| message.chat_id == chat_id)
            .cloned()
            .collect()
    }

    fn append_text(&self, id: MessageId, text: &str) -> Result<Message> {
        self.update(id, |message| {
            if message.status.is_terminal() {
                return Err(Error::Store(format!(
                    "cannot append to {:?} message {id}",
                    message.status
                )));
            }
            message.content.push_str(text);
            Ok(())
        })
    }

    fn set_status(&self, id: MessageId, status: Status) -> Result<Message> {
        self.update(id, |message| {
            if !message.status.can_become(status) {
                return Err(Error::Store(format!(
                    "illegal transition {:?} -> {status:?} for message {id}",
                    message.status
                )));
            }
            message.status = status;
            Ok(())
        })
    }

    fn record_response(
        &self,
        id: MessageId,
        response_id: Option<String>,
        tool_calls: Vec<ToolCall>,
    ) -> Result<Message> {
        self.update(id, |message| {
            message.response_id = response_id;
            message.tool_calls.extend(tool_calls);
            Ok(())
        })
    }

    fn destroy(&self, id: MessageId) -> Result<()> {
        let removed = {
            let mut messages = self.messages.lock();
            let index = messages
                .iter()
                .position(|message| message.id == id)
                .ok_or_else(|| Error::Store(format!("message {id} not found")))?;
            messages.remove(index)
        };
        self.publish(MessageEvent::Destroyed {
            id,
            chat_id: removed.chat_id,
        });
        Ok(())
    }

    fn destroy_chat(&self, chat_id: ChatId) -> Result<usize> {
        let removed: Vec<Message> = {
            let mut messages = self.messages.lock();
            let (removed, kept) = std::mem::take(&mut *messages)
                .into_iter()
                .partition(|message| message.chat_id == chat_id);
            *messages = kept;
            removed
        };
        for message in &removed {
            self.publish(MessageEvent::Destroyed {
                id: message.id,
                chat_id,
            });
        }
        Ok(removed.len())
    }
}
