//! Tally chat runtime.
//!
//! A [`Chat`] owns persisted [`Message`]s. Asking the assistant runs a
//! [`Turn`]: a pending assistant message is created, the registry resolves
//! the provider for the user's model, and streamed output is appended to the
//! message as it arrives. Storage sits behind [`MessageStore`].
//!
//! # Example
//!
//! ```rust,ignore
//! use model::{GatewayConfig, Registry};
//! use runtime::{AssistantConfig, Chat, MemoryStore};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(Registry::from_config(&GatewayConfig::from_env())?);
//! let chat = Chat::new(registry, Arc::new(MemoryStore::new()), AssistantConfig::default());
//! let (_, reply) = chat.send_user_message("What did I spend on food?", "gpt-4.1")?;
//! let answer = reply.await??;
//! ```

pub use {
    chat::Chat,
    message::{ChatId, Message, MessageId, Role, Status, ToolCall},
    store::{MemoryStore, MessageEvent, MessageStore},
    turn::{AssistantConfig, Turn, TurnState},
};

mod chat;
mod message;
mod store;
mod turn;
