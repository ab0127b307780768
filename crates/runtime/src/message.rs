//! Persisted chat messages and their lifecycle.

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use model::Registry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tcore::{Adapter, ChatFunctionRequest, Error, Result};
use ulid::Ulid;

/// Message identifier.
pub type MessageId = Ulid;

/// Chat identifier.
pub type ChatId = Ulid;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user.
    User,
    /// The AI assistant.
    Assistant,
}

/// Lifecycle state of a message.
///
/// `Pending` moves to `Complete` or `Failed`; both are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The assistant is still producing the message.
    Pending,
    /// Fully produced.
    Complete,
    /// The turn failed; content holds whatever arrived first.
    Failed,
}

impl Status {
    /// Whether no further transition is allowed.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether moving to `next` is a legal transition.
    pub fn can_become(self, next: Status) -> bool {
        self == Self::Pending && next.is_terminal()
    }
}

/// A function call requested by the assistant, persisted with its message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Request id.
    pub id: String,
    /// Correlation id echoed back with the result.
    pub call_id: String,
    /// Function name.
    pub function_name: CompactString,
    /// Structured arguments.
    pub function_args: Value,
    /// Function output, once the caller has run it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_result: Option<Value>,
}

impl From<ChatFunctionRequest> for ToolCall {
    fn from(request: ChatFunctionRequest) -> Self {
        Self {
            id: request.id,
            call_id: request.call_id,
            function_name: request.function_name,
            function_args: request.function_args,
            function_result: None,
        }
    }
}

/// A persisted chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message id.
    pub id: MessageId,
    /// Owning chat.
    pub chat_id: ChatId,
    /// Author.
    pub role: Role,
    /// Text content. Grows while an assistant message streams.
    pub content: String,
    /// Model the user picked for this exchange.
    pub ai_model: CompactString,
    /// Lifecycle state.
    pub status: Status,
    /// Function calls requested by the assistant, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Provider response id, for continuing the conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// A user message. Created complete.
    pub fn user(
        chat_id: ChatId,
        content: impl Into<String>,
        ai_model: impl Into<CompactString>,
    ) -> Self {
        Self::new(chat_id, Role::User, content.into(), ai_model.into(), Status::Complete)
    }

    /// An empty, pending assistant message.
    pub fn assistant(chat_id: ChatId, ai_model: impl Into<CompactString>) -> Self {
        Self::new(
            chat_id,
            Role::Assistant,
            String::new(),
            ai_model.into(),
            Status::Pending,
        )
    }

    fn new(
        chat_id: ChatId,
        role: Role,
        content: String,
        ai_model: CompactString,
        status: Status,
    ) -> Self {
        Self {
            id: Ulid::new(),
            chat_id,
            role,
            content,
            ai_model,
            status,
            tool_calls: Vec::new(),
            response_id: None,
            created_at: Utc::now(),
        }
    }

    /// Whether the user wrote this message.
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    /// Whether the assistant wrote this message.
    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// Check creation rules against the registry.
    ///
    /// User messages need content; every message needs a model some
    /// registered provider serves.
    pub fn validate<A: Adapter>(&self, registry: &Registry<A>) -> Result<()> {
        if self.is_user() && self.content.trim().is_empty() {
            return Err(Error::InvalidRequest("content can't be blank".into()));
        }
        if !registry.supports_model(&self.ai_model) {
            return Err(Error::InvalidRequest(format!(
                "{} is not a supported AI model",
                self.ai_model
            )));
        }
        Ok(())
    }
}
