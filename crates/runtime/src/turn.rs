//! One assistant turn: from a user message to a finished assistant message.

use crate::{
    message::{Message, Status, ToolCall},
    store::MessageStore,
};
use model::Registry;
use serde::{Deserialize, Serialize};
use tcore::{Adapter, ChatFunction, ChatRequest, ChatResponse, ChatStreamChunk, Result, Streamer};

/// How the assistant answers in a chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// System instructions sent with every turn.
    pub instructions: Option<String>,
    /// Functions the assistant may request.
    pub functions: Vec<ChatFunction>,
    /// Stream output into the message as it arrives.
    pub stream: bool,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            instructions: None,
            functions: Vec::new(),
            stream: true,
        }
    }
}

/// Where a turn is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    /// Creating the assistant message and the request.
    Building,
    /// Waiting on the provider.
    Dispatched,
    /// Receiving output text.
    Streaming,
    /// The assistant message is complete.
    Complete,
    /// The assistant message failed.
    Failed,
}

/// Drives a single turn against a registry and a store.
pub struct Turn<'a, A: Adapter, S: MessageStore> {
    registry: &'a Registry<A>,
    store: &'a S,
    config: &'a AssistantConfig,
    state: TurnState,
}

impl<'a, A: Adapter, S: MessageStore> Turn<'a, A, S> {
    /// Create a turn.
    pub fn new(registry: &'a Registry<A>, store: &'a S, config: &'a AssistantConfig) -> Self {
        Self {
            registry,
            store,
            config,
            state: TurnState::Building,
        }
    }

    /// The current state.
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Answer `user` with a new assistant message.
    ///
    /// On failure the assistant message is marked failed with whatever
    /// content arrived, and the error is returned.
    pub async fn run(&mut self, user: &Message) -> Result<Message> {
        let assistant = self
            .store
            .insert(Message::assistant(user.chat_id, user.ai_model.clone()))?;

        match self.drive(user, &assistant).await {
            Ok(message) => Ok(message),
            Err(e) => {
                transition(&mut self.state, TurnState::Failed);
                tracing::error!("assistant turn for message {} failed: {e}", assistant.id);
                if let Err(store) = self.store.set_status(assistant.id, Status::Failed) {
                    tracing::warn!("could not mark message {} failed: {store}", assistant.id);
                }
                Err(e)
            }
        }
    }

    async fn drive(&mut self, user: &Message, assistant: &Message) -> Result<Message> {
        let (registry, store) = (self.registry, self.store);
        let provider = registry.provider_for(&user.ai_model)?;
        let request = self.request(user, assistant);

        transition(&mut self.state, TurnState::Dispatched);
        let mut streamed = false;
        let response: ChatResponse = if self.config.stream {
            let state = &mut self.state;
            let mut on_chunk = |chunk: ChatStreamChunk| -> Result<()> {
                let Some(text) = chunk.output_text() else {
                    return Ok(());
                };
                if *state == TurnState::Dispatched {
                    transition(state, TurnState::Streaming);
                }
                store.append_text(assistant.id, text)?;
                streamed = true;
                Ok(())
            };
            let streamer: Streamer<'_> = &mut on_chunk;
            provider.chat_response(request, Some(streamer)).await?
        } else {
            provider.chat_response(request, None).await?
        };

        if !streamed {
            let text = response.text();
            if !text.is_empty() {
                store.append_text(assistant.id, &text)?;
            }
        }
        let tool_calls = response
            .function_requests
            .into_iter()
            .map(ToolCall::from)
            .collect();
        store.record_response(assistant.id, Some(response.id), tool_calls)?;
        let message = store.set_status(assistant.id, Status::Complete)?;
        transition(&mut self.state, TurnState::Complete);
        Ok(message)
    }

    fn request(&self, user: &Message, assistant: &Message) -> ChatRequest {
        let mut request = ChatRequest::new(user.ai_model.clone(), user.content.clone())
            .with_functions(self.config.functions.clone());
        if let Some(instructions) = &self.config.instructions {
            request = request.with_instructions(instructions.clone());
        }

        let previous = self
            .store
            .messages(user.chat_id)
            .into_iter()
            .rev()
            .filter(|message| message.is_assistant() && message.id != assistant.id)
            .find_map(|message| message.response_id);
        if let Some(id) = previous {
            request = request.with_previous_response_id(id);
        }
        request
    }
}

fn transition(state: &mut TurnState, next: TurnState) {
    tracing::debug!("turn {state:?} -> {next:?}");
    *state = next;
}
