//! Request and response shapes of the canonical chat protocol.

use crate::{Error, Result};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Generate a fresh correlation id.
///
/// Not every backend hands out ids for responses, messages or function
/// calls; adapters fill the gaps with these.
pub fn correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A function the model may ask the caller to execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatFunction {
    /// The function name.
    pub name: CompactString,

    /// What the function does, shown to the model.
    pub description: String,

    /// JSON schema of the arguments object.
    pub parameters: Value,
}

/// Output of a previously requested function call, fed back to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResult {
    /// The function that produced the output.
    pub name: CompactString,

    /// Correlation id of the originating request, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,

    /// The function output.
    pub output: Value,
}

/// A single chat turn as handed to an adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Target model identifier.
    pub model: CompactString,

    /// The user prompt. Must not be blank.
    pub prompt: String,

    /// Optional system instructions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Functions the model may request, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<ChatFunction>,

    /// Function outputs to inject into the conversation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub function_results: Vec<FunctionResult>,

    /// Id of the response this turn continues from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
}

impl ChatRequest {
    /// Create a request for `model` with the given prompt.
    pub fn new(model: impl Into<CompactString>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            instructions: None,
            functions: Vec::new(),
            function_results: Vec::new(),
            previous_response_id: None,
        }
    }

    /// Set the system instructions.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Set the available functions.
    pub fn with_functions(mut self, functions: Vec<ChatFunction>) -> Self {
        self.functions = functions;
        self
    }

    /// Set the function results to inject.
    pub fn with_function_results(mut self, results: Vec<FunctionResult>) -> Self {
        self.function_results = results;
        self
    }

    /// Continue from a previous response.
    pub fn with_previous_response_id(mut self, id: impl Into<String>) -> Self {
        self.previous_response_id = Some(id.into());
        self
    }

    /// Instructions, if present and not blank.
    pub fn instructions(&self) -> Option<&str> {
        self.instructions
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }

    /// Check the invariants every adapter relies on.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(Error::InvalidRequest("prompt must not be empty".into()));
        }
        Ok(())
    }
}

/// One unit of assistant-authored text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message id.
    pub id: String,

    /// The generated text.
    pub output_text: String,
}

/// The assistant asking the caller to run a function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatFunctionRequest {
    /// Request id.
    pub id: String,

    /// Correlation id to echo back with the result.
    pub call_id: String,

    /// Name of the function to run.
    pub function_name: CompactString,

    /// Structured arguments.
    pub function_args: Value,
}

/// The normalized answer to a [`ChatRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Opaque response id.
    pub id: String,

    /// The model that actually served the request.
    pub model: CompactString,

    /// Assistant messages in output order.
    pub messages: Vec<ChatMessage>,

    /// Function requests in output order.
    pub function_requests: Vec<ChatFunctionRequest>,
}

impl ChatResponse {
    /// All message text, newline separated.
    pub fn text(&self) -> String {
        self.messages
            .iter()
            .map(|message| message.output_text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether the response carries no messages and no function requests.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.function_requests.is_empty()
    }

    /// Reject content-free responses as a provider failure.
    pub fn non_empty(self, provider: &'static str) -> Result<Self> {
        if self.is_empty() {
            return Err(Error::EmptyResponse { provider });
        }
        Ok(self)
    }
}
