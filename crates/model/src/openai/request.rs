//! OpenAI-compatible request body.

use serde::Serialize;
use serde_json::{Value, json};
use tcore::{ChatFunction, ChatRequest};

/// OpenAI-compatible chat completions request body.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    /// The model identifier.
    pub model: String,
    /// The messages to send.
    pub messages: Vec<WireMessage>,
    /// Tools the model may call.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Value>,
    /// Whether to stream the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

/// A single chat message on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireMessage {
    /// `system` or `user`.
    pub role: &'static str,
    /// Plain text content.
    pub content: String,
}

impl WireMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }
}

impl Request {
    /// Enable streaming for the request.
    pub fn stream(mut self) -> Self {
        self.stream = Some(true);
        self
    }

    /// Set the tools for the request. No-op for an empty list.
    pub fn with_tools(self, functions: &[ChatFunction]) -> Self {
        if functions.is_empty() {
            return self;
        }
        let tools = functions
            .iter()
            .map(|function| {
                json!({
                    "type": "function",
                    "function": function,
                })
            })
            .collect::<Vec<_>>();
        Self {
            tools: Some(json!(tools)),
            ..self
        }
    }
}

impl From<&ChatRequest> for Request {
    /// Instructions lead as a system message, function results follow as a
    /// second system message, then the user prompt.
    fn from(req: &ChatRequest) -> Self {
        let mut messages = Vec::with_capacity(3);
        if let Some(instructions) = req.instructions() {
            messages.push(WireMessage::system(instructions));
        }
        if !req.function_results.is_empty() {
            messages.push(WireMessage::system(format!(
                "Tool results available: {}",
                json!(req.function_results)
            )));
        }
        messages.push(WireMessage {
            role: "user",
            content: req.prompt.clone(),
        });

        Self {
            model: req.model.to_string(),
            messages,
            tools: None,
            stream: None,
        }
    }
}
