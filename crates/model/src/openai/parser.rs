//! OpenAI-compatible payload parsers.
//!
//! Completions deserialize into the wire structs below; only the first
//! choice is read. Streaming fragments share the same shape, with `delta`
//! in place of `message`.

use compact_str::CompactString;
use serde::Deserialize;
use serde_json::{Map, Value};
use tcore::{
    ChatFunctionRequest, ChatMessage, ChatResponse, ChatStreamChunk, Error, Result,
    correlation_id,
};

/// Raw chat completion, or one streamed fragment of it.
#[derive(Debug, Deserialize)]
pub(crate) struct Completion {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<CompactString>,
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Choice {
    #[serde(default)]
    pub message: Option<Delta>,
    #[serde(default)]
    pub delta: Option<Delta>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Delta {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

/// Message content: a plain string, or an array of text parts.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentPart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

impl Content {
    fn text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Parts(parts) => parts
                .iter()
                .filter_map(|part| part.text.as_deref().or(part.content.as_deref()))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// A tool call, complete in `message` or partial in `delta`.
#[derive(Debug, Deserialize)]
pub(crate) struct ToolCallDelta {
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub function: Option<FunctionDelta>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FunctionDelta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arguments: Option<String>,
}

/// Project a completion payload into a response, without the emptiness
/// check.
pub fn project(provider: &'static str, value: Value, model: &str) -> Result<ChatResponse> {
    completion_response(provider, decode(provider, value)?, model)
}

/// Parse a full completion payload.
pub fn parse(provider: &'static str, value: Value, model: &str) -> Result<ChatResponse> {
    project(provider, value, model)?.non_empty(provider)
}

/// Parse one streamed fragment.
///
/// A fragment with a finish reason is the terminal response; otherwise a
/// fragment carrying text is an output chunk. Anything else (role-only
/// openers, usage trailers, tool-call deltas) yields nothing.
pub fn parse_fragment(
    provider: &'static str,
    value: Value,
    model: &str,
) -> Result<Option<ChatStreamChunk>> {
    fragment_chunk(provider, decode(provider, value)?, model)
}

pub(crate) fn decode(provider: &'static str, value: Value) -> Result<Completion> {
    serde_json::from_value(value).map_err(|e| Error::malformed(provider, e.to_string()))
}

pub(crate) fn fragment_chunk(
    provider: &'static str,
    completion: Completion,
    model: &str,
) -> Result<Option<ChatStreamChunk>> {
    let Some(choice) = completion.choices.first() else {
        return Ok(None);
    };
    if choice.finish_reason.is_some() {
        return completion_response(provider, completion, model)
            .map(|response| Some(ChatStreamChunk::Response(response)));
    }

    let text = choice
        .delta
        .as_ref()
        .and_then(|delta| delta.content.as_ref())
        .map(Content::text)
        .unwrap_or_default();
    Ok((!text.is_empty()).then_some(ChatStreamChunk::OutputText(text)))
}

fn completion_response(
    provider: &'static str,
    completion: Completion,
    model: &str,
) -> Result<ChatResponse> {
    let Some(choice) = completion.choices.into_iter().next() else {
        return Err(Error::NoCandidates { provider });
    };
    let id = completion.id.unwrap_or_else(correlation_id);
    let model = completion.model.unwrap_or_else(|| model.into());

    // Tool calls in a streamed delta are partial; the driver merges them.
    let (message, complete) = match (choice.message, choice.delta) {
        (Some(message), _) => (message, true),
        (None, Some(delta)) => (delta, false),
        (None, None) => (Delta::default(), false),
    };

    let text = message
        .content
        .as_ref()
        .map(Content::text)
        .unwrap_or_default();
    let messages = if text.is_empty() {
        Vec::new()
    } else {
        vec![ChatMessage {
            id: id.clone(),
            output_text: text,
        }]
    };

    let function_requests = if complete {
        message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| {
                let function = call.function.unwrap_or_default();
                function_request(
                    provider,
                    call.id,
                    function.name.unwrap_or_default(),
                    function.arguments.as_deref().unwrap_or_default(),
                )
            })
            .collect::<Result<Vec<_>>>()?
    } else {
        Vec::new()
    };

    Ok(ChatResponse {
        id,
        model,
        messages,
        function_requests,
    })
}

/// Build a function request from a complete tool call.
pub(crate) fn function_request(
    provider: &'static str,
    call_id: Option<String>,
    name: String,
    arguments: &str,
) -> Result<ChatFunctionRequest> {
    if name.is_empty() {
        return Err(Error::malformed(provider, "tool call without a function name"));
    }
    let function_args = if arguments.trim().is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_str(arguments).map_err(|e| {
            Error::malformed(provider, format!("invalid arguments for {name}: {e}"))
        })?
    };

    Ok(ChatFunctionRequest {
        id: correlation_id(),
        call_id: call_id.unwrap_or_else(correlation_id),
        function_name: name.into(),
        function_args,
    })
}
