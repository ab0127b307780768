//! Gemini payload parsers.
//!
//! Only the first candidate is read. Text parts are joined with a newline
//! into a single message; function-call parts become function requests in
//! encounter order.

use super::NAME;
use compact_str::CompactString;
use serde::Deserialize;
use serde_json::{Map, Value};
use tcore::{
    ChatFunctionRequest, ChatMessage, ChatResponse, ChatStreamChunk, Error, Result,
    correlation_id,
};

/// Raw `generateContent` payload, or one streamed fragment of it.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    pub response_id: Option<String>,
    #[serde(default)]
    model_version: Option<CompactString>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: CompactString,
    #[serde(default)]
    args: Option<Value>,
    #[serde(default)]
    id: Option<String>,
}

impl GenerateResponse {
    /// Whether the first candidate carries a finish signal.
    pub fn is_terminal(&self) -> bool {
        self.candidates
            .first()
            .is_some_and(|candidate| candidate.finish_reason.is_some())
    }

    /// Function requests of the first candidate.
    pub fn function_requests(&self) -> Vec<ChatFunctionRequest> {
        self.candidates
            .first()
            .map(Candidate::function_requests)
            .unwrap_or_default()
    }
}

impl Candidate {
    fn parts(&self) -> &[ResponsePart] {
        self.content
            .as_ref()
            .map(|content| content.parts.as_slice())
            .unwrap_or_default()
    }

    fn text(&self) -> String {
        self.parts()
            .iter()
            .filter_map(|part| part.text.as_deref())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn function_requests(&self) -> Vec<ChatFunctionRequest> {
        self.parts()
            .iter()
            .filter_map(|part| part.function_call.as_ref())
            .map(|call| ChatFunctionRequest {
                id: correlation_id(),
                call_id: call.id.clone().unwrap_or_else(correlation_id),
                function_name: call.name.clone(),
                function_args: call
                    .args
                    .clone()
                    .filter(|args| !args.is_null())
                    .unwrap_or_else(|| Value::Object(Map::new())),
            })
            .collect()
    }
}

/// Project a payload into a response, without the emptiness check.
pub fn project(value: Value, model: &str) -> Result<ChatResponse> {
    response(decode(value)?, model)
}

/// Parse a full `generateContent` payload.
pub fn parse(value: Value, model: &str) -> Result<ChatResponse> {
    project(value, model)?.non_empty(NAME)
}

/// Parse one streamed fragment.
///
/// A fragment whose first candidate carries a finish reason is the
/// terminal response; otherwise a fragment carrying text is an output
/// chunk; otherwise nothing.
pub fn parse_fragment(value: Value, model: &str) -> Result<Option<ChatStreamChunk>> {
    fragment_chunk(decode(value)?, model)
}

pub(crate) fn decode(value: Value) -> Result<GenerateResponse> {
    serde_json::from_value(value).map_err(|e| Error::malformed(NAME, e.to_string()))
}

pub(crate) fn fragment_chunk(
    payload: GenerateResponse,
    model: &str,
) -> Result<Option<ChatStreamChunk>> {
    let Some(candidate) = payload.candidates.first() else {
        return Ok(None);
    };
    if candidate.finish_reason.is_some() {
        return response(payload, model).map(|response| Some(ChatStreamChunk::Response(response)));
    }

    let text = candidate.text();
    Ok((!text.is_empty()).then_some(ChatStreamChunk::OutputText(text)))
}

fn response(payload: GenerateResponse, model: &str) -> Result<ChatResponse> {
    let Some(candidate) = payload.candidates.first() else {
        return Err(Error::NoCandidates { provider: NAME });
    };
    let text = candidate.text();
    let function_requests = candidate.function_requests();

    let messages = if text.is_empty() {
        Vec::new()
    } else {
        vec![ChatMessage {
            id: correlation_id(),
            output_text: text,
        }]
    };

    Ok(ChatResponse {
        id: payload.response_id.unwrap_or_else(correlation_id),
        model: payload.model_version.unwrap_or_else(|| model.into()),
        messages,
        function_requests,
    })
}
