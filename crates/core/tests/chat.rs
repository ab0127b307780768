//! Tests for the canonical request/response shapes.

use tally_core::{
    ChatMessage, ChatRequest, ChatResponse, ChatStreamChunk, Error, FunctionResult,
};

fn response(messages: Vec<ChatMessage>) -> ChatResponse {
    ChatResponse {
        id: "resp-1".into(),
        model: "gemini-2.5-flash".into(),
        messages,
        function_requests: Vec::new(),
    }
}

#[test]
fn blank_prompt_is_invalid() {
    let err = ChatRequest::new("gpt-4.1", "   ").validate().unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
}

#[test]
fn builder_sets_optional_fields() {
    let req = ChatRequest::new("gpt-4.1", "Hello")
        .with_instructions("Be brief")
        .with_previous_response_id("resp-0")
        .with_function_results(vec![FunctionResult {
            name: "get_balance".into(),
            call_id: None,
            output: serde_json::json!({ "amount": 10 }),
        }]);
    req.validate().unwrap();
    assert_eq!(req.instructions(), Some("Be brief"));
    assert_eq!(req.previous_response_id.as_deref(), Some("resp-0"));
    assert_eq!(req.function_results.len(), 1);
}

#[test]
fn blank_instructions_are_ignored() {
    let req = ChatRequest::new("gpt-4.1", "Hello").with_instructions("  ");
    assert_eq!(req.instructions(), None);
}

#[test]
fn response_text_joins_messages() {
    let resp = response(vec![
        ChatMessage {
            id: "a".into(),
            output_text: "first".into(),
        },
        ChatMessage {
            id: "b".into(),
            output_text: "second".into(),
        },
    ]);
    assert_eq!(resp.text(), "first\nsecond");
}

#[test]
fn empty_response_is_a_provider_failure() {
    let err = response(Vec::new()).non_empty("Gemini").unwrap_err();
    assert!(matches!(err, Error::EmptyResponse { provider: "Gemini" }));
    assert!(err.is_backend());
}

#[test]
fn stream_chunk_wire_shape() {
    let chunk = ChatStreamChunk::OutputText("Hi".into());
    let json = serde_json::to_value(&chunk).unwrap();
    assert_eq!(json["type"], "output_text");
    assert_eq!(json["data"], "Hi");
    assert_eq!(chunk.output_text(), Some("Hi"));
    assert!(!chunk.is_terminal());
}

#[test]
fn no_provider_error_lists_supported_models() {
    let err = Error::NoProviderForModel {
        model: "model-x".into(),
        supported: vec!["gpt-4.1".into(), "gemini-2.5-pro".into()],
    };
    let message = err.to_string();
    assert!(message.contains("model-x"));
    assert!(message.contains("gpt-4.1, gemini-2.5-pro"));
    assert!(!err.is_backend());
}

#[test]
fn transport_error_mentions_status() {
    let err = Error::transport("OpenRouter", Some(429), "rate limited");
    assert_eq!(
        err.to_string(),
        "OpenRouter request failed (HTTP 429): rate limited"
    );
    let err = Error::transport("OpenRouter", None, "connection refused");
    assert_eq!(err.to_string(), "OpenRouter request failed: connection refused");
}
