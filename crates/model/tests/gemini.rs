//! HTTP-level and parser tests for the Gemini adapter.

use serde_json::{Value, json};
use tally_model::{Gemini, Retry, gemini};
use tcore::{
    Adapter, ChatFunction, ChatRequest, ChatResponse, ChatStreamChunk, Error, FunctionResult,
    Result,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn adapter(server: &MockServer) -> Gemini {
    Gemini::custom(reqwest::Client::new(), "test-key", &server.uri()).with_retry(Retry::none())
}

fn candidate(parts: Value, finish: Option<&str>) -> Value {
    let mut candidate = json!({ "content": { "role": "model", "parts": parts } });
    if let Some(reason) = finish {
        candidate["finishReason"] = json!(reason);
    }
    json!({ "candidates": [candidate], "modelVersion": "gemini-2.5-flash-001" })
}

async fn stream(
    gemini: &Gemini,
    request: ChatRequest,
) -> (Vec<ChatStreamChunk>, Result<ChatResponse>) {
    let mut chunks = Vec::new();
    let mut streamer = |chunk: ChatStreamChunk| -> Result<()> {
        chunks.push(chunk);
        Ok(())
    };
    let result = gemini.chat_response(request, Some(&mut streamer)).await;
    (chunks, result)
}

#[tokio::test]
async fn non_streaming_request_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:generateContent"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(
            json!([{ "text": "Groceries" }, { "text": "mostly" }]),
            Some("STOP"),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let request = ChatRequest::new("gemini-2.5-flash", "Summarize my spending")
        .with_instructions("You are a finance assistant.")
        .with_functions(vec![ChatFunction {
            name: "get_transactions".into(),
            description: "List transactions".into(),
            parameters: json!({ "type": "object", "properties": {} }),
        }])
        .with_function_results(vec![FunctionResult {
            name: "get_accounts".into(),
            call_id: None,
            output: json!(["checking"]),
        }]);
    let response = adapter(&server).chat_response(request, None).await.unwrap();
    assert_eq!(response.text(), "Groceries\nmostly");
    assert_eq!(response.messages.len(), 1);
    assert_eq!(response.model, "gemini-2.5-flash-001");
    assert!(!response.id.is_empty());

    let sent: Value = server.received_requests().await.unwrap()[0]
        .body_json()
        .unwrap();
    assert_eq!(
        sent["contents"][0],
        json!({ "role": "user", "parts": [{ "text": "Summarize my spending" }] })
    );
    assert_eq!(sent["contents"][1]["role"], "function");
    assert_eq!(
        sent["contents"][1]["parts"][0]["functionResponse"],
        json!({ "name": "get_accounts", "response": { "content": ["checking"] } })
    );
    assert_eq!(
        sent["systemInstruction"]["parts"][0]["text"],
        "You are a finance assistant."
    );
    assert_eq!(
        sent["tools"][0]["functionDeclarations"][0]["name"],
        "get_transactions"
    );
}

#[tokio::test]
async fn unsupported_model_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = adapter(&server)
        .chat_response(ChatRequest::new("model-b", "Hello"), None)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "model 'model-b' is not supported by Gemini"
    );
}

#[tokio::test]
async fn streaming_delivers_every_fragment() {
    let server = MockServer::start().await;
    let body = format!(
        "data: {}\r\n\r\ndata: {}\r\n\r\ndata: {}\r\n\r\n",
        candidate(json!([{ "text": "Hi" }]), None),
        candidate(json!([{ "text": " there" }]), None),
        candidate(json!([{ "text": "!" }]), Some("STOP")),
    );
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-pro:streamGenerateContent"))
        .and(query_param("alt", "sse"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let request = ChatRequest::new("gemini-2.5-pro", "Hello");
    let (chunks, result) = stream(&adapter(&server), request).await;
    let response = result.unwrap();
    assert_eq!(response.text(), "Hi there!");
    let streamed: String = chunks
        .iter()
        .filter_map(ChatStreamChunk::output_text)
        .collect();
    assert_eq!(streamed, "Hi there!");
    assert_eq!(chunks.last(), Some(&ChatStreamChunk::Response(response)));
}

#[tokio::test]
async fn streamed_function_calls_are_kept() {
    let server = MockServer::start().await;
    let body = format!(
        "data: {}\n\ndata: {}\n\n",
        candidate(
            json!([{
                "functionCall": { "name": "get_balance", "args": { "account": "savings" } }
            }]),
            None
        ),
        candidate(json!([]), Some("STOP")),
    );
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let request = ChatRequest::new("gemini-2.5-flash", "Hello");
    let (_, result) = stream(&adapter(&server), request).await;
    let response = result.unwrap();
    assert_eq!(response.function_requests.len(), 1);
    assert_eq!(response.function_requests[0].function_name, "get_balance");
}

#[tokio::test]
async fn rejected_stream_reports_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gemini-2.5-flash:streamGenerateContent"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": { "message": "bad key" } })),
        )
        .mount(&server)
        .await;

    let request = ChatRequest::new("gemini-2.5-flash", "Hello");
    let (chunks, result) = stream(&adapter(&server), request).await;
    assert!(chunks.is_empty());
    match result.unwrap_err() {
        Error::TransportFailure { status, message, .. } => {
            assert_eq!(status, Some(401));
            assert_eq!(message, "bad key");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn connection_errors_do_not_expose_the_api_key() {
    // Nothing listens on port 1.
    let gemini = Gemini::custom(reqwest::Client::new(), "SECRET-KEY-123", "http://127.0.0.1:1")
        .with_retry(Retry::none());

    let err = gemini
        .chat_response(ChatRequest::new("gemini-2.5-flash", "Hello"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::TransportFailure { .. }), "{err}");
    assert!(!err.to_string().contains("SECRET-KEY-123"), "{err}");

    let (_, result) = stream(&gemini, ChatRequest::new("gemini-2.5-flash", "Hello")).await;
    let err = result.unwrap_err();
    assert!(!err.to_string().contains("SECRET-KEY-123"), "{err}");
}

#[test]
fn parse_function_calls_in_order() {
    let payload = candidate(
        json!([
            { "functionCall": { "name": "first", "args": { "n": 1 } } },
            { "text": "calling tools" },
            { "functionCall": { "name": "second" } }
        ]),
        Some("STOP"),
    );
    let response = gemini::parse(payload, "gemini-2.5-flash").unwrap();
    assert_eq!(response.text(), "calling tools");
    let names: Vec<_> = response
        .function_requests
        .iter()
        .map(|call| call.function_name.as_str())
        .collect();
    assert_eq!(names, ["first", "second"]);
    assert_eq!(response.function_requests[1].function_args, json!({}));
    assert_ne!(
        response.function_requests[0].call_id,
        response.function_requests[1].call_id
    );
}

#[test]
fn parse_without_candidates() {
    let err = gemini::parse(json!({ "candidates": [] }), "gemini-2.5-flash").unwrap_err();
    assert!(matches!(err, Error::NoCandidates { provider: "Gemini" }));
}

#[test]
fn parse_without_parts_is_empty() {
    let err = gemini::parse(candidate(json!([]), Some("STOP")), "gemini-2.5-flash").unwrap_err();
    assert!(matches!(err, Error::EmptyResponse { provider: "Gemini" }));
}

#[test]
fn parse_structural_mismatch_is_malformed() {
    let err = gemini::parse(json!({ "candidates": "nope" }), "gemini-2.5-flash").unwrap_err();
    assert!(matches!(err, Error::MalformedProviderOutput { .. }));
}

#[test]
fn response_falls_back_to_requested_model() {
    let payload = json!({ "candidates": [{ "content": { "parts": [{ "text": "ok" }] } }] });
    let response = gemini::parse(payload, "gemini-2.5-pro").unwrap();
    assert_eq!(response.model, "gemini-2.5-pro");
}

#[test]
fn fragment_classification() {
    let model = "gemini-2.5-flash";
    assert_eq!(
        gemini::parse_fragment(candidate(json!([{ "text": "Hi" }]), None), model).unwrap(),
        Some(ChatStreamChunk::OutputText("Hi".into()))
    );
    assert!(
        gemini::parse_fragment(candidate(json!([{ "text": "end" }]), Some("STOP")), model)
            .unwrap()
            .is_some_and(|chunk| chunk.is_terminal())
    );
    assert_eq!(
        gemini::parse_fragment(json!({ "candidates": [] }), model).unwrap(),
        None
    );
    assert_eq!(
        gemini::parse_fragment(candidate(json!([]), None), model).unwrap(),
        None
    );
}
