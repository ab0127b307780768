//! Tests for the stream assembler.

use tally_core::{
    ChatFunctionRequest, ChatMessage, ChatResponse, ChatStreamChunk, Error, Result,
    StreamAssembler,
};

fn terminal(text: Option<&str>) -> ChatResponse {
    ChatResponse {
        id: "resp-1".into(),
        model: "gemini-2.5-flash".into(),
        messages: text
            .map(|text| {
                vec![ChatMessage {
                    id: "msg-1".into(),
                    output_text: text.into(),
                }]
            })
            .unwrap_or_default(),
        function_requests: Vec::new(),
    }
}

fn collect<F>(drive: F) -> (Vec<ChatStreamChunk>, Result<Option<ChatResponse>>)
where
    F: FnOnce(&mut StreamAssembler<'_>) -> Result<Option<ChatResponse>>,
{
    let mut seen = Vec::new();
    let mut streamer = |chunk: ChatStreamChunk| -> Result<()> {
        seen.push(chunk);
        Ok(())
    };
    let result = {
        let mut assembler = StreamAssembler::new("Gemini", &mut streamer);
        drive(&mut assembler)
    };
    (seen, result)
}

#[test]
fn terminal_response_carries_all_delivered_text() {
    let (seen, result) = collect(|asm| {
        asm.deliver(ChatStreamChunk::OutputText("Hi".into()))?;
        asm.deliver(ChatStreamChunk::OutputText(" there".into()))?;
        asm.deliver(ChatStreamChunk::Response(terminal(None)))
    });
    let response = result.unwrap().expect("terminal response");
    assert_eq!(response.text(), "Hi there");
    assert_eq!(seen.len(), 3);
    assert_eq!(seen[0].output_text(), Some("Hi"));
    assert_eq!(seen[1].output_text(), Some(" there"));
    assert_eq!(seen[2], ChatStreamChunk::Response(response));
}

#[test]
fn terminal_fragment_text_is_delivered_before_response() {
    let (seen, result) = collect(|asm| {
        asm.deliver(ChatStreamChunk::OutputText("Hello".into()))?;
        asm.deliver(ChatStreamChunk::Response(terminal(Some(", world"))))
    });
    let response = result.unwrap().expect("terminal response");
    let streamed: String = seen.iter().filter_map(|c| c.output_text()).collect();
    assert_eq!(streamed, "Hello, world");
    assert_eq!(response.text(), streamed);
    assert_eq!(response.messages[0].id, "msg-1");
    assert!(seen.last().unwrap().is_terminal());
}

#[test]
fn empty_stream_fails_without_terminal_chunk() {
    let (seen, result) = collect(|asm| asm.deliver(ChatStreamChunk::Response(terminal(None))));
    assert!(matches!(result, Err(Error::EmptyResponse { .. })));
    assert!(seen.is_empty());
}

#[test]
fn function_requests_survive_assembly() {
    let (_, result) = collect(|asm| {
        asm.push_function_requests([ChatFunctionRequest {
            id: "fn-1".into(),
            call_id: "call-1".into(),
            function_name: "get_accounts".into(),
            function_args: serde_json::json!({}),
        }]);
        asm.deliver(ChatStreamChunk::Response(terminal(None)))
    });
    let response = result.unwrap().expect("terminal response");
    assert!(response.messages.is_empty());
    assert_eq!(response.function_requests[0].call_id, "call-1");
}

#[test]
fn finish_without_terminal_fragment() {
    let mut seen = Vec::new();
    let mut streamer = |chunk: ChatStreamChunk| -> Result<()> {
        seen.push(chunk);
        Ok(())
    };
    let mut assembler = StreamAssembler::new("OpenAI", &mut streamer);
    assembler
        .deliver(ChatStreamChunk::OutputText("partial".into()))
        .unwrap();
    let response = assembler.finish("resp-9".into(), "gpt-4.1".into()).unwrap();
    assert_eq!(response.id, "resp-9");
    assert_eq!(response.text(), "partial");
    assert_eq!(seen.len(), 2);
}

#[test]
fn streamer_error_aborts_delivery() {
    let mut streamer =
        |_: ChatStreamChunk| -> Result<()> { Err(Error::Store("disk full".into())) };
    let mut assembler = StreamAssembler::new("OpenAI", &mut streamer);
    let err = assembler
        .deliver(ChatStreamChunk::OutputText("x".into()))
        .unwrap_err();
    assert!(matches!(err, Error::Store(_)));
}
