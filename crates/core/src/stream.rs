//! Streaming chunks and the assembler that turns them into a final response.

use crate::{
    Result, Streamer,
    chat::{ChatFunctionRequest, ChatMessage, ChatResponse, correlation_id},
};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// One incremental unit of a streamed response.
///
/// A well-formed stream is zero or more [`ChatStreamChunk::OutputText`]
/// followed by exactly one [`ChatStreamChunk::Response`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ChatStreamChunk {
    /// A fragment of assistant text.
    OutputText(String),

    /// The fully assembled response, always last.
    Response(ChatResponse),
}

impl ChatStreamChunk {
    /// The text fragment, if this is an output chunk.
    pub fn output_text(&self) -> Option<&str> {
        match self {
            Self::OutputText(text) => Some(text),
            Self::Response(_) => None,
        }
    }

    /// Whether this chunk terminates the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Response(_))
    }
}

/// Forwards parsed chunks to a streamer and assembles the terminal response.
///
/// Stream parsers are stateless per fragment: the response they build for a
/// terminal fragment only knows that fragment's own content. The assembler
/// keeps the text already delivered and the function requests collected on
/// the way, and replaces the terminal response content with the full
/// accumulation before handing it on.
pub struct StreamAssembler<'s> {
    provider: &'static str,
    streamer: Streamer<'s>,
    text: String,
    function_requests: Vec<ChatFunctionRequest>,
}

impl<'s> StreamAssembler<'s> {
    /// Create an assembler delivering into `streamer`.
    pub fn new(provider: &'static str, streamer: Streamer<'s>) -> Self {
        Self {
            provider,
            streamer,
            text: String::new(),
            function_requests: Vec::new(),
        }
    }

    /// Add function requests that were assembled outside the parser, e.g.
    /// tool-call deltas merged across fragments.
    pub fn push_function_requests(
        &mut self,
        requests: impl IntoIterator<Item = ChatFunctionRequest>,
    ) {
        self.function_requests.extend(requests);
    }

    /// Forward one parsed chunk.
    ///
    /// Returns the assembled response once the terminal chunk arrives. A
    /// terminal chunk whose own fragment carried text has that text
    /// delivered as a final output chunk first.
    pub fn deliver(&mut self, chunk: ChatStreamChunk) -> Result<Option<ChatResponse>> {
        match chunk {
            ChatStreamChunk::OutputText(text) => {
                self.output(text)?;
                Ok(None)
            }
            ChatStreamChunk::Response(terminal) => {
                self.output(terminal.text())?;
                let message_id = terminal.messages.first().map(|message| message.id.clone());
                let mut function_requests = std::mem::take(&mut self.function_requests);
                function_requests.extend(terminal.function_requests);
                let response =
                    self.assemble(terminal.id, terminal.model, message_id, function_requests)?;
                Ok(Some(response))
            }
        }
    }

    /// Close a stream that ended without a terminal fragment.
    pub fn finish(mut self, id: String, model: CompactString) -> Result<ChatResponse> {
        let function_requests = std::mem::take(&mut self.function_requests);
        self.assemble(id, model, None, function_requests)
    }

    fn output(&mut self, text: String) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.text.push_str(&text);
        (self.streamer)(ChatStreamChunk::OutputText(text))
    }

    fn assemble(
        &mut self,
        id: String,
        model: CompactString,
        message_id: Option<String>,
        function_requests: Vec<ChatFunctionRequest>,
    ) -> Result<ChatResponse> {
        let messages = if self.text.is_empty() {
            Vec::new()
        } else {
            vec![ChatMessage {
                id: message_id.unwrap_or_else(correlation_id),
                output_text: self.text.clone(),
            }]
        };
        let response = ChatResponse {
            id,
            model,
            messages,
            function_requests,
        }
        .non_empty(self.provider)?;

        (self.streamer)(ChatStreamChunk::Response(response.clone()))?;
        Ok(response)
    }
}
