//! Adapter implementation for the OpenAI provider.

use super::{
    MODELS, NAME, OpenAI, Request,
    parser::{self, Completion},
};
use crate::{
    http::HttpProvider,
    provider::{table_options, unsupported},
};
use futures_util::StreamExt;
use std::collections::BTreeMap;
use tcore::{
    Adapter, ChatFunctionRequest, ChatRequest, ChatResponse, ModelOption, ProviderTag, Result,
    StreamAssembler, Streamer, correlation_id,
};

impl Adapter for OpenAI {
    fn name(&self) -> &'static str {
        NAME
    }

    fn tag(&self) -> ProviderTag {
        ProviderTag::OpenAI
    }

    fn supports_model(&self, model: &str) -> bool {
        MODELS.iter().any(|(id, _)| *id == model)
    }

    fn model_options(&self) -> Vec<ModelOption> {
        table_options(MODELS, ProviderTag::OpenAI)
    }

    async fn chat_response(
        &self,
        request: ChatRequest,
        streamer: Option<Streamer<'_>>,
    ) -> Result<ChatResponse> {
        if !self.supports_model(&request.model) {
            return Err(unsupported(NAME, &request.model));
        }
        request.validate()?;

        let body = Request::from(&request).with_tools(&request.functions);
        match streamer {
            None => {
                let value = self.http.post_json(&self.endpoint, &body).await?;
                parser::parse(NAME, value, &request.model)
            }
            Some(streamer) => {
                stream(&self.http, &self.endpoint, &body.stream(), &request.model, streamer).await
            }
        }
    }
}

/// Drive a streamed completion through the assembler.
async fn stream(
    http: &HttpProvider,
    endpoint: &str,
    body: &Request,
    model: &str,
    streamer: Streamer<'_>,
) -> Result<ChatResponse> {
    let provider = http.provider();
    let mut assembler = StreamAssembler::new(provider, streamer);
    let mut tool_calls = ToolCalls::default();
    let mut id = None;

    let mut fragments = std::pin::pin!(http.stream_sse(endpoint, body));
    while let Some(fragment) = fragments.next().await {
        let completion = parser::decode(provider, fragment?)?;
        if id.is_none() {
            id = completion.id.clone();
        }
        tool_calls.merge(&completion);

        let Some(chunk) = parser::fragment_chunk(provider, completion, model)? else {
            continue;
        };
        if chunk.is_terminal() {
            assembler.push_function_requests(tool_calls.finish(provider)?);
        }
        if let Some(response) = assembler.deliver(chunk)? {
            return Ok(response);
        }
    }

    // `[DONE]` without a finish reason: close with what arrived.
    assembler.push_function_requests(tool_calls.finish(provider)?);
    assembler.finish(id.unwrap_or_else(correlation_id), model.into())
}

/// Tool-call deltas merged by index across fragments.
#[derive(Default)]
struct ToolCalls {
    calls: BTreeMap<usize, PartialCall>,
}

#[derive(Default)]
struct PartialCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

impl ToolCalls {
    fn merge(&mut self, completion: &Completion) {
        let deltas = completion
            .choices
            .first()
            .and_then(|choice| choice.delta.as_ref())
            .and_then(|delta| delta.tool_calls.as_ref());
        for (position, delta) in deltas.into_iter().flatten().enumerate() {
            let call = self
                .calls
                .entry(delta.index.unwrap_or(position))
                .or_default();
            if let Some(id) = &delta.id {
                call.id = Some(id.clone());
            }
            if let Some(function) = &delta.function {
                if let Some(name) = &function.name {
                    call.name.push_str(name);
                }
                if let Some(arguments) = &function.arguments {
                    call.arguments.push_str(arguments);
                }
            }
        }
    }

    fn finish(&mut self, provider: &'static str) -> Result<Vec<ChatFunctionRequest>> {
        std::mem::take(&mut self.calls)
            .into_values()
            .map(|call| parser::function_request(provider, call.id, call.name, &call.arguments))
            .collect()
    }
}
