//! Adapter implementation for the Gemini provider.

use super::{Gemini, MODELS, NAME, Request, parser};
use crate::provider::{table_options, unsupported};
use futures_util::StreamExt;
use tcore::{
    Adapter, ChatRequest, ChatResponse, ModelOption, ProviderTag, Result, StreamAssembler,
    Streamer, correlation_id,
};

impl Adapter for Gemini {
    fn name(&self) -> &'static str {
        NAME
    }

    fn tag(&self) -> ProviderTag {
        ProviderTag::Gemini
    }

    fn supports_model(&self, model: &str) -> bool {
        MODELS.iter().any(|(id, _)| *id == model)
    }

    fn model_options(&self) -> Vec<ModelOption> {
        table_options(MODELS, ProviderTag::Gemini)
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

        let body = Request::from(&request);
        let Some(streamer) = streamer else {
            let value = self
                .http
                .post_json(&self.generate_url(&request.model), &body)
                .await?;
            return parser::parse(value, &request.model);
        };

        let url = self.stream_url(&request.model);
        let mut assembler = StreamAssembler::new(NAME, streamer);
        let mut id = None;
        let mut fragments = std::pin::pin!(self.http.stream_sse(&url, &body));
        while let Some(fragment) = fragments.next().await {
            let payload = parser::decode(fragment?)?;
            if id.is_none() {
                id = payload.response_id.clone();
            }
            // Function calls arrive whole, possibly ahead of the terminal
            // fragment.
            if !payload.is_terminal() {
                assembler.push_function_requests(payload.function_requests());
            }
            if let Some(chunk) = parser::fragment_chunk(payload, &request.model)?
                && let Some(response) = assembler.deliver(chunk)?
            {
                return Ok(response);
            }
        }

        assembler.finish(id.unwrap_or_else(correlation_id), request.model)
    }
}
