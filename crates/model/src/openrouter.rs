//! OpenRouter provider.
//!
//! Speaks the OpenAI-compatible wire format without tool declarations. The
//! backend is always called synchronously; when a streamer is given, the
//! full text is delivered as one output chunk followed by the response.

use crate::{
    config::{DEFAULT_APP_NAME, DEFAULT_SITE_URL},
    http::{HttpProvider, Retry},
    openai,
    provider::{table_options, unsupported},
};
use reqwest::Client;
use tcore::{
    Adapter, ChatRequest, ChatResponse, ChatStreamChunk, Error, ModelOption, ProviderTag, Result,
    StreamAssembler, Streamer,
};

/// The OpenRouter chat completions endpoint.
pub const ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Adapter name used in errors and logs.
pub const NAME: &str = "OpenRouter";

/// Served models and their display names, in catalog order.
pub const MODELS: &[(&str, &str)] = &[(
    "openrouter/anthropic/claude-3-haiku",
    "Claude 3 Haiku (OpenRouter)",
)];

/// The OpenRouter provider.
#[derive(Clone)]
pub struct OpenRouter {
    /// Bearer-authenticated transport with attribution headers.
    http: HttpProvider,
    /// Chat completions endpoint URL.
    endpoint: String,
}

impl OpenRouter {
    /// Create a provider targeting the OpenRouter API.
    ///
    /// `site_url` and `app_name` are sent as the `HTTP-Referer` and
    /// `X-Title` attribution headers.
    pub fn api(
        client: Client,
        key: &str,
        site_url: Option<&str>,
        app_name: Option<&str>,
    ) -> Result<Self> {
        Self::custom(client, key, site_url, app_name, ENDPOINT)
    }

    /// Create a provider targeting a custom endpoint.
    pub fn custom(
        client: Client,
        key: &str,
        site_url: Option<&str>,
        app_name: Option<&str>,
        endpoint: &str,
    ) -> Result<Self> {
        let http = HttpProvider::new(NAME, client)
            .bearer(key)?
            .header("HTTP-Referer", site_url.unwrap_or(DEFAULT_SITE_URL))?
            .header("X-Title", app_name.unwrap_or(DEFAULT_APP_NAME))?;
        Ok(Self {
            http,
            endpoint: endpoint.to_owned(),
        })
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: Retry) -> Self {
        self.http = self.http.with_retry(retry);
        self
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Adapter for OpenRouter {
    fn name(&self) -> &'static str {
        NAME
    }

    fn tag(&self) -> ProviderTag {
        ProviderTag::OpenRouter
    }

    fn supports_model(&self, model: &str) -> bool {
        MODELS.iter().any(|(id, _)| *id == model)
    }

    fn model_options(&self) -> Vec<ModelOption> {
        table_options(MODELS, ProviderTag::OpenRouter)
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
        if !request.functions.is_empty() {
            tracing::debug!(
                "openrouter: dropping {} function declarations",
                request.functions.len()
            );
        }

        let body = openai::Request::from(&request);
        let value = self.http.post_json(&self.endpoint, &body).await?;
        let response = openai::parse(NAME, value, &request.model)?;
        let Some(streamer) = streamer else {
            return Ok(response);
        };

        StreamAssembler::new(NAME, streamer)
            .deliver(ChatStreamChunk::Response(response))?
            .ok_or(Error::EmptyResponse { provider: NAME })
    }
}
