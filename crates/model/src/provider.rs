//! Provider implementation.
//!
//! Unified `Provider` enum with enum dispatch over concrete backends.
//! `build_provider()` matches on the backend of a config entry.

use crate::{
    config::{HttpConfig, ProviderConfig},
    gemini::Gemini,
    http::Retry,
    openai::OpenAI,
    openrouter::OpenRouter,
};
use reqwest::Client;
use tcore::{
    Adapter, ChatRequest, ChatResponse, Error, ModelOption, ProviderTag, Result, Streamer,
};

/// Unified LLM provider enum.
///
/// The registry is monomorphized on `Provider`.
#[derive(Clone)]
pub enum Provider {
    /// OpenAI chat completions.
    OpenAI(OpenAI),
    /// Google Gemini.
    Gemini(Gemini),
    /// OpenRouter.
    OpenRouter(OpenRouter),
}

/// Build the HTTP client shared by every provider.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    Client::builder()
        .timeout(config.timeout())
        .build()
        .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))
}

/// Construct a `Provider` from config and a shared HTTP client.
///
/// Returns `None` for an entry without a credential: the slot stays empty
/// and the backend is simply not offered.
pub fn build_provider(
    config: &ProviderConfig,
    client: Client,
    retry: Retry,
) -> Result<Option<Provider>> {
    if !config.is_configured() {
        tracing::debug!("{} provider has no api key, skipping", config.tag());
        return Ok(None);
    }

    let key = config.api_key();
    let provider = match config {
        ProviderConfig::OpenAI(c) => {
            let openai = match c.base_url.as_deref() {
                Some(url) => OpenAI::custom(client, key, url)?,
                None => OpenAI::api(client, key)?,
            };
            Provider::OpenAI(openai.with_retry(retry))
        }
        ProviderConfig::Gemini(c) => {
            let gemini = match c.base_url.as_deref() {
                Some(url) => Gemini::custom(client, key, url),
                None => Gemini::api(client, key),
            };
            Provider::Gemini(gemini.with_retry(retry))
        }
        ProviderConfig::OpenRouter(c) => {
            let site_url = c.site_url.as_deref();
            let app_name = c.app_name.as_deref();
            let openrouter = match c.base_url.as_deref() {
                Some(url) => OpenRouter::custom(client, key, site_url, app_name, url)?,
                None => OpenRouter::api(client, key, site_url, app_name)?,
            };
            Provider::OpenRouter(openrouter.with_retry(retry))
        }
    };
    Ok(Some(provider))
}

impl Adapter for Provider {
    fn name(&self) -> &'static str {
        match self {
            Self::OpenAI(p) => p.name(),
            Self::Gemini(p) => p.name(),
            Self::OpenRouter(p) => p.name(),
        }
    }

    fn tag(&self) -> ProviderTag {
        match self {
            Self::OpenAI(p) => p.tag(),
            Self::Gemini(p) => p.tag(),
            Self::OpenRouter(p) => p.tag(),
        }
    }

    fn supports_model(&self, model: &str) -> bool {
        match self {
            Self::OpenAI(p) => p.supports_model(model),
            Self::Gemini(p) => p.supports_model(model),
            Self::OpenRouter(p) => p.supports_model(model),
        }
    }

    fn model_options(&self) -> Vec<ModelOption> {
        match self {
            Self::OpenAI(p) => p.model_options(),
            Self::Gemini(p) => p.model_options(),
            Self::OpenRouter(p) => p.model_options(),
        }
    }

    async fn chat_response(
        &self,
        request: ChatRequest,
        streamer: Option<Streamer<'_>>,
    ) -> Result<ChatResponse> {
        match self {
            Self::OpenAI(p) => p.chat_response(request, streamer).await,
            Self::Gemini(p) => p.chat_response(request, streamer).await,
            Self::OpenRouter(p) => p.chat_response(request, streamer).await,
        }
    }
}

/// Expand a static model table into catalog options.
pub(crate) fn table_options(models: &[(&str, &str)], tag: ProviderTag) -> Vec<ModelOption> {
    models
        .iter()
        .map(|(id, name)| ModelOption::new(*id, *name, tag))
        .collect()
}

pub(crate) fn unsupported(provider: &'static str, model: &str) -> Error {
    Error::ModelUnsupported {
        provider,
        model: model.to_owned(),
    }
}
