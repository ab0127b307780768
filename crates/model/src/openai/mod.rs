//! OpenAI chat completions provider.
//!
//! Also owns the OpenAI-compatible request body and payload parsers, which
//! the OpenRouter adapter reuses.

use crate::http::{HttpProvider, Retry};
use reqwest::Client;
use tcore::Result;

pub use parser::{parse, parse_fragment, project};
pub use request::{Request, WireMessage};

mod parser;
mod provider;
mod request;

/// The OpenAI chat completions endpoint.
pub const ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Adapter name used in errors and logs.
pub const NAME: &str = "OpenAI";

/// Served models and their display names, in catalog order.
pub const MODELS: &[(&str, &str)] = &[
    ("gpt-4.1", "GPT-4.1 (OpenAI)"),
    ("gpt-4.1-mini", "GPT-4.1 Mini (OpenAI)"),
];

/// The OpenAI provider.
#[derive(Clone)]
pub struct OpenAI {
    /// Bearer-authenticated transport.
    http: HttpProvider,
    /// Chat completions endpoint URL.
    endpoint: String,
}

impl OpenAI {
    /// Create a provider targeting the OpenAI API.
    pub fn api(client: Client, key: &str) -> Result<Self> {
        Self::custom(client, key, ENDPOINT)
    }

    /// Create a provider targeting a custom OpenAI-compatible endpoint.
    pub fn custom(client: Client, key: &str, endpoint: &str) -> Result<Self> {
        Ok(Self {
            http: HttpProvider::new(NAME, client).bearer(key)?,
            endpoint: endpoint.to_owned(),
        })
    }

    /// Replace the retry policy for non-streaming calls.
    pub fn with_retry(mut self, retry: Retry) -> Self {
        self.http = self.http.with_retry(retry);
        self
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
