//! Google Gemini provider.
//!
//! Talks to the `generateContent` REST API directly, authenticating with
//! the `key` query parameter.

use crate::http::{HttpProvider, Retry};
use reqwest::Client;

pub use parser::{parse, parse_fragment, project};
pub use request::{Content, Part, Request, Tool};

mod parser;
mod provider;
mod request;

/// The Gemini REST API base URL.
pub const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Adapter name used in errors and logs.
pub const NAME: &str = "Gemini";

/// Served models and their display names, in catalog order.
pub const MODELS: &[(&str, &str)] = &[
    ("gemini-2.5-flash", "Gemini 2.5 Flash (Google)"),
    ("gemini-2.5-pro", "Gemini 2.5 Pro (Google)"),
    ("gemini-2.5-flash-lite", "Gemini 2.5 Flash Lite (Google)"),
];

/// The Gemini provider.
#[derive(Clone)]
pub struct Gemini {
    /// Query-key authenticated transport.
    http: HttpProvider,
    /// API base URL, without a trailing slash.
    base_url: String,
}

impl Gemini {
    /// Create a provider targeting the Gemini API.
    pub fn api(client: Client, key: &str) -> Self {
        Self::custom(client, key, BASE_URL)
    }

    /// Create a provider targeting a custom Gemini-compatible base URL.
    pub fn custom(client: Client, key: &str, base_url: &str) -> Self {
        Self {
            http: HttpProvider::new(NAME, client).query_key("key", key),
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Replace the retry policy for non-streaming calls.
    pub fn with_retry(mut self, retry: Retry) -> Self {
        self.http = self.http.with_retry(retry);
        self
    }

    /// The non-streaming endpoint for `model`.
    pub fn generate_url(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    /// The SSE endpoint for `model`.
    pub fn stream_url(&self, model: &str) -> String {
        format!("{}/models/{model}:streamGenerateContent?alt=sse", self.base_url)
    }
}
