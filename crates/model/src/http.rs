//! Shared HTTP transport for the provider adapters.
//!
//! `HttpProvider` wraps a `reqwest::Client` with pre-configured headers and
//! query parameters. Provides `post_json()` for non-streaming calls, retried
//! with exponential backoff on transient failures, and `stream_sse()` for
//! Server-Sent Events streaming. Every failure leaves this module already
//! mapped into the gateway error taxonomy.

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::{
    Client, Method, RequestBuilder, StatusCode,
    header::{self, HeaderMap, HeaderName, HeaderValue},
};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tcore::{Error, Result};

/// Retry policy for non-streaming calls.
///
/// Only connect errors, timeouts, `429` and `5xx` answers are retried.
/// Streaming calls are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, doubled on every further one.
    pub base_delay: Duration,
}

impl Default for Retry {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl Retry {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    fn delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1 << attempt.min(16))
    }
}

/// Shared HTTP transport for a single backend.
#[derive(Clone)]
pub struct HttpProvider {
    provider: &'static str,
    client: Client,
    headers: HeaderMap,
    query: Vec<(&'static str, String)>,
    retry: Retry,
}

impl HttpProvider {
    /// Create a transport without authentication.
    pub fn new(provider: &'static str, client: Client) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        Self {
            provider,
            client,
            headers,
            query: Vec::new(),
            retry: Retry::default(),
        }
    }

    /// Authenticate with a Bearer token.
    pub fn bearer(self, key: &str) -> Result<Self> {
        self.header(header::AUTHORIZATION.as_str(), &format!("Bearer {key}"))
    }

    /// Authenticate with a query parameter, e.g. Gemini's `key`.
    pub fn query_key(mut self, name: &'static str, key: &str) -> Self {
        self.query.push((name, key.to_owned()));
        self
    }

    /// Add a custom header.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = name
            .parse::<HeaderName>()
            .map_err(|e| Error::Config(format!("invalid header name '{name}': {e}")))?;
        let value = value
            .parse::<HeaderValue>()
            .map_err(|e| Error::Config(format!("invalid value for header '{name}': {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Replace the retry policy.
    pub fn with_retry(mut self, retry: Retry) -> Self {
        self.retry = retry;
        self
    }

    /// Adapter name used in errors.
    pub fn provider(&self) -> &'static str {
        self.provider
    }

    /// Send a non-streaming request and return the decoded JSON payload.
    ///
    /// Provider error envelopes (`{"error": ...}`) and non-2xx answers are
    /// reported as [`Error::TransportFailure`].
    pub async fn post_json<B: Serialize + Sync>(&self, url: &str, body: &B) -> Result<Value> {
        if let Ok(body) = serde_json::to_string(body) {
            tracing::trace!("request: {body}");
        }

        let mut attempt = 0;
        loop {
            match self.attempt(url, body).await {
                Ok(value) => return Ok(value),
                Err(failure) if failure.retryable && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay(attempt);
                    tracing::warn!(
                        "{} request failed, retrying in {delay:?}: {}",
                        self.provider,
                        failure.error
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }

    /// Stream an SSE response.
    ///
    /// Buffers the body into blank-line separated blocks, joins their
    /// `data:` lines, skips the `[DONE]` sentinel and yields every payload
    /// as JSON. A fragment that is not JSON, or that carries an error
    /// envelope, ends the stream with an error.
    pub fn stream_sse<B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> impl Stream<Item = Result<Value>> + Send {
        if let Ok(body) = serde_json::to_string(body) {
            tracing::trace!("request: {body}");
        }
        let request = self.request(url).json(body);
        let provider = self.provider;

        try_stream! {
            let response = request
                .send()
                .await
                .map_err(|e| transport_error(provider, e))?;
            let status = response.status();
            let response = if status.is_success() {
                response
            } else {
                let text = response.text().await.unwrap_or_default();
                Err::<reqwest::Response, _>(status_error(provider, status, &text))?
            };

            let mut stream = response.bytes_stream();
            let mut buf: Vec<u8> = Vec::new();
            while let Some(next) = stream.next().await {
                let bytes = next.map_err(|e| transport_error(provider, e))?;
                buf.extend(bytes.iter().filter(|byte| **byte != b'\r'));
                while let Some(pos) = block_end(&buf) {
                    let block = String::from_utf8_lossy(&buf[..pos]).into_owned();
                    buf.drain(..pos + 2);
                    if let Some(value) = parse_block(provider, &block)? {
                        yield value;
                    }
                }
            }

            // Handle any remaining data in buffer.
            let rest = String::from_utf8_lossy(&buf).into_owned();
            if let Some(value) = parse_block(provider, &rest)? {
                yield value;
            }
        }
    }

    fn request(&self, url: &str) -> RequestBuilder {
        let request = self
            .client
            .request(Method::POST, url)
            .headers(self.headers.clone());
        if self.query.is_empty() {
            request
        } else {
            request.query(&self.query)
        }
    }

    async fn attempt<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> std::result::Result<Value, Failure> {
        let response = self
            .request(url)
            .json(body)
            .send()
            .await
            .map_err(|e| Failure::from_reqwest(self.provider, e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Failure::from_reqwest(self.provider, e))?;

        tracing::trace!("response: {text}");
        decode(self.provider, status, &text).map_err(|error| Failure {
            error,
            retryable: retryable_status(status),
        })
    }
}

/// A failed attempt, tagged with whether another one may help.
struct Failure {
    error: Error,
    retryable: bool,
}

impl Failure {
    fn from_reqwest(provider: &'static str, e: reqwest::Error) -> Self {
        let retryable =
            e.is_timeout() || e.is_connect() || e.status().is_some_and(retryable_status);
        Self {
            error: transport_error(provider, e),
            retryable,
        }
    }
}

/// Report an error envelope as a transport failure.
///
/// Accepts both a bare envelope and a one-element array wrapping one, the
/// shape Gemini uses for errors on streaming endpoints.
fn check_envelope(provider: &'static str, value: &Value) -> Result<()> {
    let Some(error) = envelope(value) else {
        return Ok(());
    };
    let status = error
        .get("code")
        .and_then(Value::as_u64)
        .and_then(|code| u16::try_from(code).ok());
    Err(Error::transport(provider, status, envelope_message(error)))
}

fn envelope(value: &Value) -> Option<&Value> {
    let value = match value {
        Value::Array(items) => items.first()?,
        other => other,
    };
    value.get("error").filter(|error| !error.is_null())
}

fn envelope_message(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        other => other
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| other.to_string()),
    }
}

fn decode(provider: &'static str, status: StatusCode, text: &str) -> Result<Value> {
    if !status.is_success() {
        return Err(status_error(provider, status, text));
    }
    let value: Value = serde_json::from_str(text)
        .map_err(|e| Error::malformed(provider, format!("invalid JSON payload: {e}")))?;
    check_envelope(provider, &value)?;
    Ok(value)
}

fn status_error(provider: &'static str, status: StatusCode, text: &str) -> Error {
    let message = serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|value| envelope(&value).map(envelope_message))
        .unwrap_or_else(|| {
            let snippet: String = text.trim().chars().take(200).collect();
            if snippet.is_empty() {
                status.canonical_reason().unwrap_or("unknown status").to_owned()
            } else {
                snippet
            }
        });
    Error::transport(provider, Some(status.as_u16()), message)
}

/// Map a `reqwest` error without its URL, which may carry a query key.
fn transport_error(provider: &'static str, e: reqwest::Error) -> Error {
    let status = e.status().map(|s| s.as_u16());
    Error::transport(provider, status, e.without_url().to_string())
}

fn retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn block_end(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|window| window == b"\n\n")
}

/// Parse a single SSE block (may contain `event:` and `data:` lines).
fn parse_block(provider: &'static str, block: &str) -> Result<Option<Value>> {
    let data = block
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect::<Vec<_>>()
        .join("\n");
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }

    tracing::trace!("chunk: {data}");
    let value: Value = serde_json::from_str(data)
        .map_err(|e| Error::malformed(provider, format!("invalid stream fragment: {e}")))?;
    check_envelope(provider, &value)?;
    Ok(Some(value))
}
