//! Error taxonomy shared by every provider adapter and the chat runtime.

/// Result alias used across the gateway.
pub type Result<T> = std::result::Result<T, Error>;

/// A typed gateway failure.
///
/// Adapters map transport and decoding errors into these variants before
/// they leave the adapter, so callers never see raw `reqwest` or
/// `serde_json` errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request names a model the adapter does not serve.
    #[error("model '{model}' is not supported by {provider}")]
    ModelUnsupported {
        /// Adapter that rejected the model.
        provider: &'static str,
        /// Requested model identifier.
        model: String,
    },

    /// No registered adapter serves the requested model.
    #[error(
        "no provider supports AI model: {model}. Supported models: {}",
        .supported.join(", ")
    )]
    NoProviderForModel {
        /// Requested model identifier.
        model: String,
        /// Every model currently served by the registry.
        supported: Vec<String>,
    },

    /// A batch operation was given more items than it accepts.
    #[error("too many transactions to {operation}: got {count}, max is {max} per request")]
    TooManyItems {
        /// The batch operation, e.g. `auto-categorize`.
        operation: &'static str,
        /// Number of items supplied.
        count: usize,
        /// Hard cap.
        max: usize,
    },

    /// The backend answered without any candidate output.
    #[error("{provider} returned no candidates")]
    NoCandidates {
        /// Adapter that received the payload.
        provider: &'static str,
    },

    /// The backend answered with neither text nor function calls.
    #[error("{provider} returned an empty response")]
    EmptyResponse {
        /// Adapter that received the payload.
        provider: &'static str,
    },

    /// Backend output could not be projected into the expected structure.
    #[error("{provider} returned malformed output: {message}")]
    MalformedProviderOutput {
        /// Adapter that received the payload.
        provider: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// Network or HTTP-level failure, including provider error envelopes.
    #[error("{provider} request failed{}: {message}", http_status(.status))]
    TransportFailure {
        /// Adapter that issued the request.
        provider: &'static str,
        /// HTTP status, when the server answered at all.
        status: Option<u16>,
        /// Transport or provider-reported message.
        message: String,
    },

    /// The caller built a request or message that can never succeed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The message store rejected or failed a mutation.
    #[error("store error: {0}")]
    Store(String),

    /// Configuration could not be loaded or applied.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a [`Error::MalformedProviderOutput`].
    pub fn malformed(provider: &'static str, message: impl Into<String>) -> Self {
        Self::MalformedProviderOutput {
            provider,
            message: message.into(),
        }
    }

    /// Build a [`Error::TransportFailure`].
    pub fn transport(
        provider: &'static str,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::TransportFailure {
            provider,
            status,
            message: message.into(),
        }
    }

    /// Whether the error was reported by (or on the way to) the backend,
    /// as opposed to a caller or configuration mistake.
    pub fn is_backend(&self) -> bool {
        matches!(
            self,
            Self::NoCandidates { .. }
                | Self::EmptyResponse { .. }
                | Self::MalformedProviderOutput { .. }
                | Self::TransportFailure { .. }
        )
    }
}

fn http_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (HTTP {code})"),
        None => String::new(),
    }
}
