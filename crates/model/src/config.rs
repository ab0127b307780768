//! Gateway configuration loaded from TOML.
//!
//! Providers are listed as ordered `[[providers]]` entries discriminated by
//! the `provider` field, so the registry order is the file order:
//!
//! ```toml
//! [[providers]]
//! provider = "gemini"
//! api_key = "${GEMINI_API_KEY}"
//!
//! [http]
//! timeout_secs = 30
//! ```

use crate::http::Retry;
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, time::Duration};
use tcore::{Error, ProviderTag, Result};

/// Config directory name under the platform config dir.
pub const CONFIG_DIR: &str = "tally";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Default `HTTP-Referer` sent to OpenRouter.
pub const DEFAULT_SITE_URL: &str = "https://tally.finance";

/// Default `X-Title` sent to OpenRouter.
pub const DEFAULT_APP_NAME: &str = "Tally";

/// Top-level gateway configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Provider entries in registration order.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    /// Shared HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
}

impl GatewayConfig {
    /// The default config file, `~/.config/tally/config.toml` on unix.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Parse a TOML document after expanding `${VAR}` references in it.
    pub fn from_toml(toml: &str) -> Result<Self> {
        toml::from_str(&expand_env_vars(toml))
            .map_err(|e| Error::Config(format!("invalid config: {e}")))
    }

    /// Load the config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let toml = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml(&toml)
    }

    /// Build the default OpenAI, Gemini, OpenRouter setup from the
    /// environment. Providers whose key variable is unset stay unconfigured.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        let optional = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            providers: vec![
                ProviderConfig::OpenAI(RemoteConfig {
                    api_key: var("OPENAI_API_KEY"),
                    base_url: None,
                }),
                ProviderConfig::Gemini(RemoteConfig {
                    api_key: var("GEMINI_API_KEY"),
                    base_url: None,
                }),
                ProviderConfig::OpenRouter(OpenRouterConfig {
                    api_key: var("OPENROUTER_API_KEY"),
                    base_url: None,
                    site_url: optional("OPENROUTER_SITE_URL"),
                    app_name: optional("OPENROUTER_APP_NAME"),
                }),
            ],
            http: HttpConfig::default(),
        }
    }
}

/// Provider-specific configuration, discriminated by the `provider` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// OpenAI chat completions.
    #[serde(rename = "openai")]
    OpenAI(RemoteConfig),
    /// Google Gemini.
    Gemini(RemoteConfig),
    /// OpenRouter.
    #[serde(rename = "openrouter")]
    OpenRouter(OpenRouterConfig),
}

impl ProviderConfig {
    /// The backend family of this entry.
    pub fn tag(&self) -> ProviderTag {
        match self {
            Self::OpenAI(_) => ProviderTag::OpenAI,
            Self::Gemini(_) => ProviderTag::Gemini,
            Self::OpenRouter(_) => ProviderTag::OpenRouter,
        }
    }

    /// The API key.
    pub fn api_key(&self) -> &str {
        match self {
            Self::OpenAI(c) | Self::Gemini(c) => &c.api_key,
            Self::OpenRouter(c) => &c.api_key,
        }
    }

    /// The endpoint override, if any.
    pub fn base_url(&self) -> Option<&str> {
        match self {
            Self::OpenAI(c) | Self::Gemini(c) => c.base_url.as_deref(),
            Self::OpenRouter(c) => c.base_url.as_deref(),
        }
    }

    /// Whether the entry carries a credential. Entries without one are
    /// skipped by the registry.
    pub fn is_configured(&self) -> bool {
        !self.api_key().trim().is_empty()
    }
}

/// Configuration for a remote API provider.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// API key (supports `${ENV_VAR}` expansion).
    #[serde(default)]
    pub api_key: String,
    /// Optional endpoint override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Configuration for OpenRouter.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// API key (supports `${ENV_VAR}` expansion).
    #[serde(default)]
    pub api_key: String,
    /// Optional endpoint override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Sent as `HTTP-Referer`. Defaults to [`DEFAULT_SITE_URL`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,
    /// Sent as `X-Title`. Defaults to [`DEFAULT_APP_NAME`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
}

/// Shared HTTP client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout, streaming included.
    pub timeout_secs: u64,
    /// Retries for non-streaming calls.
    pub max_retries: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

impl HttpConfig {
    /// The request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The retry policy for non-streaming calls.
    pub fn retry(&self) -> Retry {
        Retry {
            max_retries: self.max_retries,
            ..Retry::default()
        }
    }
}

/// Replace every `${VAR}` in `input` with the value of `VAR`.
///
/// Unset variables expand to nothing. An unterminated `${` is kept as is.
pub fn expand_env_vars(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        output.push_str(&rest[..start]);
        let name = &rest[start + 2..start + 2 + len];
        output.push_str(&std::env::var(name).unwrap_or_default());
        rest = &rest[start + 3 + len..];
    }
    output.push_str(rest);
    output
}
