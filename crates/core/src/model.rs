//! Selectable model descriptors.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The backend family a model belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderTag {
    /// OpenAI chat completions.
    #[serde(rename = "openai")]
    OpenAI,
    /// Google Gemini.
    Gemini,
    /// OpenRouter.
    #[serde(rename = "openrouter")]
    OpenRouter,
}

impl ProviderTag {
    /// The lowercase tag, as used in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Gemini => "gemini",
            Self::OpenRouter => "openrouter",
        }
    }
}

impl fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A model a user can pick, as advertised by an adapter.
///
/// Presentation only: dispatch always goes through the registry's
/// `supports_model` scan, never through this descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelOption {
    /// Model identifier sent to the backend.
    pub id: CompactString,

    /// Human-readable name.
    pub name: CompactString,

    /// The owning provider.
    pub provider: ProviderTag,
}

impl ModelOption {
    /// Create a new option.
    pub fn new(
        id: impl Into<CompactString>,
        name: impl Into<CompactString>,
        provider: ProviderTag,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            provider,
        }
    }
}
