//! Provider adapters for the Tally LLM gateway.
//!
//! One adapter per backend (OpenAI, Gemini, OpenRouter), all speaking the
//! canonical protocol from `tally-core`. [`Provider`] dispatches over them,
//! [`Registry`] resolves which one serves a model and [`ModelCatalog`]
//! aggregates what can be picked.

pub use {
    catalog::{FALLBACK_MODEL, ModelCatalog},
    config::{GatewayConfig, HttpConfig, OpenRouterConfig, ProviderConfig, RemoteConfig},
    gemini::Gemini,
    http::Retry,
    openai::OpenAI,
    openrouter::OpenRouter,
    provider::{Provider, build_client, build_provider},
    registry::Registry,
};

mod catalog;
pub mod config;
pub mod gemini;
mod http;
pub mod openai;
pub mod openrouter;
mod provider;
mod registry;
