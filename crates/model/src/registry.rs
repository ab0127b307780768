//! Provider registry for the chat capability.

use crate::{
    config::GatewayConfig,
    provider::{Provider, build_client, build_provider},
};
use tcore::{Adapter, Error, Result};

/// The configured adapters, in registration order.
///
/// Slots are optional: a backend without a credential occupies an empty
/// slot and is never consulted. Read-only after construction; share it
/// behind an `Arc`.
pub struct Registry<A: Adapter = Provider> {
    slots: Vec<Option<A>>,
}

impl<A: Adapter> Registry<A> {
    /// Create a registry from slots in registration order.
    pub fn new(slots: Vec<Option<A>>) -> Self {
        Self { slots }
    }

    /// The present adapters, in registration order.
    pub fn adapters(&self) -> impl Iterator<Item = &A> {
        self.slots.iter().flatten()
    }

    /// Whether no adapter is present.
    pub fn is_empty(&self) -> bool {
        self.adapters().next().is_none()
    }

    /// The first adapter, in registration order, that serves `model`.
    pub fn provider_for(&self, model: &str) -> Result<&A> {
        self.adapters()
            .find(|adapter| adapter.supports_model(model))
            .ok_or_else(|| Error::NoProviderForModel {
                model: model.to_owned(),
                supported: self.supported_models(),
            })
    }

    /// Whether any adapter serves `model`.
    pub fn supports_model(&self, model: &str) -> bool {
        self.adapters().any(|adapter| adapter.supports_model(model))
    }

    /// Every served model id, in registration then table order.
    pub fn supported_models(&self) -> Vec<String> {
        self.adapters()
            .flat_map(|adapter| adapter.model_options())
            .map(|option| option.id.into_string())
            .collect()
    }
}

impl Registry<Provider> {
    /// Build the registry from config, in config order.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let client = build_client(&config.http)?;
        let retry = config.http.retry();
        let slots = config
            .providers
            .iter()
            .map(|provider| build_provider(provider, client.clone(), retry))
            .collect::<Result<Vec<_>>>()?;

        let registry = Self::new(slots);
        tracing::info!(
            "registered providers: [{}]",
            registry
                .adapters()
                .map(Adapter::name)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(registry)
    }
}
