//! Selectable models across the registry.

use crate::registry::Registry;
use compact_str::CompactString;
use tcore::{Adapter, ModelOption};

/// Model used when no provider is configured.
pub const FALLBACK_MODEL: &str = "gpt-4.1";

/// Snapshot of every model the registry can serve.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    options: Vec<ModelOption>,
}

impl ModelCatalog {
    /// Collect the options of every present adapter, in registration then
    /// table order.
    pub fn new<A: Adapter>(registry: &Registry<A>) -> Self {
        Self {
            options: registry
                .adapters()
                .flat_map(|adapter| adapter.model_options())
                .collect(),
        }
    }

    /// All selectable models.
    pub fn available(&self) -> &[ModelOption] {
        &self.options
    }

    /// Whether no model is selectable.
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// The first available model, or [`FALLBACK_MODEL`].
    pub fn default_model(&self) -> CompactString {
        self.options
            .first()
            .map(|option| option.id.clone())
            .unwrap_or_else(|| FALLBACK_MODEL.into())
    }

    /// The display name of `model`, or a title-cased rendering of its id
    /// when it is not in the catalog.
    pub fn display_name(&self, model: &str) -> String {
        self.options
            .iter()
            .find(|option| option.id == model)
            .map(|option| option.name.to_string())
            .unwrap_or_else(|| titleize(model))
    }
}

/// `gpt-4o-mini` -> `Gpt 4o Mini`.
fn titleize(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    let mut word_start = true;
    for ch in id.chars() {
        let ch = if matches!(ch, '-' | '_') { ' ' } else { ch };
        if word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        word_start = matches!(ch, ' ' | '/');
    }
    out
}
