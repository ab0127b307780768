//! Batch enrichment commands

use anyhow::{Context, Result, bail};
use clap::Args;
use model::{Provider, Registry};
use std::path::PathBuf;
use tcore::{Adapter, EnrichTransaction, ProviderTag};

/// Batch enrichment arguments
#[derive(Debug, Args)]
pub struct EnrichCmd {
    /// JSON file with an array of `{id, name, amount, merchant?}` objects
    pub transactions: PathBuf,

    /// A category or known merchant to choose from (repeatable)
    #[arg(short, long = "option")]
    pub options: Vec<String>,

    /// The provider to ask (defaults to the first configured one)
    #[arg(short, long)]
    pub provider: Option<String>,
}

impl EnrichCmd {
    /// Suggest a category per transaction.
    pub async fn categorize(&self, registry: &Registry) -> Result<()> {
        let transactions = self.transactions()?;
        let suggestions = self
            .adapter(registry)?
            .auto_categorize(&transactions, &self.options)
            .await?;
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
        Ok(())
    }

    /// Detect the merchant per transaction.
    pub async fn detect_merchants(&self, registry: &Registry) -> Result<()> {
        let transactions = self.transactions()?;
        let suggestions = self
            .adapter(registry)?
            .auto_detect_merchants(&transactions, &self.options)
            .await?;
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
        Ok(())
    }

    fn transactions(&self) -> Result<Vec<EnrichTransaction>> {
        let json = std::fs::read_to_string(&self.transactions)
            .with_context(|| format!("failed to read {}", self.transactions.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("{} is not a transaction array", self.transactions.display()))
    }

    fn adapter<'r>(&self, registry: &'r Registry) -> Result<&'r Provider> {
        let mut adapters = registry.adapters();
        let Some(name) = &self.provider else {
            return adapters.next().context("no provider configured");
        };

        let tag = [ProviderTag::OpenAI, ProviderTag::Gemini, ProviderTag::OpenRouter]
            .into_iter()
            .find(|tag| tag.as_str() == name.to_lowercase())
            .with_context(|| format!("unknown provider {name}"))?;
        match adapters.find(|adapter| adapter.tag() == tag) {
            Some(adapter) => Ok(adapter),
            None => bail!("provider {name} is not configured"),
        }
    }
}
