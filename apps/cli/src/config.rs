//! Configuration for the CLI

use anyhow::{Context, Result, bail};
use model::{GatewayConfig, HttpConfig, OpenRouterConfig, ProviderConfig, RemoteConfig};
use std::path::Path;

/// Load the gateway config.
///
/// An explicit path must exist. Otherwise the default config file is used
/// when present, and provider keys are read from the environment when not.
pub fn load(path: Option<&Path>) -> Result<GatewayConfig> {
    if let Some(path) = path {
        return Ok(GatewayConfig::load(path)?);
    }

    match GatewayConfig::default_path() {
        Some(path) if path.exists() => {
            tracing::debug!("loading config from {}", path.display());
            Ok(GatewayConfig::load(&path)?)
        }
        _ => {
            tracing::debug!("no config file, reading provider keys from the environment");
            Ok(GatewayConfig::from_env())
        }
    }
}

/// A config that reads every key from its usual environment variable.
pub fn template() -> GatewayConfig {
    let remote = |var: &str| RemoteConfig {
        api_key: format!("${{{var}}}"),
        base_url: None,
    };
    GatewayConfig {
        providers: vec![
            ProviderConfig::OpenAI(remote("OPENAI_API_KEY")),
            ProviderConfig::Gemini(remote("GEMINI_API_KEY")),
            ProviderConfig::OpenRouter(OpenRouterConfig {
                api_key: "${OPENROUTER_API_KEY}".into(),
                ..Default::default()
            }),
        ],
        http: HttpConfig::default(),
    }
}

/// Write [`template`] to the default config path. Never overwrites.
pub fn generate() -> Result<()> {
    let path = GatewayConfig::default_path().context("no config directory on this platform")?;
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&path, toml::to_string(&template())?)?;
    tracing::info!("configuration saved to {}", path.display());
    Ok(())
}
