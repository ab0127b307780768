//! Tests for CLI config loading.

use model::{GatewayConfig, ProviderConfig};
use tally_cli::config;

#[test]
fn template_reads_keys_from_the_environment() {
    let toml = toml::to_string(&config::template()).unwrap();
    assert!(toml.contains(r#"provider = "openai""#), "{toml}");
    assert!(toml.contains(r#"api_key = "${OPENAI_API_KEY}""#), "{toml}");
    assert!(toml.contains(r#"provider = "openrouter""#), "{toml}");

    let parsed: GatewayConfig = toml::from_str(&toml).unwrap();
    assert_eq!(parsed, config::template());
}

#[test]
fn explicit_path_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[[providers]]
provider = "gemini"
api_key = "test-key"

[http]
timeout_secs = 5
"#,
    )
    .unwrap();

    let loaded = config::load(Some(&path)).unwrap();
    assert_eq!(loaded.http.timeout_secs, 5);
    match &loaded.providers[..] {
        [ProviderConfig::Gemini(gemini)] => assert_eq!(gemini.api_key, "test-key"),
        other => panic!("unexpected providers: {other:?}"),
    }
}

#[test]
fn missing_explicit_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(config::load(Some(&dir.path().join("missing.toml"))).is_err());
}
