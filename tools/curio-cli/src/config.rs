//! CLI configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use curio_gateway::GatewayConfig;
use serde::{Deserialize, Serialize};

/// CLI configuration file (`curio.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Store configuration file, relative to this file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<PathBuf>,

    /// Payment gateway connection.
    #[serde(default)]
    pub gateway: GatewaySection,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: CliConfig = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?
        };

        if let (Some(store), Some(dir)) = (&config.store, path.parent()) {
            if store.is_relative() {
                config.store = Some(dir.join(store));
            }
        }
        Ok(config)
    }

    /// Save config to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }
}

/// Gateway connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySection {
    /// Base URL of the payment gateway API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Total request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_key_env() -> String {
    "CURIO_GATEWAY_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            url: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GatewaySection {
    /// Build the adapter config, reading the API key from the environment.
    pub fn to_gateway_config(&self) -> Option<GatewayConfig> {
        let url = self.url.as_ref()?;
        let mut config =
            GatewayConfig::new(url.clone()).with_timeout(Duration::from_secs(self.timeout_secs));
        if let Ok(key) = std::env::var(&self.api_key_env) {
            if !key.is_empty() {
                config = config.with_api_key(key);
            }
        }
        Some(config)
    }
}

/// Generate a default curio.toml config file.
pub fn generate_default_config() -> String {
    r#"# Curio CLI configuration

# Store configuration (currency, shipping tiers, tax tables, launches).
store = "store.toml"

[gateway]
# url = "https://payments.example.com/v1"
api_key_env = "CURIO_GATEWAY_KEY"
timeout_secs = 30
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config: CliConfig = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.store, Some(PathBuf::from("store.toml")));
        assert!(config.gateway.url.is_none());
        assert_eq!(config.gateway.timeout_secs, 30);
    }

    #[test]
    fn test_gateway_requires_url() {
        assert!(GatewaySection::default().to_gateway_config().is_none());

        let section = GatewaySection {
            url: Some("https://payments.example.com".into()),
            api_key_env: "CURIO_TEST_UNSET_KEY".into(),
            timeout_secs: 8,
        };
        let config = section.to_gateway_config().unwrap();
        assert_eq!(config.total, Duration::from_secs(8));
        assert!(config.api_key.is_none());
    }
}
