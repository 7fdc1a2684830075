use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;

use crate::ethereum::{
    confirmation::ConfirmationPolicy,
    params::TxOptions,
    provider::{self, Transport},
    utils,
};

pub const RPC_URL_ENV: &str = "COMDAO_RPC_URL";
pub const PRIVATE_KEY_ENV: &str = "COMDAO_PRIVATE_KEY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Network record to use. Detected from the node when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcConfig {
    pub host: String,
    pub port: u16,
    /// Full endpoint URL; takes precedence over host and port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Signs locally when set, otherwise the node's unlocked accounts are used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8545,
            url: None,
            private_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Zero waits forever.
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub extended_results: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 240_000,
            poll_interval_ms: 1000,
            extended_results: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
    /// Wei, decimal or `0x` hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    /// Wei, decimal or `0x` hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {:?}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {:?}: {}", path, e))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    anyhow!("Failed to create config directory {:?}: {}", parent, e)
                })?;
            }
        }

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {:?}: {}", path, e))?;

        Ok(())
    }

    /// Load configuration with fallback to default
    pub async fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Self {
        let mut config = match path {
            Some(path) => match Self::load_from_file(path).await {
                Ok(config) => {
                    tracing::info!("Loaded configuration from file");
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to load config file, using defaults: {}", e);
                    Self::default()
                }
            },
            None => Self::default(),
        };

        config.apply_env_vars();
        config
    }

    fn apply_env_vars(&mut self) {
        self.apply_overrides(
            std::env::var(RPC_URL_ENV).ok(),
            std::env::var(PRIVATE_KEY_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, rpc_url: Option<String>, private_key: Option<String>) {
        if let Some(url) = rpc_url.filter(|url| !url.trim().is_empty()) {
            tracing::debug!("Using {} for the RPC endpoint", RPC_URL_ENV);
            self.rpc.url = Some(url);
        }
        if let Some(key) = private_key.filter(|key| !key.trim().is_empty()) {
            tracing::debug!("{} found, transactions will be signed locally", PRIVATE_KEY_ENV);
            self.rpc.private_key = Some(key);
        }
    }

    pub fn rpc_url(&self) -> String {
        match &self.rpc.url {
            Some(url) => url.clone(),
            None => format!("http://{}:{}", self.rpc.host, self.rpc.port),
        }
    }

    pub fn confirmation_policy(&self) -> ConfirmationPolicy {
        ConfirmationPolicy {
            timeout: Duration::from_millis(self.sync.timeout_ms),
            poll_interval: Duration::from_millis(self.sync.poll_interval_ms),
            extended: self.sync.extended_results,
        }
    }

    /// Class-level call options from the `[defaults]` table.
    pub fn default_options(&self) -> Result<TxOptions> {
        let mut options = TxOptions::new();
        if let Some(from) = &self.defaults.from {
            options.from = Some(
                utils::validate_address(from)
                    .map_err(|e| anyhow!("Invalid defaults.from: {}", e))?,
            );
        }
        options.gas = self.defaults.gas;
        if let Some(gas_price) = &self.defaults.gas_price {
            let gas_price = utils::validate_hex_value(gas_price)?;
            options.gas_price = Some(
                gas_price
                    .try_into()
                    .map_err(|_| anyhow!("defaults.gas_price is too large"))?,
            );
        }
        if let Some(value) = &self.defaults.value {
            options.value = Some(utils::validate_hex_value(value)?);
        }
        Ok(options)
    }

    /// Opens the configured endpoint.
    pub fn connect(&self) -> Result<Arc<dyn Transport>> {
        let url = self.rpc_url();
        match &self.rpc.private_key {
            Some(key) => provider::connect_with_signer(&url, key),
            None => provider::connect_http(&url),
        }
    }

    /// Get default config file path
    pub fn default_config_path() -> Result<std::path::PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("comdao-bindings").join("config.toml"))
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let sample_config = r#"# ComDAO bindings configuration

# Network record to use ("default", "live", or a network id).
# Leave unset to detect it from the connected node.
# network = "default"

[rpc]
host = "localhost"
port = 8545
# url = "http://localhost:8545"   # overrides host and port

[sync]
timeout_ms = 240000       # 0 waits forever
poll_interval_ms = 1000
extended_results = false  # return receipt and decoded events with each transaction

[defaults]
# from = "0x0000000000000000000000000000000000000000"
gas = 4712388
# gas_price = "100000000000"
# value = "0"

# Environment variables that can be used:
# COMDAO_RPC_URL - RPC endpoint, overrides [rpc]
# COMDAO_PRIVATE_KEY - sign transactions locally with this key
"#;
        sample_config.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, U256};

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.rpc_url(), "http://localhost:8545");
        assert_eq!(config.network, None);

        let policy = config.confirmation_policy();
        assert_eq!(policy, ConfirmationPolicy::default());
        assert!(config.default_options().unwrap().is_empty());
    }

    #[test]
    fn test_sample_parses() {
        let config: Config = toml::from_str(&Config::generate_sample()).unwrap();
        assert_eq!(config.rpc.port, 8545);
        assert_eq!(config.sync.timeout_ms, 240_000);
        assert_eq!(config.defaults.gas, Some(4_712_388));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            network = "live"

            [sync]
            timeout_ms = 0
            poll_interval_ms = 500
            extended_results = true

            [defaults]
            from = "0x1111111111111111111111111111111111111111"
            gas_price = "0x10"
            "#,
        )
        .unwrap();

        assert_eq!(config.rpc, RpcConfig::default());
        assert_eq!(config.network.as_deref(), Some("live"));

        let policy = config.confirmation_policy();
        assert!(policy.timeout.is_zero());
        assert_eq!(policy.poll_interval, Duration::from_millis(500));
        assert!(policy.extended);

        let options = config.default_options().unwrap();
        assert_eq!(options.from, Some(Address::repeat_byte(0x11)));
        assert_eq!(options.gas_price, Some(16));
        assert_eq!(options.value, None);
    }

    #[test]
    fn test_invalid_default_sender() {
        let mut config = Config::default();
        config.defaults.from = Some("0xabc".to_string());
        assert!(config.default_options().is_err());

        config.defaults.from = None;
        config.defaults.value = Some("1000000000000000000".to_string());
        assert_eq!(
            config.default_options().unwrap().value,
            Some(U256::from(1_000_000_000_000_000_000u64))
        );
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        config.apply_overrides(Some("http://node:8545".to_string()), Some(String::new()));
        assert_eq!(config.rpc_url(), "http://node:8545");
        assert_eq!(config.rpc.private_key, None);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.network = Some("default".to_string());
        config.sync.extended_results = true;
        config.defaults.gas = Some(90_000);
        config.save_to_file(&path).await.unwrap();

        let loaded = Config::load_from_file(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_load_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(Some(dir.path().join("absent.toml"))).await;
        assert_eq!(config.sync, SyncConfig::default());
    }
}
