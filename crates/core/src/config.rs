//! Deployment configuration: network endpoint, deployer key, artifact location.
//!
//! Values are layered with `figment`: built-in defaults, then an optional TOML file,
//! then overrides coming from the command line or environment.

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::rpc::DEFAULT_POLL_INTERVAL;

/// The default location of Hardhat build output.
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// Default RPC endpoint of a local Hardhat node.
pub const HARDHAT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Known target networks.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    Hardhat,
    Sepolia,
    Mainnet,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Hardhat => 1337,
            Network::Sepolia => 11155111,
            Network::Mainnet => 1,
        }
    }

    /// The endpoint to use when none is configured.
    pub fn default_rpc_url(&self) -> Option<&'static str> {
        match self {
            Network::Hardhat => Some(HARDHAT_RPC_URL),
            Network::Sepolia | Network::Mainnet => None,
        }
    }
}

/// Everything needed to run a deployment.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    /// JSON-RPC endpoint of the target network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<Url>,
    /// Hex private key of the deployer account.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    /// Hardhat `artifacts/` directory.
    pub artifacts_dir: PathBuf,
    /// When set, the endpoint's chain id must match this network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<Network>,
    /// Upper bound on each confirmation wait. Unbounded when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_timeout_secs: Option<u64>,
    /// Interval between receipt polls.
    pub poll_interval_ms: u64,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            private_key: None,
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
            network: None,
            confirmation_timeout_secs: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
        }
    }
}

impl fmt::Debug for DeployConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployConfig")
            .field("rpc_url", &self.rpc_url.as_ref().map(Url::as_str))
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("artifacts_dir", &self.artifacts_dir)
            .field("network", &self.network)
            .field("confirmation_timeout_secs", &self.confirmation_timeout_secs)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .finish()
    }
}

/// Values set on the command line or through the environment.
///
/// Unset fields leave lower layers untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<Network>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_ms: Option<u64>,
}

impl DeployConfig {
    /// Build the configuration from defaults, an optional TOML file and overrides.
    pub fn load(config_file: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(DeployConfig::default()));

        if let Some(path) = config_file {
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            figment = figment.merge(Toml::file(path));
            tracing::debug!(path = %path.display(), "Loading configuration file");
        }

        let config: Self = figment
            .merge(Serialized::defaults(overrides))
            .extract()
            .context("Failed to load deployment configuration")?;

        if config.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms must be greater than zero");
        }

        Ok(config)
    }

    /// The endpoint to deploy to, falling back to the network's default.
    pub fn resolved_rpc_url(&self) -> Result<Url> {
        if let Some(url) = &self.rpc_url {
            return Ok(url.clone());
        }

        let fallback = self
            .network
            .and_then(|n| n.default_rpc_url())
            .context("No RPC endpoint configured (set RPC_PROVIDER or --rpc-url)")?;
        Url::parse(fallback).context("Invalid default RPC URL")
    }

    pub fn private_key(&self) -> Result<&str> {
        self.private_key
            .as_deref()
            .context("No deployer key configured (set ADMIN_PRIVATE_KEY or --private-key)")
    }

    pub fn expected_chain_id(&self) -> Option<u64> {
        self.network.map(|n| n.chain_id())
    }

    pub fn confirmation_timeout(&self) -> Option<Duration> {
        self.confirmation_timeout_secs.map(Duration::from_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use tempdir::TempDir;

    #[test]
    fn test_defaults() {
        let config = DeployConfig::load(None, ConfigOverrides::default()).unwrap();
        assert_eq!(config.artifacts_dir, PathBuf::from("artifacts"));
        assert_eq!(config.poll_interval(), DEFAULT_POLL_INTERVAL);
        assert_eq!(config.confirmation_timeout(), None);
        assert!(config.private_key().is_err());
        assert!(config.resolved_rpc_url().is_err());
    }

    #[test]
    fn test_file_then_overrides() {
        let tmp = TempDir::new("starkdeploy-config").unwrap();
        let path = tmp.path().join("deploy.toml");
        std::fs::write(
            &path,
            r#"
rpc_url = "https://rpc.sepolia.example"
network = "sepolia"
confirmation_timeout_secs = 90
artifacts_dir = "build/artifacts"
"#,
        )
        .unwrap();

        let overrides = ConfigOverrides {
            confirmation_timeout_secs: Some(30),
            private_key: Some("0x01".to_string()),
            ..Default::default()
        };
        let config = DeployConfig::load(Some(&path), overrides).unwrap();

        assert_eq!(
            config.resolved_rpc_url().unwrap().as_str(),
            "https://rpc.sepolia.example/"
        );
        assert_eq!(config.network, Some(Network::Sepolia));
        assert_eq!(config.expected_chain_id(), Some(11155111));
        assert_eq!(config.confirmation_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.artifacts_dir, PathBuf::from("build/artifacts"));
        assert_eq!(config.private_key().unwrap(), "0x01");
    }

    #[test]
    fn test_missing_file() {
        let result = DeployConfig::load(
            Some(Path::new("/nonexistent/starkdeploy.toml")),
            ConfigOverrides::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let overrides = ConfigOverrides {
            poll_interval_ms: Some(0),
            ..Default::default()
        };
        let err = DeployConfig::load(None, overrides).unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"), "unexpected error: {err}");

        let overrides = ConfigOverrides {
            poll_interval_ms: Some(250),
            ..Default::default()
        };
        let config = DeployConfig::load(None, overrides).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_hardhat_default_endpoint() {
        let config = DeployConfig {
            network: Some(Network::Hardhat),
            ..Default::default()
        };
        assert_eq!(
            config.resolved_rpc_url().unwrap().as_str(),
            "http://127.0.0.1:8545/"
        );
        assert_eq!(config.expected_chain_id(), Some(1337));
    }

    #[test]
    fn test_network_parsing() {
        assert_eq!(Network::from_str("sepolia").unwrap(), Network::Sepolia);
        assert_eq!(Network::from_str("hardhat").unwrap(), Network::Hardhat);
        assert!(Network::from_str("goerli").is_err());
        assert_eq!(Network::Mainnet.to_string(), "mainnet");
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = DeployConfig {
            private_key: Some("0xdeadbeef".to_string()),
            ..Default::default()
        };
        assert!(!format!("{config:?}").contains("deadbeef"));
    }
}
