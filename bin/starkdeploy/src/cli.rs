use std::path::PathBuf;

use clap::Parser;
use starkdeploy_core::{ConfigOverrides, Network};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "starkdeploy")]
#[command(
    author,
    version,
    about = "Deploy the Starknet core contract and its proxy to an Ethereum network"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "STARKDEPLOY_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    /// JSON-RPC endpoint of the target network.
    #[arg(long, alias = "rpc", env = "RPC_PROVIDER")]
    pub rpc_url: Option<url::Url>,

    /// Hex private key of the deployer account.
    #[arg(long, env = "ADMIN_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// The target network (hardhat, sepolia, mainnet).
    ///
    /// When set, the endpoint must report this network's chain id.
    /// `hardhat` also defaults the endpoint to a local node.
    #[arg(long, env = "STARKDEPLOY_NETWORK")]
    pub network: Option<Network>,

    /// Path to the Hardhat artifacts directory.
    ///
    /// Defaults to ./artifacts
    #[arg(long, env = "STARKDEPLOY_ARTIFACTS")]
    pub artifacts: Option<PathBuf>,

    /// Maximum time to wait for each deployment to be mined, in seconds.
    ///
    /// If not provided, waits indefinitely.
    #[arg(long, env = "STARKDEPLOY_CONFIRMATION_TIMEOUT")]
    pub confirmation_timeout: Option<u64>,

    /// Interval between receipt polls, in milliseconds.
    #[arg(long, env = "STARKDEPLOY_POLL_INTERVAL")]
    pub poll_interval: Option<u64>,

    /// Path to a TOML configuration file.
    ///
    /// Command line arguments and environment variables take precedence over its values.
    #[arg(long, alias = "conf", env = "STARKDEPLOY_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// The configuration values set on the command line or through the environment.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            rpc_url: self.rpc_url.clone(),
            private_key: self.private_key.clone(),
            artifacts_dir: self.artifacts.clone(),
            network: self.network,
            confirmation_timeout_secs: self.confirmation_timeout,
            poll_interval_ms: self.poll_interval,
        }
    }
}
