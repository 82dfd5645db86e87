//! starkdeploy-core - deploys the Starknet core contract and its proxy to an
//! Ethereum-compatible network.
//!
//! A run estimates fees once, then submits each contract-creation transaction in a fixed
//! order, waiting for each to be mined before moving on.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use starkdeploy_core::{
//!     DeployContext, DeploymentSequencer, HardhatArtifacts, JsonRpcClient, PrivateKeyAccount,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = JsonRpcClient::connect(
//!     "http://127.0.0.1:8545".parse()?,
//!     Some(1337),
//!     Duration::from_secs(2),
//! )
//! .await?;
//! let signer: PrivateKeyAccount =
//!     "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".parse()?;
//! let artifacts = HardhatArtifacts::new("artifacts");
//!
//! let ctx = DeployContext { client: &client, signer: &signer, artifacts: &artifacts };
//! let deployed = DeploymentSequencer::new(ctx, None).run().await?;
//! # Ok(())
//! # }
//! ```

mod artifacts;
mod config;
mod deployer;
mod error;
mod fee;
mod rpc;
mod sequencer;
mod signer;

pub use artifacts::{ArtifactSource, ContractArtifact, HardhatArtifacts};
pub use config::{
    ConfigOverrides, DEFAULT_ARTIFACTS_DIR, DeployConfig, HARDHAT_RPC_URL, Network,
};
pub use deployer::{
    ContractDeployer, DeployContext, DeployedContract, DeploymentSpec, DeploymentStatus,
    PROXY_CONSTRUCTOR_DELAY,
};
pub use error::{ArtifactError, ChainError, DeployError};
pub use fee::{
    DEFAULT_PRIORITY_FEE_PER_GAS, DEPLOY_GAS_LIMIT, FEE_MULTIPLIER_DENOMINATOR,
    FEE_MULTIPLIER_NUMERATOR, FeeData, FeeParameters, estimate_fee,
};
pub use rpc::{
    ChainClient, ContractCreation, DEFAULT_POLL_INTERVAL, JsonRpcClient, ReceiptStatus,
    TransactionReceipt,
};
pub use sequencer::{DeploymentSequencer, SequencerState};
pub use signer::{AccountSigner, PrivateKeyAccount};

// Re-exported so callers can build specs and receipts without depending on alloy directly.
pub use alloy_consensus::TxEip1559;
pub use alloy_core::{
    dyn_abi::DynSolValue,
    primitives::{Address, Bytes, TxHash, U256},
};
