//! Error taxonomy for a deployment run.

use std::{path::PathBuf, time::Duration};

use alloy_core::primitives::TxHash;

/// Errors raised by a [`ChainClient`](crate::ChainClient) implementation.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// The endpoint could not be reached or the HTTP exchange failed.
    #[error("transport error calling {method}: {message}")]
    Transport { method: String, message: String },
    /// The node answered with a JSON-RPC error object.
    #[error("{method} rejected by node (code {code}): {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },
    /// The node answered, but not with something we can decode.
    #[error("invalid {method} response: {message}")]
    InvalidResponse { method: String, message: String },
    /// The signer refused or failed to sign.
    #[error("failed to sign transaction: {0}")]
    Signing(String),
}

/// Errors raised while resolving a compiled contract artifact.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("no artifact named {name} under {}", .root.display())]
    NotFound { name: String, root: PathBuf },
    #[error("artifact name {name} is ambiguous: {}", join_paths(.paths))]
    Ambiguous { name: String, paths: Vec<PathBuf> },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse artifact {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Interfaces and abstract contracts compile to empty bytecode.
    #[error("artifact {name} has no deployable bytecode")]
    NotDeployable { name: String },
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors that abort a deployment run.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Fee data or receipt queries could not reach the network.
    #[error("network error while {action}")]
    Network {
        action: String,
        #[source]
        source: ChainError,
    },
    /// The network rejected the creation transaction before inclusion.
    #[error("{contract} deployment transaction rejected")]
    Submission {
        contract: String,
        #[source]
        source: ChainError,
    },
    /// No receipt observed within the configured wait budget.
    #[error("{contract} deployment {tx_hash} not mined within {}s", .waited.as_secs())]
    ConfirmationTimeout {
        contract: String,
        tx_hash: TxHash,
        waited: Duration,
    },
    /// The creation transaction was mined but its execution failed.
    #[error("{contract} deployment {tx_hash} reverted")]
    TransactionReverted { contract: String, tx_hash: TxHash },
    /// The receipt reports success but carries no contract address.
    #[error("{contract} deployment {tx_hash} mined without a contract address")]
    MissingContractAddress { contract: String, tx_hash: TxHash },
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("invalid constructor arguments for {contract}: {message}")]
    ConstructorArgs { contract: String, message: String },
    #[error("signer failed for {contract}: {message}")]
    Signer { contract: String, message: String },
}

impl DeployError {
    /// The transaction hash involved in the failure, if one was ever broadcast.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            Self::ConfirmationTimeout { tx_hash, .. }
            | Self::TransactionReverted { tx_hash, .. }
            | Self::MissingContractAddress { tx_hash, .. } => Some(*tx_hash),
            _ => None,
        }
    }
}
