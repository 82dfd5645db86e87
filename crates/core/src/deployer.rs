//! Single-contract deployment: submit a creation transaction, then wait for it to be mined.

use std::time::Duration;

use alloy_core::{
    dyn_abi::DynSolValue,
    primitives::{Address, TxHash, U256},
};

use crate::{
    ArtifactSource, ChainClient, ChainError, ContractCreation, DeployError, FeeParameters,
    ReceiptStatus, signer::AccountSigner,
};

/// Delay argument passed to the `Proxy` constructor.
pub const PROXY_CONSTRUCTOR_DELAY: u64 = 1000;

/// Collaborators of a deployment run, passed explicitly to every component.
pub struct DeployContext<'a, C, S, A> {
    pub client: &'a C,
    pub signer: &'a S,
    pub artifacts: &'a A,
}

impl<C, S, A> Clone for DeployContext<'_, C, S, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, S, A> Copy for DeployContext<'_, C, S, A> {}

/// Which artifact to instantiate, and with what constructor arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentSpec {
    pub contract: String,
    pub constructor_args: Vec<DynSolValue>,
}

impl DeploymentSpec {
    pub fn new(contract: impl Into<String>, constructor_args: Vec<DynSolValue>) -> Self {
        Self {
            contract: contract.into(),
            constructor_args,
        }
    }

    /// The core contract, deployed without constructor arguments.
    pub fn starknet() -> Self {
        Self::new("Starknet", vec![])
    }

    /// The proxy, deployed with a single `uint256` constructor argument.
    pub fn proxy() -> Self {
        Self::new(
            "Proxy",
            vec![DynSolValue::Uint(U256::from(PROXY_CONSTRUCTOR_DELAY), 256)],
        )
    }
}

/// Lifecycle of a submitted deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum DeploymentStatus {
    Pending,
    Confirmed,
    Failed,
}

/// A contract-creation transaction and what became of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    pub contract: String,
    pub transaction_hash: TxHash,
    /// Set once the receipt is observed.
    pub address: Option<Address>,
    pub status: DeploymentStatus,
}

/// Deploys one contract at a time.
pub struct ContractDeployer<'a, C, S, A> {
    ctx: DeployContext<'a, C, S, A>,
    confirmation_timeout: Option<Duration>,
}

impl<'a, C, S, A> ContractDeployer<'a, C, S, A>
where
    C: ChainClient + Sync,
    S: AccountSigner + Sync,
    A: ArtifactSource,
{
    /// Create a deployer. Without a `confirmation_timeout` confirmation waits are unbounded.
    pub fn new(ctx: DeployContext<'a, C, S, A>, confirmation_timeout: Option<Duration>) -> Self {
        Self {
            ctx,
            confirmation_timeout,
        }
    }

    /// Submit and confirm `spec`.
    pub async fn deploy(
        &self,
        spec: &DeploymentSpec,
        fee: &FeeParameters,
    ) -> Result<DeployedContract, DeployError> {
        let mut deployment = self.submit(spec, fee).await?;
        self.confirm(&mut deployment).await?;
        Ok(deployment)
    }

    /// Build, sign and broadcast the creation transaction for `spec`.
    ///
    /// Returns as soon as the node accepted the transaction, with status `Pending`.
    pub async fn submit(
        &self,
        spec: &DeploymentSpec,
        fee: &FeeParameters,
    ) -> Result<DeployedContract, DeployError> {
        let artifact = self.ctx.artifacts.artifact(&spec.contract)?;
        let creation = ContractCreation {
            constructor_args: artifact.encode_constructor(&spec.constructor_args)?,
            bytecode: artifact.bytecode,
        };

        let transaction_hash = self
            .ctx
            .client
            .submit_contract_creation(&creation, fee, self.ctx.signer)
            .await
            .map_err(|source| submission_error(&spec.contract, source))?;

        tracing::info!(tx_hash = %transaction_hash, "Deploy {} transaction submitted", spec.contract);

        Ok(DeployedContract {
            contract: spec.contract.clone(),
            transaction_hash,
            address: None,
            status: DeploymentStatus::Pending,
        })
    }

    /// Wait for a pending deployment to be mined.
    ///
    /// On success the deployment is `Confirmed` with its address; on any failure it is
    /// marked `Failed` and the error returned.
    pub async fn confirm(&self, deployment: &mut DeployedContract) -> Result<(), DeployError> {
        match self.await_address(deployment).await {
            Ok(address) => {
                deployment.address = Some(address);
                deployment.status = DeploymentStatus::Confirmed;
                tracing::info!(%address, "{} deployed", deployment.contract);
                Ok(())
            }
            Err(e) => {
                deployment.status = DeploymentStatus::Failed;
                Err(e)
            }
        }
    }

    async fn await_address(&self, deployment: &DeployedContract) -> Result<Address, DeployError> {
        let contract = &deployment.contract;
        let tx_hash = deployment.transaction_hash;

        let wait = self.ctx.client.wait_for_receipt(tx_hash);
        let receipt = match self.confirmation_timeout {
            Some(budget) => tokio::time::timeout(budget, wait).await.map_err(|_| {
                DeployError::ConfirmationTimeout {
                    contract: contract.clone(),
                    tx_hash,
                    waited: budget,
                }
            })?,
            None => wait.await,
        }
        .map_err(|source| DeployError::Network {
            action: format!("waiting for {contract} receipt"),
            source,
        })?;

        tracing::debug!(
            %contract,
            %tx_hash,
            block_number = ?receipt.block_number,
            gas_used = ?receipt.gas_used,
            "Receipt received"
        );

        match (receipt.status, receipt.contract_address) {
            (ReceiptStatus::Reverted, _) => Err(DeployError::TransactionReverted {
                contract: contract.clone(),
                tx_hash,
            }),
            (ReceiptStatus::Success, None) => Err(DeployError::MissingContractAddress {
                contract: contract.clone(),
                tx_hash,
            }),
            (ReceiptStatus::Success, Some(address)) => Ok(address),
        }
    }
}

/// A node answering with an error object rejected the transaction; anything else never
/// reached a verdict.
fn submission_error(contract: &str, source: ChainError) -> DeployError {
    match source {
        ChainError::Rpc { .. } => DeployError::Submission {
            contract: contract.to_string(),
            source,
        },
        ChainError::Signing(message) => DeployError::Signer {
            contract: contract.to_string(),
            message,
        },
        ChainError::Transport { .. } | ChainError::InvalidResponse { .. } => {
            DeployError::Network {
                action: format!("submitting {contract} deployment"),
                source,
            }
        }
    }
}
