//! Chain client: the network collaborator of a deployment run.
//!
//! [`ChainClient`] is the seam the orchestration talks through; [`JsonRpcClient`] is the
//! production implementation over Ethereum JSON-RPC.

use std::{future::Future, time::Duration};

use alloy_consensus::TxEip1559;
use alloy_core::primitives::{Address, Bytes, TxHash, TxKind, U256};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use serde_json::Value;
use url::Url;

use crate::{AccountSigner, ChainError, FeeData, FeeParameters};

/// Default timeout for a single RPC request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default interval between `eth_getTransactionReceipt` polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Creation payload for one contract: bytecode followed by encoded constructor arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCreation {
    pub bytecode: Bytes,
    pub constructor_args: Bytes,
}

impl ContractCreation {
    /// The transaction input: bytecode with the constructor arguments appended.
    pub fn init_code(&self) -> Bytes {
        let mut code = Vec::with_capacity(self.bytecode.len() + self.constructor_args.len());
        code.extend_from_slice(&self.bytecode);
        code.extend_from_slice(&self.constructor_args);
        code.into()
    }
}

/// Execution outcome recorded in a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

/// The subset of a transaction receipt a deployment cares about.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    pub contract_address: Option<Address>,
    #[serde(deserialize_with = "deserialize_status")]
    pub status: ReceiptStatus,
    #[serde(default, deserialize_with = "deserialize_optional_u64_from_hex")]
    pub block_number: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_optional_u64_from_hex")]
    pub gas_used: Option<u64>,
}

/// Network operations needed to deploy contracts.
pub trait ChainClient {
    /// Current fee data.
    fn fee_data(&self) -> impl Future<Output = Result<FeeData, ChainError>> + Send;

    /// Sign and broadcast a contract-creation transaction, returning its hash once the
    /// node accepted it. Nonce management is the client's responsibility.
    fn submit_contract_creation<S>(
        &self,
        creation: &ContractCreation,
        fee: &FeeParameters,
        signer: &S,
    ) -> impl Future<Output = Result<TxHash, ChainError>> + Send
    where
        S: AccountSigner + Sync;

    /// Block until the transaction is mined and return its receipt.
    ///
    /// Implementations do not time out; callers bound the wait.
    fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<TransactionReceipt, ChainError>> + Send;
}

/// [`ChainClient`] speaking JSON-RPC over HTTP.
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: Url,
    chain_id: u64,
    poll_interval: Duration,
}

impl JsonRpcClient {
    /// Connect to `url` and read its chain id.
    ///
    /// When `expected_chain_id` is set, a node on another chain is refused.
    pub async fn connect(
        url: Url,
        expected_chain_id: Option<u64>,
        poll_interval: Duration,
    ) -> Result<Self, ChainError> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ChainError::Transport {
                method: "connect".to_string(),
                message: e.to_string(),
            })?;

        let mut client = Self {
            http,
            url,
            chain_id: 0,
            poll_interval,
        };

        let chain_id: String = client.call("eth_chainId", serde_json::json!([])).await?;
        client.chain_id = parse_u64_quantity("eth_chainId", &chain_id)?;

        if let Some(expected) = expected_chain_id.filter(|id| *id != client.chain_id) {
            return Err(ChainError::InvalidResponse {
                method: "eth_chainId".to_string(),
                message: format!(
                    "expected chain id {expected}, node reports {}",
                    client.chain_id
                ),
            });
        }

        tracing::debug!(url = %client.url, chain_id = client.chain_id, "Connected to RPC endpoint");
        Ok(client)
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Make a JSON-RPC call and deserialize the result.
    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ChainError> {
        tracing::trace!(method, %params, "JSON-RPC request");

        let transport = |e: reqwest::Error| ChainError::Transport {
            method: method.to_string(),
            message: e.to_string(),
        };

        let response: Value = self
            .http
            .post(self.url.clone())
            .json(&serde_json::json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": params,
                "id": 1
            }))
            .send()
            .await
            .map_err(transport)?
            .json()
            .await
            .map_err(transport)?;

        if let Some(error) = response.get("error") {
            return Err(ChainError::Rpc {
                method: method.to_string(),
                code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
            });
        }

        let result = response
            .get("result")
            .cloned()
            .ok_or_else(|| ChainError::InvalidResponse {
                method: method.to_string(),
                message: "no result in response".to_string(),
            })?;

        serde_json::from_value(result).map_err(|e| ChainError::InvalidResponse {
            method: method.to_string(),
            message: e.to_string(),
        })
    }
}

impl ChainClient for JsonRpcClient {
    async fn fee_data(&self) -> Result<FeeData, ChainError> {
        let gas_price: String = self.call("eth_gasPrice", serde_json::json!([])).await?;

        // Not every node implements the tip oracle.
        let max_priority_fee_per_gas = match self
            .call::<String>("eth_maxPriorityFeePerGas", serde_json::json!([]))
            .await
        {
            Ok(tip) => Some(parse_quantity("eth_maxPriorityFeePerGas", &tip)?),
            Err(ChainError::Rpc { message, .. }) => {
                tracing::debug!(%message, "Node has no priority fee suggestion");
                None
            }
            Err(e) => return Err(e),
        };

        Ok(FeeData {
            gas_price: parse_quantity("eth_gasPrice", &gas_price)?,
            max_priority_fee_per_gas,
        })
    }

    async fn submit_contract_creation<S>(
        &self,
        creation: &ContractCreation,
        fee: &FeeParameters,
        signer: &S,
    ) -> Result<TxHash, ChainError>
    where
        S: AccountSigner + Sync,
    {
        let from = signer.address();
        let nonce: String = self
            .call(
                "eth_getTransactionCount",
                serde_json::json!([from, "pending"]),
            )
            .await?;
        let nonce = parse_u64_quantity("eth_getTransactionCount", &nonce)?;

        let tx = TxEip1559 {
            chain_id: self.chain_id,
            nonce,
            gas_limit: fee.gas_limit,
            max_fee_per_gas: fee.max_fee_per_gas,
            max_priority_fee_per_gas: fee.max_priority_fee_per_gas,
            to: TxKind::Create,
            value: U256::ZERO,
            access_list: Default::default(),
            input: creation.init_code(),
        };
        tracing::debug!(%from, nonce, chain_id = self.chain_id, "Signing contract creation");

        let raw = signer.sign_transaction(tx)?;
        self.call("eth_sendRawTransaction", serde_json::json!([raw]))
            .await
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransactionReceipt, ChainError> {
        loop {
            let receipt: Option<TransactionReceipt> = self
                .call("eth_getTransactionReceipt", serde_json::json!([tx_hash]))
                .await?;

            if let Some(receipt) = receipt {
                return Ok(receipt);
            }

            tracing::trace!(%tx_hash, "Transaction not mined yet, polling again...");
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Parse a hex-encoded JSON-RPC quantity.
fn parse_quantity(method: &str, value: &str) -> Result<u128, ChainError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    u128::from_str_radix(digits, 16).map_err(|e| ChainError::InvalidResponse {
        method: method.to_string(),
        message: format!("invalid quantity {value:?}: {e}"),
    })
}

/// Parse a hex-encoded JSON-RPC quantity that must fit in a u64.
fn parse_u64_quantity(method: &str, value: &str) -> Result<u64, ChainError> {
    u64::try_from(parse_quantity(method, value)?).map_err(|_| ChainError::InvalidResponse {
        method: method.to_string(),
        message: format!("quantity {value:?} does not fit in 64 bits"),
    })
}

/// Deserialize an optional u64 from a hex string (with 0x prefix).
fn deserialize_optional_u64_from_hex<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Deserialize::deserialize(deserializer)?;
    value
        .map(|s| u64::from_str_radix(s.trim_start_matches("0x"), 16))
        .transpose()
        .map_err(serde::de::Error::custom)
}

fn deserialize_status<'de, D>(deserializer: D) -> Result<ReceiptStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let value: String = Deserialize::deserialize(deserializer)?;
    match parse_quantity("eth_getTransactionReceipt", &value).map_err(serde::de::Error::custom)? {
        1 => Ok(ReceiptStatus::Success),
        0 => Ok(ReceiptStatus::Reverted),
        _ => Err(serde::de::Error::custom(format!(
            "unknown receipt status {value:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("eth_gasPrice", "0x0").unwrap(), 0);
        assert_eq!(parse_quantity("eth_gasPrice", "0xa").unwrap(), 10);
        assert_eq!(parse_quantity("eth_gasPrice", "0x3b9aca00").unwrap(), 1_000_000_000);
        assert!(parse_quantity("eth_gasPrice", "0xzz").is_err());
    }

    #[test]
    fn test_parse_u64_quantity_rejects_overflow() {
        assert_eq!(parse_u64_quantity("eth_chainId", "0x539").unwrap(), 1337);
        assert_eq!(
            parse_u64_quantity("eth_chainId", "0xffffffffffffffff").unwrap(),
            u64::MAX
        );
        let err = parse_u64_quantity("eth_chainId", "0x10000000000000539").unwrap_err();
        assert!(matches!(err, ChainError::InvalidResponse { .. }), "unexpected error: {err}");
    }

    #[test]
    fn test_init_code_appends_constructor_args() {
        let creation = ContractCreation {
            bytecode: Bytes::from_static(&[0x60, 0x80]),
            constructor_args: Bytes::from_static(&[0x01, 0x02]),
        };
        assert_eq!(creation.init_code(), Bytes::from_static(&[0x60, 0x80, 0x01, 0x02]));
    }

    #[test]
    fn test_deserialize_successful_deployment_receipt() {
        let receipt: TransactionReceipt = serde_json::from_value(serde_json::json!({
            "transactionHash": "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b",
            "blockNumber": "0x1b4",
            "gasUsed": "0x2dc6c0",
            "contractAddress": "0x5fbdb2315678afecb367f032d93f642f64180aa3",
            "status": "0x1",
            "logs": []
        }))
        .unwrap();

        assert_eq!(receipt.status, ReceiptStatus::Success);
        assert_eq!(receipt.block_number, Some(436));
        assert_eq!(receipt.gas_used, Some(3_000_000));
        assert_eq!(
            receipt.contract_address,
            Some("0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap())
        );
    }

    #[test]
    fn test_deserialize_reverted_receipt() {
        let receipt: TransactionReceipt = serde_json::from_value(serde_json::json!({
            "transactionHash": "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b",
            "blockNumber": null,
            "contractAddress": null,
            "status": "0x0"
        }))
        .unwrap();

        assert_eq!(receipt.status, ReceiptStatus::Reverted);
        assert_eq!(receipt.contract_address, None);
        assert_eq!(receipt.block_number, None);
        assert_eq!(receipt.gas_used, None);
    }

    #[test]
    fn test_padded_status_quantities() {
        for (status, expected) in [("0x01", ReceiptStatus::Success), ("0x00", ReceiptStatus::Reverted)] {
            let receipt: TransactionReceipt = serde_json::from_value(serde_json::json!({
                "transactionHash": "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b",
                "status": status
            }))
            .unwrap();
            assert_eq!(receipt.status, expected);
        }
    }

    #[test]
    fn test_unknown_status_rejected() {
        let result = serde_json::from_value::<TransactionReceipt>(serde_json::json!({
            "transactionHash": "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b",
            "status": "0x2"
        }));
        assert!(result.is_err());
    }
}
