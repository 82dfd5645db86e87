//! Transaction signing for the single deployer account.

use std::{fmt, str::FromStr};

use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy_core::primitives::{Address, Bytes};
use alloy_eips::eip2718::Encodable2718;
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;

use crate::ChainError;

/// Authorizes transactions for one funded account.
pub trait AccountSigner {
    /// The account that pays for and owns the deployments.
    fn address(&self) -> Address;

    /// Sign `tx` and return the EIP-2718 encoded envelope, ready for broadcast.
    fn sign_transaction(&self, tx: TxEip1559) -> Result<Bytes, ChainError>;
}

/// An account backed by a raw secp256k1 private key held in memory.
#[derive(Clone)]
pub struct PrivateKeyAccount {
    signer: PrivateKeySigner,
}

impl PrivateKeyAccount {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }
}

impl FromStr for PrivateKeyAccount {
    type Err = ChainError;

    /// Parse a hex private key, with or without `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Never echo the input back: it is key material.
        PrivateKeySigner::from_str(s.trim())
            .map(Self::new)
            .map_err(|_| ChainError::Signing("invalid private key".to_string()))
    }
}

impl fmt::Debug for PrivateKeyAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKeyAccount")
            .field("address", &self.signer.address())
            .finish_non_exhaustive()
    }
}

impl AccountSigner for PrivateKeyAccount {
    fn address(&self) -> Address {
        self.signer.address()
    }

    fn sign_transaction(&self, tx: TxEip1559) -> Result<Bytes, ChainError> {
        let signature = self
            .signer
            .sign_hash_sync(&tx.signature_hash())
            .map_err(|e| ChainError::Signing(e.to_string()))?;
        let envelope = TxEnvelope::from(tx.into_signed(signature));
        Ok(Bytes::from(envelope.encoded_2718()))
    }
}
