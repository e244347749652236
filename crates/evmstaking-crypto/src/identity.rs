//! # Validator Identity
//!
//! Every address a validator is known by, derived from the key the
//! staking contract emitted. Derivation is deterministic and exclusive:
//! nothing but the key goes in, and nothing here is ever persisted.

use evmstaking_core::{AccountAddress, ConsensusAddress, ExecutionAddress};
use serde::Serialize;

use crate::error::CryptoError;
use crate::keys::{
    account_address, compress_pubkey, consensus_address, execution_address, CompressedPubkey,
};

/// The identity set of one validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorIdentity {
    /// Compressed secp256k1 public key.
    pub compressed_pubkey: CompressedPubkey,
    /// Address in the liveness subsystem.
    pub consensus_address: ConsensusAddress,
    /// Delegator account address; keys the operator registry.
    pub account_address: AccountAddress,
    /// Address on the execution layer.
    pub execution_address: ExecutionAddress,
}

impl ValidatorIdentity {
    /// Derive the identity set from a 65-byte uncompressed public key.
    pub fn from_uncompressed(uncompressed: &[u8]) -> Result<Self, CryptoError> {
        let compressed_pubkey = compress_pubkey(uncompressed)?;
        Self::from_compressed(compressed_pubkey)
    }

    /// Derive the identity set from an already validated compressed key.
    pub fn from_compressed(compressed_pubkey: CompressedPubkey) -> Result<Self, CryptoError> {
        Ok(Self {
            consensus_address: consensus_address(&compressed_pubkey),
            account_address: account_address(&compressed_pubkey),
            execution_address: execution_address(&compressed_pubkey)?,
            compressed_pubkey,
        })
    }

    /// Whether `submitter` is the validator's own execution address.
    pub fn is_self(&self, submitter: &ExecutionAddress) -> bool {
        self.execution_address == *submitter
    }
}
