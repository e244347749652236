//! # Unjail Request
//!
//! The structured form of an `Unjail` event emitted by the staking
//! contract. Produced by the log decoder; this crate never builds one
//! from raw log bytes.

use serde::{Deserialize, Serialize};

use crate::identity::{ExecutionAddress, TxHash};

/// A request to clear a validator's jailed flag.
///
/// The public key is kept exactly as the contract emitted it. It is not
/// validated here: a malformed key is a classified failure of the
/// request, not a reason to refuse constructing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnjailRequest {
    /// Consensus-layer height at which the request is processed.
    pub block_height: i64,
    /// Uncompressed secp256k1 public key of the validator (65 bytes, `0x04` prefix).
    #[serde(with = "hex::serde")]
    pub validator_uncmp_pubkey: Vec<u8>,
    /// Execution-layer address that submitted the unjail transaction.
    pub unjailer: ExecutionAddress,
    /// Hash of the execution-layer transaction carrying the event.
    pub tx_hash: TxHash,
}

impl UnjailRequest {
    /// Create a new request.
    pub fn new(
        block_height: i64,
        validator_uncmp_pubkey: impl Into<Vec<u8>>,
        unjailer: ExecutionAddress,
        tx_hash: TxHash,
    ) -> Self {
        Self {
            block_height,
            validator_uncmp_pubkey: validator_uncmp_pubkey.into(),
            unjailer,
            tx_hash,
        }
    }

    /// The validator public key as lowercase hex, no prefix.
    pub fn pubkey_hex(&self) -> String {
        hex::encode(&self.validator_uncmp_pubkey)
    }
}
