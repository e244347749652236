//! # Identity Translation
//!
//! Turns the uncompressed key from the contract event into the
//! validator's identity set. Pure: no state access, no side effects.

use evmstaking_crypto::{compress_pubkey, ValidatorIdentity};

use crate::error::UnjailError;

/// Derive the validator identity from the key in an unjail request.
///
/// A key that is malformed or off the curve is `InvalidPublicKey`. A
/// failure deriving the addresses from an already validated key is not
/// expected and is reported unclassified.
pub fn translate_identity(uncompressed: &[u8]) -> Result<ValidatorIdentity, UnjailError> {
    let compressed = compress_pubkey(uncompressed).map_err(UnjailError::InvalidPublicKey)?;
    ValidatorIdentity::from_compressed(compressed)
        .map_err(|e| UnjailError::unclassified("validator pubkey to evm address", e))
}
