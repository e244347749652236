//! # Cryptographic Error Types
//!
//! Structured errors for key parsing and derivation in `evmstaking-crypto`.

use thiserror::Error;

/// Errors from key handling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The key has the wrong byte length for its encoding.
    #[error("invalid public key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength {
        /// Required byte length.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// The leading tag byte does not match the encoding.
    #[error("invalid public key prefix: 0x{0:02x}")]
    InvalidKeyPrefix(u8),

    /// The bytes do not describe a point on secp256k1.
    #[error("invalid secp256k1 public key: {0}")]
    InvalidPublicKey(String),
}
