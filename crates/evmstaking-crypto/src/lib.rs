//! # evmstaking-crypto: Key Derivation
//!
//! Translates the validator key emitted by the staking contract into the
//! addresses the consensus layer works with:
//!
//! - **secp256k1** compression and decompression of public keys.
//! - **Digests**: SHA-256, RIPEMD-160 and Keccak-256.
//! - **Address derivation**: consensus and account addresses are
//!   RIPEMD-160(SHA-256(compressed key)); the execution address is the
//!   trailing 20 bytes of Keccak-256 over the raw uncompressed point.
//! - **EIP-55** mixed-case rendering of execution addresses.
//! - **`ValidatorIdentity`**: all of the above, derived in one call.
//!
//! ## Crate Policy
//!
//! - Depends only on `evmstaking-core` internally.
//! - Every function is pure. Same input, same output, no side effects.
//! - Tests use real secp256k1 keys derived from fixed seeds.

pub mod error;
pub mod hash;
pub mod identity;
pub mod keys;

pub use error::CryptoError;
pub use hash::{keccak256, ripemd160, sha256};
pub use identity::ValidatorIdentity;
pub use keys::{
    account_address, checksum_hex, compress_pubkey, consensus_address, decompress_pubkey,
    derive_uncompressed_pubkey,
    execution_address, CompressedPubkey, COMPRESSED_PUBKEY_LEN, UNCOMPRESSED_PUBKEY_LEN,
};
