//! # secp256k1 Keys and Address Derivation
//!
//! The staking contract emits validator keys in the 65-byte uncompressed
//! SEC1 form (`0x04 || x || y`). The consensus layer works with the
//! 33-byte compressed form and with addresses derived from it.
//!
//! ## Security Invariant
//!
//! - A `CompressedPubkey` can only be obtained from bytes that parse as a
//!   point on secp256k1. Every address derived from one therefore belongs
//!   to a real key.
//! - Execution addresses are compared as bytes. The EIP-55 checksum is
//!   for display only and never used for equality.

use evmstaking_core::{AccountAddress, ConsensusAddress, ExecutionAddress};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde::{Serialize, Serializer};

use crate::error::CryptoError;
use crate::hash::{keccak256, ripemd160, sha256};

/// Byte length of an uncompressed SEC1 public key.
pub const UNCOMPRESSED_PUBKEY_LEN: usize = 65;

/// Byte length of a compressed SEC1 public key.
pub const COMPRESSED_PUBKEY_LEN: usize = 33;

const UNCOMPRESSED_TAG: u8 = 0x04;

/// A validated, compressed secp256k1 public key.
///
/// Serializes as a lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompressedPubkey([u8; COMPRESSED_PUBKEY_LEN]);

impl CompressedPubkey {
    /// Parse and validate a compressed key.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != COMPRESSED_PUBKEY_LEN {
            return Err(CryptoError::InvalidKeyLength {
                expected: COMPRESSED_PUBKEY_LEN,
                actual: bytes.len(),
            });
        }
        let pk = parse_point(bytes)?;
        Ok(Self(pk.serialize()))
    }

    /// Return the raw 33 bytes.
    pub fn as_bytes(&self) -> &[u8; COMPRESSED_PUBKEY_LEN] {
        &self.0
    }

    /// Render as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Serialize for CompressedPubkey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl std::fmt::Debug for CompressedPubkey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CompressedPubkey({})", self.to_hex())
    }
}

impl std::fmt::Display for CompressedPubkey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Compression
// ---------------------------------------------------------------------------

/// Compress a 65-byte uncompressed public key.
///
/// Rejects input of the wrong length, with a tag other than `0x04`, or
/// whose coordinates are not a point on the curve.
pub fn compress_pubkey(uncompressed: &[u8]) -> Result<CompressedPubkey, CryptoError> {
    if uncompressed.len() != UNCOMPRESSED_PUBKEY_LEN {
        return Err(CryptoError::InvalidKeyLength {
            expected: UNCOMPRESSED_PUBKEY_LEN,
            actual: uncompressed.len(),
        });
    }
    if uncompressed[0] != UNCOMPRESSED_TAG {
        return Err(CryptoError::InvalidKeyPrefix(uncompressed[0]));
    }
    let pk = parse_point(uncompressed)?;
    Ok(CompressedPubkey(pk.serialize()))
}

/// Recover the 65-byte uncompressed form of a compressed key.
pub fn decompress_pubkey(
    compressed: &CompressedPubkey,
) -> Result<[u8; UNCOMPRESSED_PUBKEY_LEN], CryptoError> {
    Ok(parse_point(&compressed.0)?.serialize_uncompressed())
}

/// Derive the uncompressed public key for a raw 32-byte secret key.
///
/// Used by key tooling and test fixtures; the processing path never
/// handles secret keys.
pub fn derive_uncompressed_pubkey(
    secret_key: &[u8; 32],
) -> Result<[u8; UNCOMPRESSED_PUBKEY_LEN], CryptoError> {
    let secp = Secp256k1::signing_only();
    let sk = SecretKey::from_slice(secret_key)
        .map_err(|e| CryptoError::InvalidPublicKey(format!("secret key rejected: {e}")))?;
    Ok(PublicKey::from_secret_key(&secp, &sk).serialize_uncompressed())
}

fn parse_point(bytes: &[u8]) -> Result<PublicKey, CryptoError> {
    PublicKey::from_slice(bytes).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

// ---------------------------------------------------------------------------
// Address derivation
// ---------------------------------------------------------------------------

/// The consensus address: RIPEMD-160(SHA-256(compressed key)).
pub fn consensus_address(pubkey: &CompressedPubkey) -> ConsensusAddress {
    ConsensusAddress::from_bytes(hash160(pubkey))
}

/// The delegator account address. Same bytes as the consensus address,
/// different namespace.
pub fn account_address(pubkey: &CompressedPubkey) -> AccountAddress {
    AccountAddress::from_bytes(hash160(pubkey))
}

/// The execution-layer address: the last 20 bytes of Keccak-256 over the
/// 64-byte point (the uncompressed key without its tag byte).
pub fn execution_address(pubkey: &CompressedPubkey) -> Result<ExecutionAddress, CryptoError> {
    let uncompressed = decompress_pubkey(pubkey)?;
    let digest = keccak256(&uncompressed[1..]);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&digest[12..]);
    Ok(ExecutionAddress::from_bytes(addr))
}

fn hash160(pubkey: &CompressedPubkey) -> [u8; 20] {
    ripemd160(&sha256(pubkey.as_bytes()))
}

/// Render an execution address in EIP-55 mixed-case checksum form.
pub fn checksum_hex(address: &ExecutionAddress) -> String {
    let lower = address.to_hex();
    let digest = keccak256(lower.as_bytes());
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (digest[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}
