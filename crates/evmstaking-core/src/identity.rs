//! # Address Newtypes
//!
//! One validator key is known under three address encodings: the
//! consensus address used by the liveness subsystem, the account address
//! keying the delegation registry, and the execution address seen by the
//! staking contract. All three are 20 bytes. They are kept as distinct
//! types so one can never be substituted for another.
//!
//! ## Serde
//!
//! Addresses and hashes serialize as `0x`-prefixed lowercase hex strings
//! and accept input with or without the prefix.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AddressError;

/// Byte length of every address type in this module.
pub const ADDRESS_LEN: usize = 20;

/// Implements the shared constructors, hex codec, `Display` and serde for
/// a fixed-width byte newtype.
macro_rules! impl_fixed_bytes {
    ($ty:ident, $len:expr) => {
        impl $ty {
            /// Create from raw bytes.
            pub fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Create from a slice, checking its length.
            pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
                let arr: [u8; $len] =
                    bytes.try_into().map_err(|_| AddressError::InvalidLength {
                        expected: $len,
                        actual: bytes.len(),
                    })?;
                Ok(Self(arr))
            }

            /// Return the raw bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Render as lowercase hex without a prefix.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse from hex, with or without a `0x` prefix.
            pub fn from_hex(s: &str) -> Result<Self, AddressError> {
                let s = s.trim();
                let s = s
                    .strip_prefix("0x")
                    .or_else(|| s.strip_prefix("0X"))
                    .unwrap_or(s);
                let bytes = hex::decode(s).map_err(|e| AddressError::HexDecode(e.to_string()))?;
                Self::from_slice(&bytes)
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "0x{}", self.to_hex())
            }
        }

        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}(0x{})", stringify!($ty), self.to_hex())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                Self::from_hex(&raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Address of a validator in the liveness (slashing) subsystem.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConsensusAddress([u8; ADDRESS_LEN]);

/// Address of a validator's delegator account. Keys the operator registry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountAddress([u8; ADDRESS_LEN]);

/// Address on the execution layer (an EVM account).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExecutionAddress([u8; ADDRESS_LEN]);

/// Hash of the execution-layer transaction that emitted an event.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash([u8; 32]);

impl_fixed_bytes!(ConsensusAddress, ADDRESS_LEN);
impl_fixed_bytes!(AccountAddress, ADDRESS_LEN);
impl_fixed_bytes!(ExecutionAddress, ADDRESS_LEN);
impl_fixed_bytes!(TxHash, 32);

impl ExecutionAddress {
    /// The all-zero address.
    pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);
}
