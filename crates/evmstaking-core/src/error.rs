//! # Error Types: Status Codes and Parse Errors
//!
//! Defines the closed status-code taxonomy surfaced to hosts and written
//! into failure audit events, plus the parse errors of the address
//! newtypes. All errors use `thiserror` for derive-based `Display` and
//! `Error` implementations.
//!
//! ## Design
//!
//! - `ErrorCode` is `Copy` and carries no payload. The diagnostic cause of
//!   a failure travels in the keeper's error type; the code is what gets
//!   recorded on-chain.
//! - Status strings are stable. Indexers match on them, so renaming a
//!   variant must not change its string.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of outcomes an unjail request can fail with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The uncompressed key is malformed or not on the curve.
    #[serde(rename = "invalid_uncmp_pubkey")]
    InvalidPublicKey,
    /// On-behalf submission with no operator bound to the validator.
    #[serde(rename = "no_registered_operator")]
    NoRegisteredOperator,
    /// On-behalf submission from an address other than the bound operator.
    #[serde(rename = "unauthorized_operator")]
    UnauthorizedOperator,
    /// The liveness subsystem has no record of the validator.
    #[serde(rename = "validator_not_found")]
    ValidatorNotFound,
    /// The validator lacks the self-delegation required to unjail.
    #[serde(rename = "missing_self_delegation")]
    MissingSelfDelegation,
    /// The validator was not jailed.
    #[serde(rename = "validator_not_jailed")]
    NotJailed,
    /// The jail period has not elapsed, or the validator is tombstoned.
    #[serde(rename = "validator_still_jailed")]
    StillJailed,
    /// A runtime fault was caught while processing the request.
    #[serde(rename = "unexpected_condition")]
    InternalFault,
    /// Any other failure propagated from a collaborator.
    #[serde(rename = "unspecified")]
    Unclassified,
}

impl ErrorCode {
    /// All status codes, in declaration order.
    pub const ALL: [ErrorCode; 9] = [
        Self::InvalidPublicKey,
        Self::NoRegisteredOperator,
        Self::UnauthorizedOperator,
        Self::ValidatorNotFound,
        Self::MissingSelfDelegation,
        Self::NotJailed,
        Self::StillJailed,
        Self::InternalFault,
        Self::Unclassified,
    ];

    /// The status string written into the `status_code` audit attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidPublicKey => "invalid_uncmp_pubkey",
            Self::NoRegisteredOperator => "no_registered_operator",
            Self::UnauthorizedOperator => "unauthorized_operator",
            Self::ValidatorNotFound => "validator_not_found",
            Self::MissingSelfDelegation => "missing_self_delegation",
            Self::NotJailed => "validator_not_jailed",
            Self::StillJailed => "validator_still_jailed",
            Self::InternalFault => "unexpected_condition",
            Self::Unclassified => "unspecified",
        }
    }

    /// Whether the failure was rejected by the authorization policy.
    pub fn is_authorization_failure(&self) -> bool {
        matches!(self, Self::NoRegisteredOperator | Self::UnauthorizedOperator)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing an address or hash from its hex or byte form.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Input had the wrong number of bytes.
    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Required byte length.
        expected: usize,
        /// Length actually supplied.
        actual: usize,
    },

    /// Input was not valid hexadecimal.
    #[error("hex decode error: {0}")]
    HexDecode(String),
}
