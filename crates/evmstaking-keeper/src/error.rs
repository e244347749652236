//! # Unjail Errors
//!
//! Every way an unjail request can fail, each carrying its cause for
//! diagnostics. [`UnjailError::code`] maps a failure onto the closed
//! `ErrorCode` taxonomy that ends up in the audit event.

use evmstaking_core::{AccountAddress, ErrorCode, ExecutionAddress};
use evmstaking_crypto::CryptoError;
use evmstaking_state::LivenessError;
use thiserror::Error;

/// Boxed cause of an unclassified failure.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A classified unjail failure.
#[derive(Error, Debug)]
pub enum UnjailError {
    /// The emitted key could not be compressed.
    #[error("compress validator pubkey: {0}")]
    InvalidPublicKey(#[source] CryptoError),

    /// Submitted on the validator's behalf, but no operator is bound.
    #[error("unjail on behalf rejected: no operator registered for delegator {0}")]
    NoRegisteredOperator(AccountAddress),

    /// Submitted on the validator's behalf by someone other than the bound operator.
    #[error("unjail on behalf rejected: sender {submitter} is not operator {operator}")]
    UnauthorizedOperator {
        /// Address that submitted the request.
        submitter: ExecutionAddress,
        /// Operator actually bound to the validator.
        operator: ExecutionAddress,
    },

    /// The liveness subsystem does not know the validator.
    #[error(transparent)]
    ValidatorNotFound(LivenessError),

    /// The validator has no self-delegation.
    #[error(transparent)]
    MissingSelfDelegation(LivenessError),

    /// The validator was not jailed.
    #[error(transparent)]
    NotJailed(LivenessError),

    /// The validator cannot be released yet.
    #[error(transparent)]
    StillJailed(LivenessError),

    /// A panic was caught while processing the request.
    #[error("panic caused by {0}")]
    InternalFault(String),

    /// Any other failure, wrapped unchanged.
    #[error("{context}: {source}")]
    Unclassified {
        /// What the processor was doing when the failure surfaced.
        context: &'static str,
        /// The original error.
        #[source]
        source: BoxedCause,
    },
}

impl UnjailError {
    /// Wrap an unrecognised failure without reclassifying it.
    pub fn unclassified(context: &'static str, source: impl Into<BoxedCause>) -> Self {
        Self::Unclassified {
            context,
            source: source.into(),
        }
    }

    /// The status code recorded for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidPublicKey(_) => ErrorCode::InvalidPublicKey,
            Self::NoRegisteredOperator(_) => ErrorCode::NoRegisteredOperator,
            Self::UnauthorizedOperator { .. } => ErrorCode::UnauthorizedOperator,
            Self::ValidatorNotFound(_) => ErrorCode::ValidatorNotFound,
            Self::MissingSelfDelegation(_) => ErrorCode::MissingSelfDelegation,
            Self::NotJailed(_) => ErrorCode::NotJailed,
            Self::StillJailed(_) => ErrorCode::StillJailed,
            Self::InternalFault(_) => ErrorCode::InternalFault,
            Self::Unclassified { .. } => ErrorCode::Unclassified,
        }
    }
}
