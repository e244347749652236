//! # Submitter Authorization
//!
//! An unjail may be submitted by the validator itself or by the operator
//! bound to the validator's delegator account.
//!
//! ## Security Invariant
//!
//! The operator lookup reads the same view the unjail will be written
//! to, so authorization and mutation observe one snapshot. A self
//! submission never touches the registry.

use evmstaking_core::ExecutionAddress;
use evmstaking_crypto::ValidatorIdentity;
use evmstaking_state::{KvStore, OperatorRegistry, RegistryError};

use crate::error::UnjailError;

/// How a submission was authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationPath {
    /// The validator submitted its own unjail.
    SelfUnjail,
    /// The bound operator submitted on the validator's behalf.
    Operator(ExecutionAddress),
}

/// Decide whether `submitter` may unjail the validator.
pub fn authorize<R: OperatorRegistry + ?Sized>(
    registry: &R,
    view: &dyn KvStore,
    identity: &ValidatorIdentity,
    submitter: &ExecutionAddress,
) -> Result<AuthorizationPath, UnjailError> {
    if identity.is_self(submitter) {
        return Ok(AuthorizationPath::SelfUnjail);
    }

    let operator = match registry.lookup_operator(view, &identity.account_address) {
        Ok(operator) => operator,
        Err(RegistryError::NotFound(delegator)) => {
            return Err(UnjailError::NoRegisteredOperator(delegator));
        }
        Err(e) => return Err(UnjailError::unclassified("get validator's operator address", e)),
    };

    if operator != *submitter {
        return Err(UnjailError::UnauthorizedOperator {
            submitter: *submitter,
            operator,
        });
    }
    Ok(AuthorizationPath::Operator(operator))
}
