//! # Liveness Failure Classification
//!
//! Maps the liveness subsystem's tagged outcomes onto status codes.
//!
//! | `LivenessError` | `ErrorCode` |
//! |---|---|
//! | `ValidatorNotFound` | `ValidatorNotFound` |
//! | `MissingSelfDelegation` | `MissingSelfDelegation` |
//! | `NotJailed` | `NotJailed` |
//! | `StillJailed` | `StillJailed` |
//! | anything else | `Unclassified`, original error kept as source |

use evmstaking_state::LivenessError;

use crate::error::UnjailError;

/// Classify a failed liveness unjail.
pub fn classify_liveness_error(err: LivenessError) -> UnjailError {
    match err {
        e @ LivenessError::ValidatorNotFound(_) => UnjailError::ValidatorNotFound(e),
        e @ LivenessError::MissingSelfDelegation(_) => UnjailError::MissingSelfDelegation(e),
        e @ LivenessError::NotJailed(_) => UnjailError::NotJailed(e),
        e @ LivenessError::StillJailed { .. } => UnjailError::StillJailed(e),
        other => UnjailError::unclassified("unjail", other),
    }
}
