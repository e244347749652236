//! # Validator Liveness (Slashing) Subsystem
//!
//! Tracks, per consensus address, whether a validator is jailed and what
//! it needs before it may be released.
//!
//! ## States
//!
//! ```text
//! Active ──jail(until)──▶ Jailed ──unjail (height ≥ until)──▶ Active
//!                           │
//!                           └──tombstone──▶ Tombstoned (never released)
//! ```
//!
//! ## Unjail Rules
//!
//! Checked in order; the first failing rule decides the error:
//!
//! 1. The validator must exist.
//! 2. It must have a self-delegation.
//! 3. The self-delegation must meet the validator's declared minimum.
//! 4. It must currently be jailed.
//! 5. It must not be tombstoned, and the jail period must have elapsed.

use evmstaking_core::ConsensusAddress;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{get_json, prefixed_key, set_json, KvStore, StoreError};

/// Collection prefix for validator liveness records.
pub const VALIDATOR_PREFIX: u8 = 0x11;

// ─── Errors ──────────────────────────────────────────────────────────

/// Outcomes of a rejected unjail.
///
/// A tagged variant per upstream failure. Callers classify by matching,
/// never by comparing messages.
#[derive(Error, Debug)]
pub enum LivenessError {
    /// No record for the consensus address.
    #[error("no validator for consensus address {0}")]
    ValidatorNotFound(ConsensusAddress),

    /// The validator has no self-delegation.
    #[error("validator {0} has no self-delegation")]
    MissingSelfDelegation(ConsensusAddress),

    /// The self-delegation is below the validator's minimum.
    #[error("validator {address} self-delegation {self_delegation} is below minimum {min_self_delegation}")]
    SelfDelegationTooLow {
        /// The validator.
        address: ConsensusAddress,
        /// Current self-delegation.
        self_delegation: u64,
        /// Required minimum.
        min_self_delegation: u64,
    },

    /// The validator is not jailed.
    #[error("validator {0} is not jailed")]
    NotJailed(ConsensusAddress),

    /// The validator is tombstoned or its jail period has not elapsed.
    #[error("validator {address} still jailed (until height {jailed_until}, tombstoned: {tombstoned})")]
    StillJailed {
        /// The validator.
        address: ConsensusAddress,
        /// Height from which release is allowed.
        jailed_until: i64,
        /// Tombstoned validators are never released.
        tombstoned: bool,
    },

    /// The store failed while reading or writing the record.
    #[error("liveness store error: {0}")]
    Store(#[from] StoreError),
}

// ─── Validator Record ────────────────────────────────────────────────

/// Liveness state of one validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRecord {
    /// Consensus address of the validator.
    pub consensus_address: ConsensusAddress,
    /// Whether the validator is jailed.
    pub jailed: bool,
    /// First height at which the validator may be unjailed.
    pub jailed_until: i64,
    /// Tombstoned validators stay jailed forever.
    pub tombstoned: bool,
    /// Tokens the validator delegated to itself, if any.
    pub self_delegation: Option<u64>,
    /// Minimum self-delegation the validator declared.
    pub min_self_delegation: u64,
}

impl ValidatorRecord {
    /// An unjailed validator with the given self-delegation.
    pub fn new(consensus_address: ConsensusAddress, self_delegation: u64) -> Self {
        Self {
            consensus_address,
            jailed: false,
            jailed_until: 0,
            tombstoned: false,
            self_delegation: Some(self_delegation),
            min_self_delegation: 1,
        }
    }

    /// Apply the unjail rules at `height`, clearing the jailed flag on success.
    pub fn unjail(&mut self, height: i64) -> Result<(), LivenessError> {
        let address = self.consensus_address;
        let self_delegation = self
            .self_delegation
            .ok_or(LivenessError::MissingSelfDelegation(address))?;
        if self_delegation < self.min_self_delegation {
            return Err(LivenessError::SelfDelegationTooLow {
                address,
                self_delegation,
                min_self_delegation: self.min_self_delegation,
            });
        }
        if !self.jailed {
            return Err(LivenessError::NotJailed(address));
        }
        if self.tombstoned || height < self.jailed_until {
            return Err(LivenessError::StillJailed {
                address,
                jailed_until: self.jailed_until,
                tombstoned: self.tombstoned,
            });
        }
        self.jailed = false;
        Ok(())
    }
}

// ─── Subsystem ───────────────────────────────────────────────────────

/// The unjail operation of a liveness subsystem.
pub trait LivenessSubsystem {
    /// Release the validator at `address` from jail, writing through `store`.
    fn unjail(&self, store: &mut dyn KvStore, address: &ConsensusAddress)
        -> Result<(), LivenessError>;
}

/// Liveness subsystem persisted in the state store under [`VALIDATOR_PREFIX`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SlashingKeeper;

impl SlashingKeeper {
    /// Create a keeper handle.
    pub fn new() -> Self {
        Self
    }

    /// Read a validator record.
    pub fn validator(
        &self,
        store: &dyn KvStore,
        address: &ConsensusAddress,
    ) -> Result<Option<ValidatorRecord>, StoreError> {
        get_json(store, &validator_key(address))
    }

    /// Insert or replace a validator record.
    pub fn set_validator(
        &self,
        store: &mut dyn KvStore,
        record: &ValidatorRecord,
    ) -> Result<(), StoreError> {
        set_json(store, &validator_key(&record.consensus_address), record)
    }

    /// Jail a validator until `jailed_until`.
    pub fn jail(
        &self,
        store: &mut dyn KvStore,
        address: &ConsensusAddress,
        jailed_until: i64,
    ) -> Result<(), LivenessError> {
        let mut record = self.require_validator(store, address)?;
        record.jailed = true;
        record.jailed_until = record.jailed_until.max(jailed_until);
        self.set_validator(store, &record)?;
        tracing::debug!(validator = %address, jailed_until, "validator jailed");
        Ok(())
    }

    /// Jail a validator permanently.
    pub fn tombstone(
        &self,
        store: &mut dyn KvStore,
        address: &ConsensusAddress,
    ) -> Result<(), LivenessError> {
        let mut record = self.require_validator(store, address)?;
        record.jailed = true;
        record.tombstoned = true;
        self.set_validator(store, &record)?;
        Ok(())
    }

    /// Whether the validator is currently jailed. Unknown validators are not.
    pub fn is_jailed(
        &self,
        store: &dyn KvStore,
        address: &ConsensusAddress,
    ) -> Result<bool, StoreError> {
        Ok(self.validator(store, address)?.is_some_and(|r| r.jailed))
    }

    fn require_validator(
        &self,
        store: &dyn KvStore,
        address: &ConsensusAddress,
    ) -> Result<ValidatorRecord, LivenessError> {
        self.validator(store, address)?
            .ok_or(LivenessError::ValidatorNotFound(*address))
    }
}

impl LivenessSubsystem for SlashingKeeper {
    fn unjail(
        &self,
        store: &mut dyn KvStore,
        address: &ConsensusAddress,
    ) -> Result<(), LivenessError> {
        let mut record = self.require_validator(store, address)?;
        record.unjail(store.block_height())?;
        self.set_validator(store, &record)?;
        tracing::debug!(validator = %address, height = store.block_height(), "validator unjailed");
        Ok(())
    }
}

fn validator_key(address: &ConsensusAddress) -> Vec<u8> {
    prefixed_key(VALIDATOR_PREFIX, address.as_bytes())
}

// ─── Tests ───────────────────────────────────────────────────────────
