//! # Delegator Operator Registry
//!
//! A delegator may authorize one execution-layer address to submit
//! certain transactions on its behalf. For a validator, the delegator is
//! its own account address; the bound operator may then unjail it.
//!
//! The registry is owned by the delegation side. The unjail processor
//! only reads it, through the same view it mutates.

use evmstaking_core::{AccountAddress, ExecutionAddress};
use thiserror::Error;

use crate::store::{get_json, prefixed_key, set_json, KvStore, StoreError};

/// Collection prefix for delegator → operator bindings.
pub const OPERATOR_PREFIX: u8 = 0x21;

/// Errors from an operator lookup.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No operator is bound to the delegator.
    #[error("no operator registered for delegator {0}")]
    NotFound(AccountAddress),

    /// The underlying store failed.
    #[error("operator registry store error: {0}")]
    Store(#[from] StoreError),
}

/// Read access to delegator → operator bindings.
pub trait OperatorRegistry {
    /// Return the operator bound to `delegator`.
    fn lookup_operator(
        &self,
        store: &dyn KvStore,
        delegator: &AccountAddress,
    ) -> Result<ExecutionAddress, RegistryError>;
}

/// Registry persisted in the state store under [`OPERATOR_PREFIX`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DelegatorOperatorRegistry;

impl DelegatorOperatorRegistry {
    /// Create a registry handle.
    pub fn new() -> Self {
        Self
    }

    /// Bind `operator` to `delegator`, replacing any previous binding.
    pub fn set_operator(
        &self,
        store: &mut dyn KvStore,
        delegator: &AccountAddress,
        operator: &ExecutionAddress,
    ) -> Result<(), StoreError> {
        set_json(store, &operator_key(delegator), operator)
    }

    /// Remove the binding for `delegator`, if any.
    pub fn remove_operator(
        &self,
        store: &mut dyn KvStore,
        delegator: &AccountAddress,
    ) -> Result<(), StoreError> {
        store.delete(&operator_key(delegator))
    }
}

impl OperatorRegistry for DelegatorOperatorRegistry {
    fn lookup_operator(
        &self,
        store: &dyn KvStore,
        delegator: &AccountAddress,
    ) -> Result<ExecutionAddress, RegistryError> {
        get_json::<ExecutionAddress>(store, &operator_key(delegator))?
            .ok_or(RegistryError::NotFound(*delegator))
    }
}

fn operator_key(delegator: &AccountAddress) -> Vec<u8> {
    prefixed_key(OPERATOR_PREFIX, delegator.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    fn delegator() -> AccountAddress {
        AccountAddress::from_bytes([0x0d; 20])
    }

    fn operator() -> ExecutionAddress {
        ExecutionAddress::from_bytes([0x0e; 20])
    }

    #[test]
    fn test_lookup_missing_is_not_found() {
        let store = MemStore::new(1);
        let err = DelegatorOperatorRegistry
            .lookup_operator(&store, &delegator())
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(d) if d == delegator()));
    }

    #[test]
    fn test_set_then_lookup() {
        let mut store = MemStore::new(1);
        let registry = DelegatorOperatorRegistry::new();
        registry.set_operator(&mut store, &delegator(), &operator()).unwrap();
        assert_eq!(registry.lookup_operator(&store, &delegator()).unwrap(), operator());
    }

    #[test]
    fn test_rebinding_replaces_operator() {
        let mut store = MemStore::new(1);
        let registry = DelegatorOperatorRegistry::new();
        let replacement = ExecutionAddress::from_bytes([0x0f; 20]);
        registry.set_operator(&mut store, &delegator(), &operator()).unwrap();
        registry.set_operator(&mut store, &delegator(), &replacement).unwrap();
        assert_eq!(registry.lookup_operator(&store, &delegator()).unwrap(), replacement);
    }

    #[test]
    fn test_remove_operator() {
        let mut store = MemStore::new(1);
        let registry = DelegatorOperatorRegistry::new();
        registry.set_operator(&mut store, &delegator(), &operator()).unwrap();
        registry.remove_operator(&mut store, &delegator()).unwrap();
        assert!(matches!(
            registry.lookup_operator(&store, &delegator()),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_corrupt_binding_is_store_error() {
        let mut store = MemStore::new(1);
        store.set(&operator_key(&delegator()), b"{".to_vec()).unwrap();
        assert!(matches!(
            DelegatorOperatorRegistry.lookup_operator(&store, &delegator()),
            Err(RegistryError::Store(_))
        ));
    }
}
