//! # evmstaking-state: Consensus-Layer State
//!
//! The state the unjail processor reads and mutates, and the two
//! subsystems that own parts of it.
//!
//! ## Modules
//!
//! - **Store** (`store.rs`): the `KvStore` trait, the in-memory
//!   authoritative `MemStore`, and JSON codec helpers for typed values.
//!
//! - **Cache** (`cache.rs`): `CacheView`, a speculative overlay over a
//!   parent store. Writes are staged and become visible in the parent
//!   only on `commit()`. `discard()` (or dropping the view) leaves the
//!   parent untouched.
//!
//! - **Operator** (`operator.rs`): the delegator → operator registry
//!   consulted when an unjail is submitted on a validator's behalf.
//!
//! - **Slashing** (`slashing.rs`): validator liveness records and the
//!   unjail rules. Failures come back as the tagged `LivenessError`.
//!
//! ## Design
//!
//! A `CacheView` holds an exclusive borrow of its parent. While a view is
//! open nothing else can read or write the parent, so a half-applied
//! request is never observable. Concurrent requests need separate
//! stores, or serialization by the host.

pub mod cache;
pub mod operator;
pub mod slashing;
pub mod store;

pub use cache::CacheView;
pub use operator::{DelegatorOperatorRegistry, OperatorRegistry, RegistryError};
pub use slashing::{LivenessError, LivenessSubsystem, SlashingKeeper, ValidatorRecord};
pub use store::{KvStore, MemStore, StoreError, WriteBatch};
