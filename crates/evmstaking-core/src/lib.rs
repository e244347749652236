//! # evmstaking-core: Foundational Types for EVM Staking Events
//!
//! Defines the type-system primitives shared by every other crate in the
//! workspace. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for addresses.** `ConsensusAddress`,
//!    `AccountAddress` and `ExecutionAddress` are all 20 bytes wide but are
//!    distinct types. Passing an account address where the liveness
//!    subsystem expects a consensus address is a compile error.
//!
//! 2. **Immutable requests.** `UnjailRequest` is built once by the log
//!    decoder and only ever borrowed afterwards.
//!
//! 3. **Single `ErrorCode` enum.** One closed taxonomy of status codes,
//!    exhaustive `match` everywhere. Adding a code forces every consumer
//!    to handle it.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `evmstaking-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod request;

// Re-export primary types for ergonomic imports.
pub use error::{AddressError, ErrorCode};
pub use identity::{AccountAddress, ConsensusAddress, ExecutionAddress, TxHash, ADDRESS_LEN};
pub use request::UnjailRequest;
