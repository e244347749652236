//! # evmstaking-keeper: Unjail Event Processing
//!
//! Applies `Unjail` events emitted by the execution-layer staking contract
//! to the consensus-layer state.
//!
//! ## Pipeline
//!
//! ```text
//! EvmLog ──decode──▶ UnjailRequest
//!                        │
//!                        ▼
//!              ┌── CacheView opened ──────────────────────────┐
//!              │  translate identity   (identity.rs)          │
//!              │  authorize submitter  (authorization.rs)     │
//!              │  liveness unjail      (classify.rs on error) │
//!              └──────────────────────────────────────────────┘
//!                        │
//!          success ──▶ commit view, no event
//!          failure ──▶ discard view, emit one audit event (audit.rs)
//! ```
//!
//! The whole request runs inside a catch-and-classify boundary: a panic
//! in any step becomes an `InternalFault` outcome and the view is
//! discarded, exactly as for an ordinary failure.
//!
//! ## Crate Policy
//!
//! - No `unwrap()` or `expect()` outside tests.
//! - Every failure leaves this crate classified by an `ErrorCode`.
//! - No internal concurrency. One call, one request, one view.

pub mod audit;
pub mod authorization;
pub mod classify;
pub mod config;
pub mod contract_log;
pub mod error;
pub mod identity;
pub mod unjail;

pub use audit::{AuditEvent, EventAttribute, EventManager, EventSink};
pub use authorization::{authorize, AuthorizationPath};
pub use classify::classify_liveness_error;
pub use config::{ConfigError, KeeperConfig};
pub use contract_log::{
    decode_unjail_log, encode_unjail_log, EvmLog, LogDecodeError, UNJAIL_EVENT_SIGNATURE,
};
pub use error::UnjailError;
pub use identity::translate_identity;
pub use unjail::{ApplicationOutcome, Keeper};
