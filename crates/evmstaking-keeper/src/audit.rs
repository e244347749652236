//! # Failure Audit Events
//!
//! When an unjail request fails, its state changes are thrown away and a
//! single audit event is emitted in their place. The event has a fixed
//! attribute schema so indexers can parse it without knowing which step
//! failed.
//!
//! ## Attribute Schema
//!
//! | key | value |
//! |---|---|
//! | `block_height` | decimal consensus height |
//! | `validator_uncmp_pubkey` | lowercase hex, no prefix |
//! | `sender_address` | EIP-55 checksummed execution address |
//! | `status_code` | `ErrorCode` status string |
//! | `tx_hash` | lowercase hex, no prefix |
//!
//! Delivery is fire-and-forget from the keeper's point of view.

use evmstaking_core::{ErrorCode, UnjailRequest};
use evmstaking_crypto::checksum_hex;
use serde::{Deserialize, Serialize};

/// Attribute key for the consensus block height.
pub const ATTRIBUTE_KEY_BLOCK_HEIGHT: &str = "block_height";
/// Attribute key for the validator's uncompressed public key.
pub const ATTRIBUTE_KEY_VALIDATOR_UNCMP_PUBKEY: &str = "validator_uncmp_pubkey";
/// Attribute key for the submitting execution address.
pub const ATTRIBUTE_KEY_SENDER_ADDRESS: &str = "sender_address";
/// Attribute key for the failure status code.
pub const ATTRIBUTE_KEY_STATUS_CODE: &str = "status_code";
/// Attribute key for the source transaction hash.
pub const ATTRIBUTE_KEY_TX_HASH: &str = "tx_hash";

/// One key/value pair of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    /// Attribute key.
    pub key: String,
    /// Attribute value.
    pub value: String,
}

impl EventAttribute {
    /// Create an attribute.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A typed event with ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Attributes, in emission order.
    pub attributes: Vec<EventAttribute>,
}

impl AuditEvent {
    /// Build the failure event for `request`.
    pub fn unjail_failure(event_type: &str, request: &UnjailRequest, code: ErrorCode) -> Self {
        Self {
            event_type: event_type.to_string(),
            attributes: vec![
                EventAttribute::new(ATTRIBUTE_KEY_BLOCK_HEIGHT, request.block_height.to_string()),
                EventAttribute::new(ATTRIBUTE_KEY_VALIDATOR_UNCMP_PUBKEY, request.pubkey_hex()),
                EventAttribute::new(ATTRIBUTE_KEY_SENDER_ADDRESS, checksum_hex(&request.unjailer)),
                EventAttribute::new(ATTRIBUTE_KEY_STATUS_CODE, code.as_str()),
                EventAttribute::new(ATTRIBUTE_KEY_TX_HASH, request.tx_hash.to_hex()),
            ],
        }
    }

    /// Value of the first attribute with `key`.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_str())
    }
}

/// Destination for emitted events.
pub trait EventSink {
    /// Emit one event.
    fn emit(&mut self, event: AuditEvent);
}

/// In-memory sink that records every event it receives.
#[derive(Debug, Default, Clone)]
pub struct EventManager {
    events: Vec<AuditEvent>,
}

impl EventManager {
    /// Create an empty event manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events emitted so far, oldest first.
    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }

    /// Number of emitted events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing has been emitted.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove and return all recorded events.
    pub fn drain(&mut self) -> Vec<AuditEvent> {
        std::mem::take(&mut self.events)
    }
}

impl EventSink for EventManager {
    fn emit(&mut self, event: AuditEvent) {
        self.events.push(event);
    }
}
