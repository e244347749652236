//! Keeper configuration.
//!
//! Defaults match the deployed staking contract. Override via environment
//! variables or explicit construction.

use evmstaking_crypto::keccak256;
use serde::Deserialize;

use crate::contract_log::UNJAIL_EVENT_SIGNATURE;

/// Default `type` of the failure audit event.
pub const DEFAULT_FAILURE_EVENT_TYPE: &str = "unjail_failure";

/// Environment variable overriding [`KeeperConfig::failure_event_type`].
pub const ENV_FAILURE_EVENT_TYPE: &str = "EVMSTAKING_UNJAIL_FAILURE_EVENT";

/// Environment variable overriding [`KeeperConfig::unjail_event_topic`] (hex).
pub const ENV_UNJAIL_EVENT_TOPIC: &str = "EVMSTAKING_UNJAIL_EVENT_TOPIC";

/// Configuration of the unjail keeper.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KeeperConfig {
    /// `type` of the audit event emitted on failure.
    pub failure_event_type: String,
    /// topic0 identifying the `Unjail` event in contract logs.
    #[serde(with = "hex::serde")]
    pub unjail_event_topic: [u8; 32],
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            failure_event_type: DEFAULT_FAILURE_EVENT_TYPE.to_string(),
            unjail_event_topic: keccak256(UNJAIL_EVENT_SIGNATURE.as_bytes()),
        }
    }
}

impl KeeperConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `EVMSTAKING_UNJAIL_FAILURE_EVENT` (default: `unjail_failure`)
    /// - `EVMSTAKING_UNJAIL_EVENT_TOPIC` (default: keccak256 of the event signature)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = lookup(ENV_FAILURE_EVENT_TYPE) {
            let event_type = raw.trim();
            if event_type.is_empty() {
                return Err(ConfigError::Empty(ENV_FAILURE_EVENT_TYPE));
            }
            config.failure_event_type = event_type.to_string();
        }
        if let Some(raw) = lookup(ENV_UNJAIL_EVENT_TOPIC) {
            let raw = raw.trim();
            let raw = raw.strip_prefix("0x").unwrap_or(raw);
            config.unjail_event_topic = <[u8; 32] as hex::FromHex>::from_hex(raw)
                .map_err(|e| ConfigError::InvalidTopic(e.to_string()))?;
        }
        Ok(config)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The named variable is present but blank.
    #[error("{0} is set but empty")]
    Empty(&'static str),
    /// The topic override is not 32 bytes of hex.
    #[error("invalid event topic: {0}")]
    InvalidTopic(String),
}
