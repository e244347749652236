//! # Staking Contract Log Decoding
//!
//! The staking contract emits
//!
//! ```text
//! event Unjail(address unjailer, bytes validatorUncmpPubkey, bytes data);
//! ```
//!
//! with no indexed parameters, so topic0 is the event signature hash and
//! the log data is the ABI encoding of the three arguments:
//!
//! ```text
//! word 0   unjailer, left-padded to 32 bytes
//! word 1   offset of validatorUncmpPubkey
//! word 2   offset of data
//! ...      per bytes argument: length word, then the bytes right-padded
//! ```
//!
//! Offsets are relative to the start of the data and must point past the
//! head. The trailing `data` argument is validated but not carried into
//! the request.

use evmstaking_core::{ExecutionAddress, TxHash, UnjailRequest};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::KeeperConfig;

/// Solidity signature of the unjail event.
pub const UNJAIL_EVENT_SIGNATURE: &str = "Unjail(address,bytes,bytes)";

const WORD: usize = 32;
const HEAD_LEN: usize = 3 * WORD;

/// A log emitted by a contract on the execution layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmLog {
    /// Emitting contract.
    pub address: ExecutionAddress,
    /// Indexed topics; topic0 identifies the event.
    pub topics: Vec<[u8; 32]>,
    /// ABI-encoded non-indexed arguments.
    #[serde(with = "hex::serde")]
    pub data: Vec<u8>,
    /// Transaction that emitted the log.
    pub tx_hash: TxHash,
}

/// Errors decoding an unjail log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogDecodeError {
    /// The log has no topics.
    #[error("log has no topics")]
    MissingTopic,

    /// topic0 is not the unjail event.
    #[error("topic mismatch: expected {expected}, found {found}")]
    TopicMismatch {
        /// Configured topic, hex.
        expected: String,
        /// topic0 of the log, hex.
        found: String,
    },

    /// The data ends before a required field.
    #[error("log data truncated: need {needed} bytes, have {actual}")]
    Truncated {
        /// Bytes required.
        needed: usize,
        /// Bytes present.
        actual: usize,
    },

    /// An offset or length word is out of range or misaligned.
    #[error("invalid offset or length word: {0}")]
    BadOffset(String),

    /// The address word has non-zero padding.
    #[error("address word has non-zero high bytes")]
    BadAddress,
}

/// Decode an `Unjail` log into a request processed at `block_height`.
pub fn decode_unjail_log(
    log: &EvmLog,
    block_height: i64,
    config: &KeeperConfig,
) -> Result<UnjailRequest, LogDecodeError> {
    let topic = log.topics.first().ok_or(LogDecodeError::MissingTopic)?;
    if *topic != config.unjail_event_topic {
        return Err(LogDecodeError::TopicMismatch {
            expected: hex::encode(config.unjail_event_topic),
            found: hex::encode(topic),
        });
    }

    let data = &log.data;
    let unjailer = decode_address(word(data, 0)?)?;
    let pubkey = decode_bytes(data, word(data, WORD)?)?;
    // Validated only.
    decode_bytes(data, word(data, 2 * WORD)?)?;

    tracing::trace!(
        tx_hash = %log.tx_hash,
        unjailer = %unjailer,
        pubkey_len = pubkey.len(),
        "decoded unjail log"
    );

    Ok(UnjailRequest::new(block_height, pubkey, unjailer, log.tx_hash))
}

/// ABI-encode an `Unjail` event as the staking contract would emit it.
pub fn encode_unjail_log(
    contract: ExecutionAddress,
    unjailer: &ExecutionAddress,
    validator_uncmp_pubkey: &[u8],
    extra: &[u8],
    tx_hash: TxHash,
    config: &KeeperConfig,
) -> EvmLog {
    let pubkey_tail = encode_bytes_tail(validator_uncmp_pubkey);
    let pubkey_offset = HEAD_LEN;
    let extra_offset = HEAD_LEN + pubkey_tail.len();

    let mut data = Vec::with_capacity(extra_offset + WORD + extra.len() + WORD);
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(unjailer.as_bytes());
    data.extend_from_slice(&usize_word(pubkey_offset));
    data.extend_from_slice(&usize_word(extra_offset));
    data.extend_from_slice(&pubkey_tail);
    data.extend_from_slice(&encode_bytes_tail(extra));

    EvmLog {
        address: contract,
        topics: vec![config.unjail_event_topic],
        data,
        tx_hash,
    }
}

fn word(data: &[u8], at: usize) -> Result<&[u8], LogDecodeError> {
    let end = at
        .checked_add(WORD)
        .ok_or_else(|| LogDecodeError::BadOffset(at.to_string()))?;
    data.get(at..end).ok_or(LogDecodeError::Truncated {
        needed: end,
        actual: data.len(),
    })
}

fn word_to_usize(word: &[u8]) -> Result<usize, LogDecodeError> {
    let (high, low) = word.split_at(WORD - 8);
    if high.iter().any(|b| *b != 0) {
        return Err(LogDecodeError::BadOffset(format!("0x{}", hex::encode(word))));
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(low);
    usize::try_from(u64::from_be_bytes(buf))
        .map_err(|_| LogDecodeError::BadOffset(format!("0x{}", hex::encode(word))))
}

fn decode_address(word: &[u8]) -> Result<ExecutionAddress, LogDecodeError> {
    let (padding, addr) = word.split_at(12);
    if padding.iter().any(|b| *b != 0) {
        return Err(LogDecodeError::BadAddress);
    }
    ExecutionAddress::from_slice(addr).map_err(|_| LogDecodeError::BadAddress)
}

fn decode_bytes(data: &[u8], offset_word: &[u8]) -> Result<Vec<u8>, LogDecodeError> {
    let offset = word_to_usize(offset_word)?;
    if offset < HEAD_LEN || offset % WORD != 0 {
        return Err(LogDecodeError::BadOffset(offset.to_string()));
    }
    let len = word_to_usize(word(data, offset)?)?;
    let start = offset + WORD;
    let end = start
        .checked_add(len)
        .ok_or_else(|| LogDecodeError::BadOffset(len.to_string()))?;
    data.get(start..end)
        .map(<[u8]>::to_vec)
        .ok_or(LogDecodeError::Truncated {
            needed: end,
            actual: data.len(),
        })
}

fn usize_word(n: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&(n as u64).to_be_bytes());
    word
}

fn encode_bytes_tail(bytes: &[u8]) -> Vec<u8> {
    let padded = bytes.len().div_ceil(WORD) * WORD;
    let mut out = Vec::with_capacity(WORD + padded);
    out.extend_from_slice(&usize_word(bytes.len()));
    out.extend_from_slice(bytes);
    out.resize(WORD + padded, 0);
    out
}
