//! # Key/Value Store
//!
//! The storage seam between the processor and the host's state backend.
//! Keys and values are raw bytes; typed values are JSON-encoded through
//! [`get_json`] and [`set_json`].

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// A batch of writes. `None` deletes the key.
pub type WriteBatch = Vec<(Vec<u8>, Option<Vec<u8>>)>;

/// Errors from the state store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A stored value could not be encoded or decoded.
    #[error("codec error for key {key}: {source}")]
    Codec {
        /// Hex of the offending key.
        key: String,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// The backend failed.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Byte-keyed state with a notion of the current block height.
pub trait KvStore {
    /// Height of the block being processed.
    fn block_height(&self) -> i64;

    /// Read a value.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write a value.
    fn set(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), StoreError>;

    /// Delete a value. Deleting an absent key is not an error.
    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError>;

    /// Apply a batch of writes in order, all or nothing.
    ///
    /// The default applies each write through [`set`](Self::set) and
    /// [`delete`](Self::delete), recording the previous value of every key
    /// first. If a write fails, the keys already touched are restored in
    /// reverse order and the original error is returned. Backends with a
    /// native atomic batch should override this.
    fn write_batch(&mut self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut undo: WriteBatch = Vec::with_capacity(batch.len());
        for (key, value) in batch {
            let previous = match self.get(&key) {
                Ok(previous) => previous,
                Err(e) => {
                    rollback(self, undo);
                    return Err(e);
                }
            };
            undo.push((key.clone(), previous));
            let applied = match value {
                Some(v) => self.set(&key, v),
                None => self.delete(&key),
            };
            if let Err(e) = applied {
                rollback(self, undo);
                return Err(e);
            }
        }
        Ok(())
    }
}

fn rollback<S: KvStore + ?Sized>(store: &mut S, undo: WriteBatch) {
    let touched = undo.len();
    for (key, previous) in undo.into_iter().rev() {
        let restored = match previous {
            Some(v) => store.set(&key, v),
            None => store.delete(&key),
        };
        if let Err(e) = restored {
            tracing::error!(
                key = %hex::encode(&key),
                error = %e,
                "failed to restore key while rolling back write batch"
            );
        }
    }
    tracing::debug!(touched, "rolled back partial write batch");
}

/// Build a key from a one-byte collection prefix and a suffix.
pub fn prefixed_key(prefix: u8, suffix: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + suffix.len());
    key.push(prefix);
    key.extend_from_slice(suffix);
    key
}

/// Read and decode a JSON value.
pub fn get_json<T: DeserializeOwned>(
    store: &dyn KvStore,
    key: &[u8],
) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Codec {
                key: hex_key(key),
                source,
            }),
        None => Ok(None),
    }
}

/// Encode and write a JSON value.
pub fn set_json<T: Serialize>(
    store: &mut dyn KvStore,
    key: &[u8],
    value: &T,
) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec(value).map_err(|source| StoreError::Codec {
        key: hex_key(key),
        source,
    })?;
    store.set(key, bytes)
}

fn hex_key(key: &[u8]) -> String {
    hex::encode(key)
}

// ---------------------------------------------------------------------------
// MemStore
// ---------------------------------------------------------------------------

/// In-memory authoritative store.
///
/// `Clone + PartialEq`, so a snapshot taken before a request can be
/// compared with the store afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemStore {
    block_height: i64,
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    /// Create an empty store at the given height.
    pub fn new(block_height: i64) -> Self {
        Self {
            block_height,
            data: BTreeMap::new(),
        }
    }

    /// Move to another block height.
    pub fn set_block_height(&mut self, height: i64) {
        self.block_height = height;
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl KvStore for MemStore {
    fn block_height(&self) -> i64 {
        self.block_height
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), StoreError> {
        self.data.insert(key.to_vec(), value);
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.data.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        n: u64,
    }

    #[test]
    fn test_set_get_delete() {
        let mut store = MemStore::new(1);
        store.set(b"k", b"v".to_vec()).unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
        store.delete(b"k").unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
        store.delete(b"k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_write_batch_applies_in_order() {
        let mut store = MemStore::new(1);
        store.set(b"gone", b"x".to_vec()).unwrap();
        store
            .write_batch(vec![
                (b"a".to_vec(), Some(b"1".to_vec())),
                (b"a".to_vec(), Some(b"2".to_vec())),
                (b"gone".to_vec(), None),
            ])
            .unwrap();
        assert_eq!(store.get(b"a").unwrap(), Some(b"2".to_vec()));
        assert_eq!(store.get(b"gone").unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    /// Fails the `n`th call to `set`, counting from zero.
    struct FailingSetStore {
        inner: MemStore,
        fail_on: usize,
        sets: usize,
    }

    impl KvStore for FailingSetStore {
        fn block_height(&self) -> i64 {
            self.inner.block_height()
        }
        fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
            self.inner.get(key)
        }
        fn set(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), StoreError> {
            let call = self.sets;
            self.sets += 1;
            if call == self.fail_on {
                return Err(StoreError::Backend("disk full".into()));
            }
            self.inner.set(key, value)
        }
        fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
            self.inner.delete(key)
        }
    }

    #[test]
    fn test_write_batch_failure_restores_touched_keys() {
        let mut inner = MemStore::new(1);
        inner.set(b"a", b"old".to_vec()).unwrap();
        inner.set(b"gone", b"kept".to_vec()).unwrap();
        let before = inner.clone();
        let mut store = FailingSetStore {
            inner,
            fail_on: 2,
            sets: 0,
        };

        let result = store.write_batch(vec![
            (b"a".to_vec(), Some(b"new".to_vec())),
            (b"gone".to_vec(), None),
            (b"fresh".to_vec(), Some(b"1".to_vec())),
            (b"c".to_vec(), Some(b"3".to_vec())),
        ]);

        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert_eq!(store.inner, before);
    }

    #[test]
    fn test_write_batch_first_write_failure_changes_nothing() {
        let mut inner = MemStore::new(1);
        inner.set(b"a", b"old".to_vec()).unwrap();
        let before = inner.clone();
        let mut store = FailingSetStore {
            inner,
            fail_on: 0,
            sets: 0,
        };
        assert!(store
            .write_batch(vec![(b"a".to_vec(), Some(b"new".to_vec()))])
            .is_err());
        assert_eq!(store.inner, before);
    }

    #[test]
    fn test_json_helpers() {
        let mut store = MemStore::new(1);
        set_json(&mut store, b"s", &Sample { n: 9 }).unwrap();
        let read: Option<Sample> = get_json(&store, b"s").unwrap();
        assert_eq!(read, Some(Sample { n: 9 }));
        let missing: Option<Sample> = get_json(&store, b"none").unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_json_decode_error_names_key() {
        let mut store = MemStore::new(1);
        store.set(&[0xab, 0x01], b"not json".to_vec()).unwrap();
        let err = get_json::<Sample>(&store, &[0xab, 0x01]).unwrap_err();
        assert!(err.to_string().contains("ab01"));
    }

    #[test]
    fn test_prefixed_key() {
        assert_eq!(prefixed_key(0x21, &[1, 2]), vec![0x21, 1, 2]);
    }

    #[test]
    fn test_block_height() {
        let mut store = MemStore::new(10);
        assert_eq!(store.block_height(), 10);
        store.set_block_height(11);
        assert_eq!(store.block_height(), 11);
    }
}
