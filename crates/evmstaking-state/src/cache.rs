//! # Speculative Cache View
//!
//! A `CacheView` stages writes on top of a parent store. Reads see the
//! staged writes first and fall through to the parent otherwise.
//!
//! ## Lifecycle
//!
//! ```text
//! open ──▶ staging ──▶ commit()   (overlay flushed to parent in one batch)
//!                 └──▶ discard()  (overlay dropped, parent untouched)
//! ```
//!
//! Both terminal operations take `self` by value, so a view resolves
//! exactly once. Dropping a view without resolving it is a discard.

use std::collections::BTreeMap;

use crate::store::{KvStore, StoreError, WriteBatch};

/// An isolated, speculative overlay on a parent store.
pub struct CacheView<'a> {
    parent: &'a mut (dyn KvStore + 'a),
    overlay: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    resolved: bool,
}

impl<'a> CacheView<'a> {
    /// Open a view over `parent`. The parent stays exclusively borrowed
    /// until the view is resolved.
    pub fn new(parent: &'a mut (dyn KvStore + 'a)) -> Self {
        Self {
            parent,
            overlay: BTreeMap::new(),
            resolved: false,
        }
    }

    /// Number of staged writes (including deletes).
    pub fn pending_writes(&self) -> usize {
        self.overlay.len()
    }

    /// Flush the staged writes into the parent and close the view.
    ///
    /// Returns the number of keys written.
    pub fn commit(mut self) -> Result<usize, StoreError> {
        let batch: WriteBatch = std::mem::take(&mut self.overlay).into_iter().collect();
        let written = batch.len();
        self.resolved = true;
        self.parent.write_batch(batch)?;
        Ok(written)
    }

    /// Drop the staged writes and close the view.
    ///
    /// Returns the number of writes thrown away.
    pub fn discard(mut self) -> usize {
        let dropped = self.overlay.len();
        self.overlay.clear();
        self.resolved = true;
        dropped
    }
}

impl KvStore for CacheView<'_> {
    fn block_height(&self) -> i64 {
        self.parent.block_height()
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.overlay.get(key) {
            Some(staged) => Ok(staged.clone()),
            None => self.parent.get(key),
        }
    }

    fn set(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), StoreError> {
        self.overlay.insert(key.to_vec(), Some(value));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
        self.overlay.insert(key.to_vec(), None);
        Ok(())
    }
}

impl std::fmt::Debug for CacheView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheView")
            .field("pending_writes", &self.overlay.len())
            .field("resolved", &self.resolved)
            .finish()
    }
}

impl Drop for CacheView<'_> {
    fn drop(&mut self) {
        if !self.resolved && !self.overlay.is_empty() {
            tracing::debug!(
                pending_writes = self.overlay.len(),
                "cache view dropped unresolved; discarding staged writes"
            );
        }
    }
}
