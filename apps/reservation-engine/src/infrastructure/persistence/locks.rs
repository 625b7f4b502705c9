//! Per-key lock registry backing row-level exclusive locks.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex as AsyncMutex;

use crate::domain::shared::{RowLock, StorageError};

/// Lazily-populated registry of per-row async mutexes.
///
/// Each distinct key gets its own `tokio::sync::Mutex`; acquiring it yields
/// the row's [`RowLock`]. Entries are kept for the life of the store so
/// that every worker contends on the same mutex for a given row. Lock
/// entries for deleted rows are harmless: every protocol re-reads the row
/// after acquisition and treats an absent row as gone.
#[derive(Debug)]
pub struct LockMap<K> {
    entries: StdMutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> Default for LockMap<K> {
    fn default() -> Self {
        Self {
            entries: StdMutex::new(HashMap::new()),
        }
    }
}

impl<K> LockMap<K>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: StdMutex::new(HashMap::new()),
        }
    }

    /// Acquire the exclusive lock for `key`, suspending until available.
    ///
    /// # Errors
    ///
    /// Returns error if the registry itself is poisoned.
    pub async fn acquire(&self, key: &K) -> Result<RowLock, StorageError> {
        let row = {
            let mut entries = self
                .entries
                .lock()
                .map_err(|_| StorageError::Backend("poisoned lock registry".to_string()))?;
            Arc::clone(
                entries
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };
        Ok(RowLock::new(row.lock_owned().await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_is_mutually_exclusive() {
        let locks = Arc::new(LockMap::new());
        let held = locks.acquire(&"row-a").await.unwrap();

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move { locks.acquire(&"row-a").await.unwrap() })
        };

        // The contender cannot finish while the lock is held.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(held);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn different_keys_do_not_contend() {
        let locks = LockMap::new();
        let _a = locks.acquire(&"row-a").await.unwrap();
        // Must not deadlock.
        let _b = locks.acquire(&"row-b").await.unwrap();
    }

    #[tokio::test]
    async fn reacquire_after_release() {
        let locks = LockMap::new();
        let first = locks.acquire(&1u32).await.unwrap();
        drop(first);
        let _second = locks.acquire(&1u32).await.unwrap();
    }
}
