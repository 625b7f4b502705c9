//! Row-level exclusive lock guard.
//!
//! Repositories hand out a [`RowLock`] for a single entity row. Holding the
//! guard gives the caller exclusive write access to that row until drop;
//! concurrent workers suspend at acquisition. This is the engine's
//! equivalent of a relational `SELECT ... FOR UPDATE`.

use tokio::sync::OwnedMutexGuard;

/// Exclusive lock over one entity row.
///
/// The guard is owned (not borrowed from the repository) so it can be held
/// across await points for the duration of a unit of work. Dropping it
/// releases the row.
#[derive(Debug)]
pub struct RowLock {
    _guard: OwnedMutexGuard<()>,
}

impl RowLock {
    /// Wrap an acquired per-row mutex guard.
    #[must_use]
    pub fn new(guard: OwnedMutexGuard<()>) -> Self {
        Self { _guard: guard }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[tokio::test]
    async fn row_lock_is_exclusive_until_dropped() {
        let row = Arc::new(Mutex::new(()));

        let lock = RowLock::new(row.clone().lock_owned().await);
        assert!(row.clone().try_lock_owned().is_err());

        drop(lock);
        assert!(row.clone().try_lock_owned().is_ok());
    }
}
