//! Hold repository trait.

use async_trait::async_trait;

use super::Hold;
use crate::domain::shared::{HoldId, ProductId, Quantity, RowLock, StorageError, Timestamp};

/// Repository trait for Hold persistence.
///
/// The hold's `RowLock` linearizes finalization, release after a failed
/// payment, and reaping for a single hold.
#[async_trait]
pub trait HoldRepository: Send + Sync {
    /// Acquire the exclusive row lock for a hold.
    ///
    /// # Errors
    ///
    /// Returns error if the storage backend fails.
    async fn lock(&self, id: &HoldId) -> Result<RowLock, StorageError>;

    /// Read a hold row.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find(&self, id: &HoldId) -> Result<Option<Hold>, StorageError>;

    /// Insert a new hold.
    ///
    /// # Errors
    ///
    /// Returns error if persistence fails.
    async fn insert(&self, hold: &Hold) -> Result<(), StorageError>;

    /// Persist an updated hold row.
    ///
    /// # Errors
    ///
    /// Returns error if persistence fails.
    async fn save(&self, hold: &Hold) -> Result<(), StorageError>;

    /// Delete a hold row. Deleting an absent row is a no-op.
    ///
    /// # Errors
    ///
    /// Returns error if the deletion fails.
    async fn delete(&self, id: &HoldId) -> Result<(), StorageError>;

    /// Sum of quantities across unconsumed holds for `product_id` whose
    /// deadline is strictly after `now`. Point-in-time read used by the
    /// stock ledger.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn active_quantity_for(
        &self,
        product_id: &ProductId,
        now: Timestamp,
    ) -> Result<Quantity, StorageError>;

    /// Ids of unconsumed holds with `expires_at <= now`, for the reaper.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn expired_as_of(&self, now: Timestamp) -> Result<Vec<HoldId>, StorageError>;
}
