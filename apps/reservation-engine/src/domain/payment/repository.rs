//! Idempotency record repository trait.

use async_trait::async_trait;

use super::{IdempotencyRecord, PaymentReceipt};
use crate::domain::shared::{IdempotencyKey, OrderId, StorageError, Timestamp};

/// Result of attempting to claim an idempotency key.
#[derive(Debug, Clone)]
pub enum ClaimOutcome {
    /// This delivery inserted the record and owns the key's side effects.
    Claimed,
    /// Another delivery already inserted the record. If its `response` is
    /// populated the result is replayable; otherwise the first delivery is
    /// still in flight.
    Existing(IdempotencyRecord),
}

/// Repository trait for idempotency records.
///
/// `claim` is the key-level mutual exclusion point: for a given key it
/// returns `Claimed` to exactly one caller ever, regardless of concurrency.
#[async_trait]
pub trait IdempotencyRepository: Send + Sync {
    /// Read a record without claiming it (fast replay path).
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find(&self, key: &IdempotencyKey) -> Result<Option<IdempotencyRecord>, StorageError>;

    /// Atomically insert a pending record for `key`, or observe the
    /// existing one.
    ///
    /// # Errors
    ///
    /// Returns error if persistence fails.
    async fn claim(
        &self,
        key: &IdempotencyKey,
        order_id: &OrderId,
        now: Timestamp,
    ) -> Result<ClaimOutcome, StorageError>;

    /// Store the result for a claimed key. Called once per key.
    ///
    /// # Errors
    ///
    /// Returns error if the record is missing or persistence fails.
    async fn complete(
        &self,
        key: &IdempotencyKey,
        receipt: PaymentReceipt,
    ) -> Result<(), StorageError>;

    /// Roll back an unresolved claim after a failed unit of work, so a
    /// redelivery can start fresh. Releasing an absent key is a no-op.
    ///
    /// # Errors
    ///
    /// Returns error if the deletion fails.
    async fn release(&self, key: &IdempotencyKey) -> Result<(), StorageError>;
}
