//! Order repository trait.

use async_trait::async_trait;

use super::Order;
use crate::domain::shared::{HoldId, OrderId, RowLock, StorageError};

/// Outcome of inserting an order against the unique `hold_id` constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderInsert {
    /// Row inserted; this order now owns the hold.
    Inserted,
    /// Another order already references the same hold.
    DuplicateHold,
}

/// Repository trait for Order persistence.
///
/// The store enforces at most one order per hold (unique `hold_id`), which
/// backs the finalizer's under-lock existence check.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Acquire the exclusive row lock for an order.
    ///
    /// # Errors
    ///
    /// Returns error if the storage backend fails.
    async fn lock(&self, id: &OrderId) -> Result<RowLock, StorageError>;

    /// Read an order row.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find(&self, id: &OrderId) -> Result<Option<Order>, StorageError>;

    /// Find the order referencing a hold, if any.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find_by_hold(&self, hold_id: &HoldId) -> Result<Option<Order>, StorageError>;

    /// Insert a new order, enforcing hold uniqueness.
    ///
    /// # Errors
    ///
    /// Returns error if persistence fails.
    async fn insert(&self, order: &Order) -> Result<OrderInsert, StorageError>;

    /// Persist an updated order row.
    ///
    /// # Errors
    ///
    /// Returns error if persistence fails.
    async fn save(&self, order: &Order) -> Result<(), StorageError>;
}
