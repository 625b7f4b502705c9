//! Product repository trait.
//!
//! Defines the persistence abstraction for products.
//! Implemented by adapters in the infrastructure layer.

use async_trait::async_trait;

use super::Product;
use crate::domain::shared::{ProductId, RowLock, StorageError};

/// Repository trait for Product persistence.
///
/// `lock` acquires the product row's exclusive lock. Every reservation
/// decision and every stock mutation for a product happens while its
/// `RowLock` is held; this is what linearizes them.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Acquire the exclusive row lock for a product.
    ///
    /// Suspends until the current holder releases it. Locking does not
    /// verify existence; pair with `find`.
    ///
    /// # Errors
    ///
    /// Returns error if the storage backend fails.
    async fn lock(&self, id: &ProductId) -> Result<RowLock, StorageError>;

    /// Read a product row.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails.
    async fn find(&self, id: &ProductId) -> Result<Option<Product>, StorageError>;

    /// Persist a product row (insert or update).
    ///
    /// # Errors
    ///
    /// Returns error if persistence fails.
    async fn save(&self, product: &Product) -> Result<(), StorageError>;
}
