//! In-memory persistence adapters.
//!
//! Table state lives in `RwLock<HashMap>` rows; row-level exclusive locks
//! come from a [`LockMap`] per table. Reads and writes are individually
//! atomic; multi-row protocols get their atomicity from the row locks the
//! use cases hold, mirroring how the relational original leans on
//! `SELECT ... FOR UPDATE`.

use std::collections::HashMap;
use std::sync::{Mutex as StdMutex, RwLock};

use async_trait::async_trait;

use super::locks::LockMap;
use crate::domain::catalog::{Product, ProductRepository};
use crate::domain::ordering::{Order, OrderInsert, OrderRepository};
use crate::domain::payment::{
    ClaimOutcome, IdempotencyRecord, IdempotencyRepository, PaymentReceipt,
};
use crate::domain::reservation::{Hold, HoldRepository};
use crate::domain::shared::{
    HoldId, IdempotencyKey, OrderId, ProductId, Quantity, RowLock, StorageError, Timestamp,
};

fn poisoned(table: &str) -> StorageError {
    StorageError::Backend(format!("poisoned {table} table lock"))
}

/// In-memory implementation of `ProductRepository`.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    rows: RwLock<HashMap<ProductId, Product>>,
    locks: LockMap<ProductId>,
}

impl InMemoryProductRepository {
    /// Create a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn lock(&self, id: &ProductId) -> Result<RowLock, StorageError> {
        self.locks.acquire(id).await
    }

    async fn find(&self, id: &ProductId) -> Result<Option<Product>, StorageError> {
        let rows = self.rows.read().map_err(|_| poisoned("products"))?;
        Ok(rows.get(id).cloned())
    }

    async fn save(&self, product: &Product) -> Result<(), StorageError> {
        let mut rows = self.rows.write().map_err(|_| poisoned("products"))?;
        rows.insert(product.id().clone(), product.clone());
        Ok(())
    }
}

/// In-memory implementation of `HoldRepository`.
#[derive(Debug, Default)]
pub struct InMemoryHoldRepository {
    rows: RwLock<HashMap<HoldId, Hold>>,
    locks: LockMap<HoldId>,
}

impl InMemoryHoldRepository {
    /// Create a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of holds in the store (for tests and diagnostics).
    ///
    /// # Errors
    ///
    /// Returns error if the table lock is poisoned.
    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.rows.read().map_err(|_| poisoned("holds"))?.len())
    }

    /// Whether the store holds no rows.
    ///
    /// # Errors
    ///
    /// Returns error if the table lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl HoldRepository for InMemoryHoldRepository {
    async fn lock(&self, id: &HoldId) -> Result<RowLock, StorageError> {
        self.locks.acquire(id).await
    }

    async fn find(&self, id: &HoldId) -> Result<Option<Hold>, StorageError> {
        let rows = self.rows.read().map_err(|_| poisoned("holds"))?;
        Ok(rows.get(id).cloned())
    }

    async fn insert(&self, hold: &Hold) -> Result<(), StorageError> {
        let mut rows = self.rows.write().map_err(|_| poisoned("holds"))?;
        rows.insert(hold.id().clone(), hold.clone());
        Ok(())
    }

    async fn save(&self, hold: &Hold) -> Result<(), StorageError> {
        let mut rows = self.rows.write().map_err(|_| poisoned("holds"))?;
        rows.insert(hold.id().clone(), hold.clone());
        Ok(())
    }

    async fn delete(&self, id: &HoldId) -> Result<(), StorageError> {
        let mut rows = self.rows.write().map_err(|_| poisoned("holds"))?;
        rows.remove(id);
        Ok(())
    }

    async fn active_quantity_for(
        &self,
        product_id: &ProductId,
        now: Timestamp,
    ) -> Result<Quantity, StorageError> {
        let rows = self.rows.read().map_err(|_| poisoned("holds"))?;
        Ok(rows
            .values()
            .filter(|hold| hold.product_id() == product_id && hold.is_active(now))
            .fold(Quantity::ZERO, |sum, hold| {
                sum.saturating_add(hold.quantity())
            }))
    }

    async fn expired_as_of(&self, now: Timestamp) -> Result<Vec<HoldId>, StorageError> {
        let rows = self.rows.read().map_err(|_| poisoned("holds"))?;
        Ok(rows
            .values()
            .filter(|hold| !hold.is_consumed() && hold.is_expired(now))
            .map(|hold| hold.id().clone())
            .collect())
    }
}

/// In-memory implementation of `OrderRepository`.
///
/// Keeps a `hold_id` index alongside the rows, standing in for the unique
/// constraint the relational schema places on `orders.hold_id`.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    rows: RwLock<HashMap<OrderId, Order>>,
    hold_index: RwLock<HashMap<HoldId, OrderId>>,
    locks: LockMap<OrderId>,
}

impl InMemoryOrderRepository {
    /// Create a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn lock(&self, id: &OrderId) -> Result<RowLock, StorageError> {
        self.locks.acquire(id).await
    }

    async fn find(&self, id: &OrderId) -> Result<Option<Order>, StorageError> {
        let rows = self.rows.read().map_err(|_| poisoned("orders"))?;
        Ok(rows.get(id).cloned())
    }

    async fn find_by_hold(&self, hold_id: &HoldId) -> Result<Option<Order>, StorageError> {
        let index = self.hold_index.read().map_err(|_| poisoned("orders"))?;
        let rows = self.rows.read().map_err(|_| poisoned("orders"))?;
        Ok(index.get(hold_id).and_then(|id| rows.get(id)).cloned())
    }

    async fn insert(&self, order: &Order) -> Result<OrderInsert, StorageError> {
        let mut index = self.hold_index.write().map_err(|_| poisoned("orders"))?;
        if index.contains_key(order.hold_id()) {
            return Ok(OrderInsert::DuplicateHold);
        }
        let mut rows = self.rows.write().map_err(|_| poisoned("orders"))?;
        index.insert(order.hold_id().clone(), order.id().clone());
        rows.insert(order.id().clone(), order.clone());
        Ok(OrderInsert::Inserted)
    }

    async fn save(&self, order: &Order) -> Result<(), StorageError> {
        let mut rows = self.rows.write().map_err(|_| poisoned("orders"))?;
        rows.insert(order.id().clone(), order.clone());
        Ok(())
    }
}

/// In-memory implementation of `IdempotencyRepository`.
///
/// The table mutex makes `claim` an atomic insert-or-observe, which is the
/// key-level uniqueness race the resolver depends on.
#[derive(Debug, Default)]
pub struct InMemoryIdempotencyRepository {
    rows: StdMutex<HashMap<IdempotencyKey, IdempotencyRecord>>,
}

impl InMemoryIdempotencyRepository {
    /// Create a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records for a key: 0 or 1 (for tests and diagnostics).
    ///
    /// # Errors
    ///
    /// Returns error if the table lock is poisoned.
    pub fn count(&self, key: &IdempotencyKey) -> Result<usize, StorageError> {
        let rows = self.rows.lock().map_err(|_| poisoned("idempotency_keys"))?;
        Ok(usize::from(rows.contains_key(key)))
    }
}

#[async_trait]
impl IdempotencyRepository for InMemoryIdempotencyRepository {
    async fn find(&self, key: &IdempotencyKey) -> Result<Option<IdempotencyRecord>, StorageError> {
        let rows = self.rows.lock().map_err(|_| poisoned("idempotency_keys"))?;
        Ok(rows.get(key).cloned())
    }

    async fn claim(
        &self,
        key: &IdempotencyKey,
        order_id: &OrderId,
        now: Timestamp,
    ) -> Result<ClaimOutcome, StorageError> {
        let mut rows = self.rows.lock().map_err(|_| poisoned("idempotency_keys"))?;
        if let Some(existing) = rows.get(key) {
            return Ok(ClaimOutcome::Existing(existing.clone()));
        }
        rows.insert(
            key.clone(),
            IdempotencyRecord::claim(key.clone(), order_id.clone(), now),
        );
        Ok(ClaimOutcome::Claimed)
    }

    async fn complete(
        &self,
        key: &IdempotencyKey,
        receipt: PaymentReceipt,
    ) -> Result<(), StorageError> {
        let mut rows = self.rows.lock().map_err(|_| poisoned("idempotency_keys"))?;
        match rows.get_mut(key) {
            Some(record) => {
                record.resolve(receipt);
                Ok(())
            }
            None => Err(StorageError::Corruption(format!(
                "completing unclaimed idempotency key {key}"
            ))),
        }
    }

    async fn release(&self, key: &IdempotencyKey) -> Result<(), StorageError> {
        let mut rows = self.rows.lock().map_err(|_| poisoned("idempotency_keys"))?;
        rows.remove(key);
        Ok(())
    }
}
