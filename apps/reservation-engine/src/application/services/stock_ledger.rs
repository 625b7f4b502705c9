//! Stock ledger: derived availability with a short-TTL display cache.
//!
//! Availability is never stored; it is computed as committed stock minus
//! the sum of active, unconsumed hold quantities. The cache only serves
//! display reads. Admission decisions always recompute from live state
//! while the caller holds the product's row lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::application::errors::EngineError;
use crate::domain::catalog::ProductRepository;
use crate::domain::reservation::HoldRepository;
use crate::domain::shared::{ProductId, Quantity, Timestamp};

struct CachedAvailability {
    value: Quantity,
    fetched_at: Instant,
}

/// TTL cache for per-product availability figures.
///
/// Advisory only: a poisoned cache mutex degrades to cache misses rather
/// than failing the read path.
pub struct AvailabilityCache {
    ttl: Duration,
    entries: Mutex<HashMap<ProductId, CachedAvailability>>,
}

impl AvailabilityCache {
    /// Create an empty cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached figure for `product_id` if a fresh entry exists.
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<Quantity> {
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(product_id)?;
        if entry.fetched_at.elapsed() < self.ttl {
            Some(entry.value)
        } else {
            None
        }
    }

    /// Store a freshly computed figure.
    pub fn set(&self, product_id: ProductId, value: Quantity) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                product_id,
                CachedAvailability {
                    value,
                    fetched_at: Instant::now(),
                },
            );
        }
    }

    /// Drop the entry for `product_id` after a state change.
    pub fn invalidate(&self, product_id: &ProductId) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(product_id);
        }
    }
}

/// Availability read service over the product and hold repositories.
pub struct StockLedger<P, H> {
    products: Arc<P>,
    holds: Arc<H>,
    cache: AvailabilityCache,
}

impl<P, H> StockLedger<P, H>
where
    P: ProductRepository,
    H: HoldRepository,
{
    /// Create a ledger with the given display-cache TTL.
    pub fn new(products: Arc<P>, holds: Arc<H>, cache_ttl: Duration) -> Self {
        Self {
            products,
            holds,
            cache: AvailabilityCache::new(cache_ttl),
        }
    }

    /// Live availability, computed from current state.
    ///
    /// Admission gating calls this while holding the product's row lock so
    /// the figure cannot go stale between the check and the insert.
    ///
    /// # Errors
    ///
    /// Returns error if the product does not exist or a query fails.
    pub async fn available(
        &self,
        product_id: &ProductId,
        now: Timestamp,
    ) -> Result<Quantity, EngineError> {
        let product =
            self.products
                .find(product_id)
                .await?
                .ok_or_else(|| EngineError::NotFound {
                    entity: "product",
                    id: product_id.to_string(),
                })?;
        let reserved = self.holds.active_quantity_for(product_id, now).await?;
        Ok(product.available_given(reserved))
    }

    /// Availability for display, served from the cache when fresh.
    ///
    /// May overstate or understate the live figure by up to the cache TTL;
    /// never used for admission decisions.
    ///
    /// # Errors
    ///
    /// Returns error if the product does not exist or a query fails.
    pub async fn available_cached(
        &self,
        product_id: &ProductId,
        now: Timestamp,
    ) -> Result<Quantity, EngineError> {
        if let Some(cached) = self.cache.get(product_id) {
            return Ok(cached);
        }
        let value = self.available(product_id, now).await?;
        self.cache.set(product_id.clone(), value);
        Ok(value)
    }

    /// Drop the cached figure for `product_id` after any write that moves
    /// availability.
    pub fn invalidate(&self, product_id: &ProductId) {
        self.cache.invalidate(product_id);
    }
}
