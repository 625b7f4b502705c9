//! Hold entity: a time-boxed soft reservation.
//!
//! A hold reserves N units of a product until an absolute deadline. It is
//! not a committed order; capacity returns to the pool when the hold lapses
//! unconsumed. State machine: Active -> Consumed (finalized into an order)
//! or Active -> Expired (reaped after the deadline). A failed payment
//! releases a consumed hold back to unconsumed.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::shared::{HoldId, ProductId, Quantity, Timestamp};

/// A soft reservation of stock against one product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hold {
    id: HoldId,
    product_id: ProductId,
    quantity: Quantity,
    expires_at: Timestamp,
    consumed: bool,
    created_at: Timestamp,
}

impl Hold {
    /// Create a new active hold with a fixed lifetime from `now`.
    #[must_use]
    pub fn new(product_id: ProductId, quantity: Quantity, ttl: Duration, now: Timestamp) -> Self {
        Self {
            id: HoldId::generate(),
            product_id,
            quantity,
            expires_at: now.plus(ttl),
            consumed: false,
            created_at: now,
        }
    }

    /// Hold identifier.
    #[must_use]
    pub fn id(&self) -> &HoldId {
        &self.id
    }

    /// Owning product.
    #[must_use]
    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    /// Reserved unit count.
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Absolute expiry deadline.
    #[must_use]
    pub const fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    /// Whether the hold has been converted into an order.
    #[must_use]
    pub const fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Creation time.
    #[must_use]
    pub const fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// True once the deadline has passed.
    #[must_use]
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_at_or_before(now)
    }

    /// True while the hold can still be finalized: unconsumed and unexpired.
    #[must_use]
    pub fn is_valid(&self, now: Timestamp) -> bool {
        !self.consumed && !self.is_expired(now)
    }

    /// True if the hold counts against availability: unconsumed with a
    /// future deadline.
    #[must_use]
    pub fn is_active(&self, now: Timestamp) -> bool {
        !self.consumed && !self.is_expired(now)
    }

    /// Mark the hold as converted into an order.
    pub fn consume(&mut self) {
        self.consumed = true;
    }

    /// Return the hold to the unconsumed pool after a failed payment.
    ///
    /// If the deadline has already lapsed the hold only re-enters the
    /// reaper-eligible pool, not immediate availability.
    pub fn release(&mut self) {
        self.consumed = false;
    }
}
