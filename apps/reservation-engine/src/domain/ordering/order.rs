//! Order entity.
//!
//! An order is the pending commitment created from exactly one consumed
//! hold. Its status is monotonic: once paid or cancelled it never changes
//! again, which backs the resolver's terminal-state no-op guard.

use serde::{Deserialize, Serialize};

use super::OrderStatus;
use crate::domain::shared::{DomainError, HoldId, Money, OrderId, ProductId, Quantity, Timestamp};

/// A pending, paid, or cancelled purchase created from a consumed hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    hold_id: HoldId,
    product_id: ProductId,
    quantity: Quantity,
    total: Money,
    status: OrderStatus,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Order {
    /// Create a pending order from a just-consumed hold.
    ///
    /// `total` is the hold quantity times the product's unit price; the
    /// caller computes it while the hold lock is held.
    #[must_use]
    pub fn from_consumed_hold(
        hold_id: HoldId,
        product_id: ProductId,
        quantity: Quantity,
        unit_price: Money,
        now: Timestamp,
    ) -> Self {
        Self {
            id: OrderId::generate(),
            hold_id,
            product_id,
            quantity,
            total: unit_price.times(quantity),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Order identifier.
    #[must_use]
    pub fn id(&self) -> &OrderId {
        &self.id
    }

    /// The consumed hold this order was finalized from.
    #[must_use]
    pub fn hold_id(&self) -> &HoldId {
        &self.hold_id
    }

    /// Purchased product.
    #[must_use]
    pub fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    /// Purchased unit count.
    #[must_use]
    pub const fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Order total.
    #[must_use]
    pub const fn total(&self) -> Money {
        self.total
    }

    /// Current lifecycle status.
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    /// Creation time.
    #[must_use]
    pub const fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Last transition time.
    #[must_use]
    pub const fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Transition `Pending -> Paid`.
    ///
    /// # Errors
    ///
    /// Returns error if the order is already terminal.
    pub fn mark_paid(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition(OrderStatus::Paid, now)
    }

    /// Transition `Pending -> Cancelled`.
    ///
    /// # Errors
    ///
    /// Returns error if the order is already terminal.
    pub fn mark_cancelled(&mut self, now: Timestamp) -> Result<(), DomainError> {
        self.transition(OrderStatus::Cancelled, now)
    }

    fn transition(&mut self, to: OrderStatus, now: Timestamp) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidStateTransition {
                entity: "Order".to_string(),
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        self.updated_at = now;
        Ok(())
    }
}
