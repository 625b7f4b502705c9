//! Data transfer objects returned by the use cases.

use serde::{Deserialize, Serialize};

use crate::domain::ordering::OrderStatus;
use crate::domain::shared::{HoldId, Money, OrderId, ProductId, Quantity, Timestamp};

/// Result of placing a hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldReceipt {
    /// Identifier for the new hold.
    pub hold_id: HoldId,
    /// Absolute deadline after which the hold lapses.
    pub expires_at: Timestamp,
}

/// Result of finalizing a hold into an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderReceipt {
    /// Identifier for the new order.
    pub order_id: OrderId,
    /// Order lifecycle status.
    pub status: OrderStatus,
    /// Order total at the price in effect when finalized.
    pub total: Money,
}

/// Catalog read model for product display.
///
/// `available` is the derived figure shown to shoppers; it may lag live
/// availability by up to the cache TTL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductView {
    /// Product identifier.
    pub product_id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: Money,
    /// Units a shopper could currently reserve.
    pub available: Quantity,
}
