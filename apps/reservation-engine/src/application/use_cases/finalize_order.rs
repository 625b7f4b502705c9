//! Convert a valid hold into a pending order.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::application::dto::OrderReceipt;
use crate::application::errors::{ConflictReason, EngineError};
use crate::application::services::StockLedger;
use crate::domain::catalog::ProductRepository;
use crate::domain::ordering::{Order, OrderInsert, OrderRepository};
use crate::domain::reservation::HoldRepository;
use crate::domain::shared::{HoldId, Timestamp};

/// Use case: finalize a hold into a pending order at the current price.
///
/// Runs under the hold's row lock so a hold converts at most once. Stock
/// is not deducted here; the hold stays consumed and the deduction happens
/// when the payment resolves.
pub struct FinalizeOrder<P, H, O> {
    products: Arc<P>,
    holds: Arc<H>,
    orders: Arc<O>,
    ledger: Arc<StockLedger<P, H>>,
}

impl<P, H, O> FinalizeOrder<P, H, O>
where
    P: ProductRepository,
    H: HoldRepository,
    O: OrderRepository,
{
    /// Create the use case.
    pub fn new(
        products: Arc<P>,
        holds: Arc<H>,
        orders: Arc<O>,
        ledger: Arc<StockLedger<P, H>>,
    ) -> Self {
        Self {
            products,
            holds,
            orders,
            ledger,
        }
    }

    /// Execute the use case.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the hold was already reaped or the product
    /// is gone, `Conflict(HoldInvalidOrExpired)` when the hold is consumed
    /// or has lapsed, `Conflict(HoldAlreadyUsed)` when an order already
    /// references the hold, or `Storage` on persistence failure.
    #[instrument(skip(self), fields(hold_id = %hold_id))]
    pub async fn execute(&self, hold_id: &HoldId) -> Result<OrderReceipt, EngineError> {
        let _hold_lock = self.holds.lock(hold_id).await?;

        let mut hold = self
            .holds
            .find(hold_id)
            .await?
            .ok_or_else(|| EngineError::NotFound {
                entity: "hold",
                id: hold_id.to_string(),
            })?;

        // A consumed or lapsed hold is simply unusable; "already used" is
        // reserved for the order-existence check below.
        let now = Timestamp::now();
        if !hold.is_valid(now) {
            return Err(EngineError::Conflict(ConflictReason::HoldInvalidOrExpired));
        }
        if self.orders.find_by_hold(hold_id).await?.is_some() {
            return Err(EngineError::Conflict(ConflictReason::HoldAlreadyUsed));
        }

        // Price is read without the product lock; finalization never writes
        // the product row, so it must not contend with hold admission.
        let product = self
            .products
            .find(hold.product_id())
            .await?
            .ok_or_else(|| EngineError::NotFound {
                entity: "product",
                id: hold.product_id().to_string(),
            })?;

        hold.consume();
        self.holds.save(&hold).await?;

        let order = Order::from_consumed_hold(
            hold.id().clone(),
            hold.product_id().clone(),
            hold.quantity(),
            product.price(),
            now,
        );
        if self.orders.insert(&order).await? == OrderInsert::DuplicateHold {
            // The unique index beat the under-lock existence check. Undo
            // the consumption so no partial state survives the conflict.
            hold.release();
            self.holds.save(&hold).await?;
            return Err(EngineError::Conflict(ConflictReason::HoldAlreadyUsed));
        }
        self.ledger.invalidate(hold.product_id());

        info!(order_id = %order.id(), total = %order.total(), "order finalized");
        Ok(OrderReceipt {
            order_id: order.id().clone(),
            status: order.status(),
            total: order.total(),
        })
    }
}
