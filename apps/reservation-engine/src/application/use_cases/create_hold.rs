//! Place a time-boxed hold against a product's availability.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument};

use crate::application::dto::HoldReceipt;
use crate::application::errors::EngineError;
use crate::application::services::StockLedger;
use crate::domain::catalog::ProductRepository;
use crate::domain::reservation::{Hold, HoldRepository};
use crate::domain::shared::{ProductId, Quantity, Timestamp};

/// Use case: reserve `quantity` units of a product for a fixed lifetime.
///
/// The whole check-then-insert runs under the product's row lock, so two
/// racing requests for the last units serialize and the loser sees the
/// winner's hold in the availability sum.
pub struct CreateHold<P, H> {
    products: Arc<P>,
    holds: Arc<H>,
    ledger: Arc<StockLedger<P, H>>,
    hold_ttl: Duration,
}

impl<P, H> CreateHold<P, H>
where
    P: ProductRepository,
    H: HoldRepository,
{
    /// Create the use case.
    pub fn new(
        products: Arc<P>,
        holds: Arc<H>,
        ledger: Arc<StockLedger<P, H>>,
        hold_ttl: Duration,
    ) -> Self {
        Self {
            products,
            holds,
            ledger,
            hold_ttl,
        }
    }

    /// Execute the use case.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a zero quantity, `NotFound` for an unknown
    /// product, `InsufficientStock` when availability cannot cover the
    /// request, or `Storage` on persistence failure.
    #[instrument(skip(self), fields(product_id = %product_id, quantity = %quantity))]
    pub async fn execute(
        &self,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> Result<HoldReceipt, EngineError> {
        quantity
            .validate_for_hold()
            .map_err(|err| EngineError::Validation {
                field: "quantity",
                message: err.to_string(),
            })?;

        // Serializes availability checks per product.
        let _product_lock = self.products.lock(product_id).await?;

        let now = Timestamp::now();
        let available = self.ledger.available(product_id, now).await?;
        if quantity > available {
            return Err(EngineError::InsufficientStock {
                product_id: product_id.clone(),
                requested: quantity,
                available,
            });
        }

        let hold = Hold::new(product_id.clone(), quantity, self.hold_ttl, now);
        self.holds.insert(&hold).await?;
        self.ledger.invalidate(product_id);

        info!(
            hold_id = %hold.id(),
            expires_at = %hold.expires_at().to_rfc3339(),
            "hold placed"
        );
        Ok(HoldReceipt {
            hold_id: hold.id().clone(),
            expires_at: hold.expires_at(),
        })
    }
}
