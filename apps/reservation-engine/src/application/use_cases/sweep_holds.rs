//! Reap lapsed holds so their units return to availability.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::errors::EngineError;
use crate::application::services::StockLedger;
use crate::domain::catalog::ProductRepository;
use crate::domain::reservation::HoldRepository;
use crate::domain::shared::Timestamp;

/// Use case: delete unconsumed holds whose deadline has passed.
///
/// Availability is derived from holds with a future deadline, so a lapsed
/// hold stops counting the moment it expires; the sweep just clears the
/// dead rows. Each candidate is re-validated under its row lock, which
/// makes concurrent or repeated sweeps harmless.
pub struct SweepHolds<P, H> {
    holds: Arc<H>,
    ledger: Arc<StockLedger<P, H>>,
}

impl<P, H> SweepHolds<P, H>
where
    P: ProductRepository,
    H: HoldRepository,
{
    /// Create the use case.
    pub fn new(holds: Arc<H>, ledger: Arc<StockLedger<P, H>>) -> Self {
        Self { holds, ledger }
    }

    /// Execute one sweep; returns the number of holds reaped.
    ///
    /// # Errors
    ///
    /// Returns error if a query or deletion fails.
    #[instrument(skip(self))]
    pub async fn execute(&self) -> Result<usize, EngineError> {
        let now = Timestamp::now();
        let candidates = self.holds.expired_as_of(now).await?;
        let mut reaped = 0;

        for hold_id in candidates {
            let _hold_lock = self.holds.lock(&hold_id).await?;

            // Re-read under the lock: a racing sweep may have deleted the
            // row, or a finalization may have consumed it meanwhile.
            let Some(hold) = self.holds.find(&hold_id).await? else {
                continue;
            };
            if hold.is_consumed() || !hold.is_expired(now) {
                continue;
            }

            self.holds.delete(&hold_id).await?;
            self.ledger.invalidate(hold.product_id());
            reaped += 1;
            debug!(
                hold_id = %hold_id,
                product_id = %hold.product_id(),
                quantity = %hold.quantity(),
                "hold reaped"
            );
        }

        if reaped > 0 {
            info!(reaped, "expired holds swept");
        }
        Ok(reaped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::Product;
    use crate::domain::reservation::Hold;
    use crate::domain::shared::{Money, ProductId, Quantity};
    use crate::infrastructure::persistence::{InMemoryHoldRepository, InMemoryProductRepository};
    use std::time::Duration;

    const TTL: Duration = Duration::from_secs(120);

    struct Fixture {
        holds: Arc<InMemoryHoldRepository>,
        ledger: Arc<StockLedger<InMemoryProductRepository, InMemoryHoldRepository>>,
        sweep: SweepHolds<InMemoryProductRepository, InMemoryHoldRepository>,
    }

    async fn fixture(stock: u32) -> Fixture {
        let products = Arc::new(InMemoryProductRepository::new());
        let product = Product::new(
            ProductId::new("p-1"),
            "Widget",
            Money::from_cents(1000),
            Quantity::new(stock),
        )
        .unwrap();
        products.save(&product).await.unwrap();

        let holds = Arc::new(InMemoryHoldRepository::new());
        let ledger = Arc::new(StockLedger::new(
            products,
            Arc::clone(&holds),
            Duration::from_secs(5),
        ));
        Fixture {
            sweep: SweepHolds::new(Arc::clone(&holds), Arc::clone(&ledger)),
            holds,
            ledger,
        }
    }

    #[tokio::test]
    async fn sweep_deletes_only_lapsed_unconsumed_holds() {
        let fx = fixture(100).await;
        let now = Timestamp::now();
        let id = ProductId::new("p-1");

        let active = Hold::new(id.clone(), Quantity::new(30), TTL, now);
        fx.holds.insert(&active).await.unwrap();

        let lapsed = Hold::new(id.clone(), Quantity::new(20), TTL, now.minus(Duration::from_secs(600)));
        fx.holds.insert(&lapsed).await.unwrap();

        let mut consumed = Hold::new(id.clone(), Quantity::new(10), TTL, now.minus(Duration::from_secs(600)));
        consumed.consume();
        fx.holds.insert(&consumed).await.unwrap();

        // Lapsed holds already stopped counting before the sweep runs.
        assert_eq!(fx.ledger.available(&id, now).await.unwrap(), Quantity::new(70));

        let reaped = fx.sweep.execute().await.unwrap();
        assert_eq!(reaped, 1);

        // The sweep clears rows without changing the availability figure.
        assert_eq!(fx.ledger.available(&id, now).await.unwrap(), Quantity::new(70));
        assert!(fx.holds.find(lapsed.id()).await.unwrap().is_none());
        assert!(fx.holds.find(active.id()).await.unwrap().is_some());
        assert!(fx.holds.find(consumed.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn sweep_is_idempotent() {
        let fx = fixture(100).await;
        let lapsed = Hold::new(
            ProductId::new("p-1"),
            Quantity::new(5),
            TTL,
            Timestamp::now().minus(Duration::from_secs(600)),
        );
        fx.holds.insert(&lapsed).await.unwrap();

        assert_eq!(fx.sweep.execute().await.unwrap(), 1);
        assert_eq!(fx.sweep.execute().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_sweep_is_a_no_op() {
        let fx = fixture(100).await;
        assert_eq!(fx.sweep.execute().await.unwrap(), 0);
        assert!(fx.holds.is_empty().unwrap());
    }
}
