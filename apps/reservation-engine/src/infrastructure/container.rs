//! Dependency wiring: repositories, services, and use cases behind one
//! facade.

use std::sync::Arc;

use crate::application::dto::{HoldReceipt, OrderReceipt, ProductView};
use crate::application::errors::EngineError;
use crate::application::services::StockLedger;
use crate::application::use_cases::{CreateHold, FinalizeOrder, ResolvePayment, SweepHolds};
use crate::config::EngineConfig;
use crate::domain::catalog::{Product, ProductRepository};
use crate::domain::payment::{PaymentOutcome, PaymentReceipt};
use crate::domain::shared::{HoldId, IdempotencyKey, OrderId, ProductId, Quantity, Timestamp};
use crate::infrastructure::persistence::{
    InMemoryHoldRepository, InMemoryIdempotencyRepository, InMemoryOrderRepository,
    InMemoryProductRepository,
};

type Products = InMemoryProductRepository;
type Holds = InMemoryHoldRepository;
type Orders = InMemoryOrderRepository;
type Idempotency = InMemoryIdempotencyRepository;

/// The assembled reservation engine.
///
/// Owns the in-memory stores and exposes the use cases as methods; clone
/// the surrounding `Arc` to share it across tasks.
pub struct Engine {
    products: Arc<Products>,
    ledger: Arc<StockLedger<Products, Holds>>,
    create_hold: CreateHold<Products, Holds>,
    finalize_order: FinalizeOrder<Products, Holds, Orders>,
    resolve_payment: ResolvePayment<Products, Holds, Orders, Idempotency>,
    sweep_holds: SweepHolds<Products, Holds>,
}

impl Engine {
    /// Wire up an engine from configuration.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        let products = Arc::new(InMemoryProductRepository::new());
        let holds = Arc::new(InMemoryHoldRepository::new());
        let orders = Arc::new(InMemoryOrderRepository::new());
        let idempotency = Arc::new(InMemoryIdempotencyRepository::new());
        let ledger = Arc::new(StockLedger::new(
            Arc::clone(&products),
            Arc::clone(&holds),
            config.cache_ttl(),
        ));

        Self {
            create_hold: CreateHold::new(
                Arc::clone(&products),
                Arc::clone(&holds),
                Arc::clone(&ledger),
                config.hold_ttl(),
            ),
            finalize_order: FinalizeOrder::new(
                Arc::clone(&products),
                Arc::clone(&holds),
                Arc::clone(&orders),
                Arc::clone(&ledger),
            ),
            resolve_payment: ResolvePayment::new(
                Arc::clone(&products),
                Arc::clone(&holds),
                Arc::clone(&orders),
                Arc::clone(&idempotency),
                Arc::clone(&ledger),
                config.payment.visibility_retries,
                config.visibility_delay(),
            ),
            sweep_holds: SweepHolds::new(Arc::clone(&holds), Arc::clone(&ledger)),
            products,
            ledger,
        }
    }

    /// Add or replace a catalog product.
    ///
    /// # Errors
    ///
    /// Returns error if persistence fails.
    pub async fn seed_product(&self, product: Product) -> Result<(), EngineError> {
        self.products.save(&product).await?;
        self.ledger.invalidate(product.id());
        Ok(())
    }

    /// Catalog read model with cached availability, for display.
    ///
    /// # Errors
    ///
    /// Returns error if the product does not exist or a query fails.
    pub async fn product_view(&self, product_id: &ProductId) -> Result<ProductView, EngineError> {
        let product =
            self.products
                .find(product_id)
                .await?
                .ok_or_else(|| EngineError::NotFound {
                    entity: "product",
                    id: product_id.to_string(),
                })?;
        let available = self
            .ledger
            .available_cached(product_id, Timestamp::now())
            .await?;
        Ok(ProductView {
            product_id: product.id().clone(),
            name: product.name().to_string(),
            price: product.price(),
            available,
        })
    }

    /// Reserve units of a product for the configured hold lifetime.
    ///
    /// # Errors
    ///
    /// See [`CreateHold::execute`].
    pub async fn create_hold(
        &self,
        product_id: &ProductId,
        quantity: Quantity,
    ) -> Result<HoldReceipt, EngineError> {
        self.create_hold.execute(product_id, quantity).await
    }

    /// Convert a valid hold into a pending order.
    ///
    /// # Errors
    ///
    /// See [`FinalizeOrder::execute`].
    pub async fn finalize_order(&self, hold_id: &HoldId) -> Result<OrderReceipt, EngineError> {
        self.finalize_order.execute(hold_id).await
    }

    /// Apply a payment outcome to an order, deduplicated by key.
    ///
    /// # Errors
    ///
    /// See [`ResolvePayment::execute`].
    pub async fn resolve_payment(
        &self,
        key: &IdempotencyKey,
        order_id: &OrderId,
        outcome: PaymentOutcome,
    ) -> Result<PaymentReceipt, EngineError> {
        self.resolve_payment.execute(key, order_id, outcome).await
    }

    /// Run one expired-hold sweep; returns the number of holds reaped.
    ///
    /// # Errors
    ///
    /// See [`SweepHolds::execute`].
    pub async fn sweep_expired_holds(&self) -> Result<usize, EngineError> {
        self.sweep_holds.execute().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::shared::Money;

    async fn engine_with_widget(stock: u32) -> Engine {
        let engine = Engine::new(&EngineConfig::default());
        let product = Product::new(
            ProductId::new("p-1"),
            "Widget",
            Money::from_cents(1000),
            Quantity::new(stock),
        )
        .unwrap();
        engine.seed_product(product).await.unwrap();
        engine
    }

    #[tokio::test]
    async fn wired_engine_runs_the_full_lifecycle() {
        let engine = engine_with_widget(10).await;
        let id = ProductId::new("p-1");

        let hold = engine.create_hold(&id, Quantity::new(2)).await.unwrap();
        let order = engine.finalize_order(&hold.hold_id).await.unwrap();
        let receipt = engine
            .resolve_payment(
                &IdempotencyKey::new("pay_1"),
                &order.order_id,
                PaymentOutcome::Success,
            )
            .await
            .unwrap();
        assert_eq!(receipt, PaymentReceipt::paid());

        let view = engine.product_view(&id).await.unwrap();
        assert_eq!(view.available, Quantity::new(8));
        assert_eq!(view.name, "Widget");
    }

    #[tokio::test]
    async fn seeding_replaces_and_invalidates() {
        let engine = engine_with_widget(10).await;
        let id = ProductId::new("p-1");
        assert_eq!(engine.product_view(&id).await.unwrap().available, Quantity::new(10));

        let restocked = Product::new(
            id.clone(),
            "Widget",
            Money::from_cents(1000),
            Quantity::new(50),
        )
        .unwrap();
        engine.seed_product(restocked).await.unwrap();
        assert_eq!(engine.product_view(&id).await.unwrap().available, Quantity::new(50));
    }
}
