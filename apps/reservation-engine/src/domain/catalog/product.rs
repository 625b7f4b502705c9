//! Product entity.
//!
//! Holds the committed (physical) stock for one sellable item. Committed
//! stock is only ever mutated by the payment resolver on a successful
//! payment; reservations are tracked separately as holds.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{DomainError, Money, ProductId, Quantity};

/// A sellable catalog item with committed stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    price: Money,
    stock: Quantity,
}

impl Product {
    /// Create a new product.
    ///
    /// # Errors
    ///
    /// Returns error if the price is not a valid catalog price.
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        price: Money,
        stock: Quantity,
    ) -> Result<Self, DomainError> {
        price.validate_for_catalog()?;
        Ok(Self {
            id,
            name: name.into(),
            price,
            stock,
        })
    }

    /// Product identifier.
    #[must_use]
    pub fn id(&self) -> &ProductId {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit price.
    #[must_use]
    pub const fn price(&self) -> Money {
        self.price
    }

    /// Committed (physical) stock.
    #[must_use]
    pub const fn stock(&self) -> Quantity {
        self.stock
    }

    /// Derived availability given the sum of active, unconsumed hold
    /// quantities. Never reports below zero.
    #[must_use]
    pub fn available_given(&self, reserved: Quantity) -> Quantity {
        self.stock.saturating_sub(reserved)
    }

    /// Deduct committed stock after a confirmed payment.
    ///
    /// # Errors
    ///
    /// Returns error if the deduction would drive stock negative; committed
    /// stock is non-negative by invariant.
    pub fn deduct(&mut self, quantity: Quantity) -> Result<(), DomainError> {
        match self.stock.checked_sub(quantity) {
            Some(remaining) => {
                self.stock = remaining;
                Ok(())
            }
            None => Err(DomainError::InvariantViolation {
                entity: "Product".to_string(),
                invariant: "stock >= deducted quantity".to_string(),
                state: format!("stock={}, quantity={}", self.stock, quantity),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(stock: u32) -> Product {
        Product::new(
            ProductId::new("p-1"),
            "Widget",
            Money::from_cents(1999),
            Quantity::new(stock),
        )
        .unwrap()
    }

    #[test]
    fn product_new_rejects_negative_price() {
        let result = Product::new(
            ProductId::new("p-1"),
            "Widget",
            Money::from_cents(-1),
            Quantity::new(10),
        );
        assert!(result.is_err());
    }

    #[test]
    fn product_accessors() {
        let p = widget(10);
        assert_eq!(p.id().as_str(), "p-1");
        assert_eq!(p.name(), "Widget");
        assert_eq!(p.price(), Money::from_cents(1999));
        assert_eq!(p.stock(), Quantity::new(10));
    }

    #[test]
    fn available_given_subtracts_reserved() {
        let p = widget(100);
        assert_eq!(p.available_given(Quantity::new(30)), Quantity::new(70));
    }

    #[test]
    fn available_given_floors_at_zero() {
        let p = widget(10);
        assert_eq!(p.available_given(Quantity::new(25)), Quantity::ZERO);
    }

    #[test]
    fn deduct_reduces_stock() {
        let mut p = widget(100);
        p.deduct(Quantity::new(5)).unwrap();
        assert_eq!(p.stock(), Quantity::new(95));
    }

    #[test]
    fn deduct_rejects_underflow() {
        let mut p = widget(3);
        let err = p.deduct(Quantity::new(5)).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation { .. }));
        // Stock untouched on failure.
        assert_eq!(p.stock(), Quantity::new(3));
    }
}
