//! Quantity value object for discrete stock units.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::DomainError;

/// A count of discrete inventory units.
///
/// Inventory is integral: stock, hold and order quantities are whole,
/// non-negative unit counts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// Zero units.
    pub const ZERO: Self = Self(0);

    /// Create a new quantity.
    #[must_use]
    pub const fn new(units: u32) -> Self {
        Self(units)
    }

    /// Get the unit count.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns true if this is zero units.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Saturating subtraction; never goes below zero.
    #[must_use]
    pub const fn saturating_sub(&self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }

    /// Checked subtraction; `None` on underflow.
    #[must_use]
    pub const fn checked_sub(&self, rhs: Self) -> Option<Self> {
        match self.0.checked_sub(rhs.0) {
            Some(units) => Some(Self(units)),
            None => None,
        }
    }

    /// Saturating addition.
    #[must_use]
    pub const fn saturating_add(&self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Check that this is a valid quantity to reserve.
    ///
    /// # Errors
    ///
    /// Returns error if the quantity is zero.
    pub fn validate_for_hold(&self) -> Result<(), DomainError> {
        if self.is_zero() {
            return Err(DomainError::InvalidValue {
                field: "quantity".to_string(),
                message: "Hold quantity must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Quantity {
    fn from(units: u32) -> Self {
        Self(units)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}
