//! Application-level error taxonomy.
//!
//! Use cases surface failures as [`EngineError`]; callers map its variants
//! onto their transport's status codes. Domain rule failures arrive as
//! conflicts or validation errors, infrastructure failures as `Storage`.

use thiserror::Error;

use crate::domain::shared::{ProductId, Quantity, StorageError};

/// Why a hold-based operation was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// The hold does not exist in a usable state: consumed, expired, or
    /// already reaped.
    HoldInvalidOrExpired,
    /// The hold has already been finalized into an order.
    HoldAlreadyUsed,
}

impl std::fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HoldInvalidOrExpired => write!(f, "hold invalid or expired"),
            Self::HoldAlreadyUsed => write!(f, "hold already used"),
        }
    }
}

/// Errors surfaced by the reservation engine's use cases.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A request field failed validation.
    #[error("validation failed for {field}: {message}")]
    Validation {
        /// Offending field name.
        field: &'static str,
        /// Human-readable reason.
        message: String,
    },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. `"product"`.
        entity: &'static str,
        /// Identifier that missed.
        id: String,
    },

    /// The requested quantity exceeds live availability.
    #[error("insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        /// Product that ran short.
        product_id: ProductId,
        /// Units asked for.
        requested: Quantity,
        /// Units actually available.
        available: Quantity,
    },

    /// The operation lost a state race it cannot win by retrying.
    #[error("conflict: {0}")]
    Conflict(ConflictReason),

    /// The operation raced a not-yet-visible write; the caller should
    /// redeliver.
    #[error("transient race on order {order_id}; retry the delivery")]
    TransientRace {
        /// Order the delivery targeted.
        order_id: String,
    },

    /// The persistence layer failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}
