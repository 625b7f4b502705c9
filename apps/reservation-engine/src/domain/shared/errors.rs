//! Domain and storage errors for the reservation engine.

use std::fmt;

use thiserror::Error;

/// Domain-level errors that can occur in business logic.
///
/// These errors are independent of infrastructure concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid state transition attempted.
    InvalidStateTransition {
        /// Entity type (e.g., "Order").
        entity: String,
        /// Current state.
        from: String,
        /// Attempted state.
        to: String,
    },

    /// Invalid value for a field.
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// Aggregate invariant violated.
    InvariantViolation {
        /// Entity type.
        entity: String,
        /// Invariant that was violated.
        invariant: String,
        /// Current state description.
        state: String,
    },
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStateTransition { entity, from, to } => {
                write!(f, "Invalid state transition for {entity}: {from} -> {to}")
            }
            Self::InvalidValue { field, message } => {
                write!(f, "Invalid value for '{field}': {message}")
            }
            Self::InvariantViolation {
                entity,
                invariant,
                state,
            } => {
                write!(
                    f,
                    "Invariant violation in {entity}: {invariant} (state: {state})"
                )
            }
        }
    }
}

impl std::error::Error for DomainError {}

/// Failures of the underlying storage infrastructure.
///
/// These are never business rejections; they always surface to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// The storage backend failed to execute an operation.
    #[error("storage backend failure: {0}")]
    Backend(String),

    /// Persisted state contradicts a documented invariant.
    #[error("storage corruption: {0}")]
    Corruption(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_error_invalid_state_transition_display() {
        let err = DomainError::InvalidStateTransition {
            entity: "Order".to_string(),
            from: "Paid".to_string(),
            to: "Cancelled".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("Order"));
        assert!(msg.contains("Paid"));
        assert!(msg.contains("Cancelled"));
    }

    #[test]
    fn domain_error_invalid_value_display() {
        let err = DomainError::InvalidValue {
            field: "quantity".to_string(),
            message: "must be positive".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("quantity"));
        assert!(msg.contains("positive"));
    }

    #[test]
    fn domain_error_invariant_display() {
        let err = DomainError::InvariantViolation {
            entity: "Product".to_string(),
            invariant: "stock >= deducted quantity".to_string(),
            state: "stock=3, quantity=5".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("stock >= deducted quantity"));
    }

    #[test]
    fn storage_error_display() {
        let err = StorageError::Backend("pool exhausted".to_string());
        assert!(err.to_string().contains("pool exhausted"));

        let err = StorageError::Corruption("orphaned order".to_string());
        assert!(err.to_string().contains("orphaned order"));
    }

    #[test]
    fn domain_error_is_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(DomainError::InvalidValue {
            field: "test".to_string(),
            message: "test".to_string(),
        });
        assert!(!err.to_string().is_empty());
    }
}
