//! Shared kernel: identifiers, value objects, locks, and errors.

mod errors;
mod locks;
mod value_objects;

pub use errors::{DomainError, StorageError};
pub use locks::RowLock;
pub use value_objects::{HoldId, IdempotencyKey, Money, OrderId, ProductId, Quantity, Timestamp};
