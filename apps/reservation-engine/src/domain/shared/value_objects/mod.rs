//! Shared value objects used across bounded contexts.

mod identifiers;
mod money;
mod quantity;
mod timestamp;

pub use identifiers::{HoldId, IdempotencyKey, OrderId, ProductId};
pub use money::Money;
pub use quantity::Quantity;
pub use timestamp::Timestamp;
