//! Payment context: gateway outcomes and idempotent delivery records.

mod record;
mod repository;

pub use record::{IdempotencyRecord, PaymentOutcome, PaymentReceipt};
pub use repository::{ClaimOutcome, IdempotencyRepository};
