//! Application services shared across use cases.

mod stock_ledger;

pub use stock_ledger::{AvailabilityCache, StockLedger};
