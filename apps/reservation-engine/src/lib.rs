// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Reservation Engine - Rust Core Library
//!
//! Flash-sale reservation engine: time-boxed holds against limited stock,
//! finalization into orders, and exactly-once payment resolution.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic (entities, value objects, ports)
//!   - `catalog`: Product entity with committed stock
//!   - `reservation`: Hold entity and its lifecycle
//!   - `ordering`: Order entity with a monotonic status
//!   - `payment`: Idempotency records and receipts
//!   - `shared`: Identifiers, `Money`, `Quantity`, `Timestamp`, row locks
//!
//! - **Application**: Use cases and orchestration
//!   - `use_cases`: `CreateHold`, `FinalizeOrder`, `ResolvePayment`, `SweepHolds`
//!   - `services`: `StockLedger` availability reads with a display cache
//!   - `dto`: Receipts returned at the API boundary
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `persistence`: In-memory repositories with row-level locks
//!   - `container`: Dependency wiring behind the [`Engine`] facade
//!
//! # Concurrency model
//!
//! Every multi-step protocol runs under per-row exclusive locks acquired in
//! a fixed order (order, then product or hold), the async equivalent of the
//! `SELECT ... FOR UPDATE` discipline a relational backend would use.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{ConflictReason, EngineError};
pub use config::EngineConfig;
pub use infrastructure::Engine;
