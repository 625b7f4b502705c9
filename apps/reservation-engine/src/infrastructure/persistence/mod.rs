//! Persistence adapters implementing the domain repository ports.

mod locks;
mod memory;

pub use locks::LockMap;
pub use memory::{
    InMemoryHoldRepository, InMemoryIdempotencyRepository, InMemoryOrderRepository,
    InMemoryProductRepository,
};
