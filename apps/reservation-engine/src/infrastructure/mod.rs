//! Infrastructure layer - persistence adapters and dependency wiring.

pub mod container;
pub mod persistence;

pub use container::Engine;
