//! Application layer - use cases, services, and DTOs over the domain ports.

pub mod dto;
pub mod errors;
pub mod services;
pub mod use_cases;

pub use errors::{ConflictReason, EngineError};
