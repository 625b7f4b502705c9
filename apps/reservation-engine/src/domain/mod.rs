//! Domain layer - entities, value objects, and repository ports.

pub mod catalog;
pub mod ordering;
pub mod payment;
pub mod reservation;
pub mod shared;
