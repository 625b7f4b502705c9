//! Ordering context: pending commitments created from consumed holds.

mod order;
mod repository;
mod status;

pub use order::Order;
pub use repository::{OrderInsert, OrderRepository};
pub use status::OrderStatus;
