//! Reservation context: time-boxed holds against product stock.

mod hold;
mod repository;

pub use hold::Hold;
pub use repository::HoldRepository;
