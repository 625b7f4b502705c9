//! Use cases orchestrating the reservation protocol.

mod create_hold;
mod finalize_order;
mod resolve_payment;
mod sweep_holds;

pub use create_hold::CreateHold;
pub use finalize_order::FinalizeOrder;
pub use resolve_payment::ResolvePayment;
pub use sweep_holds::SweepHolds;
