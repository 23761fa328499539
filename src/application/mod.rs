//! Application layer containing the payment lifecycle orchestration.
//!
//! `PaymentService` is the only component holding business rules. It reaches
//! the record store and the payment gateway through the ports in
//! `domain::ports` and keeps no state between calls.

pub mod payments;
