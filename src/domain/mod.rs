pub mod chat;
pub mod payment;
pub mod ports;
