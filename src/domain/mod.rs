pub mod clock;
pub mod payment;
pub mod ports;
pub mod transaction;
