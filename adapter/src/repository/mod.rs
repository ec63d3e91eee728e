pub mod booking;
pub mod equipment;
