pub mod booking;
pub mod equipment;
pub mod id;
