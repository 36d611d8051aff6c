pub mod booking;
pub mod profile;
pub mod session;
