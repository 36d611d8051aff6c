pub mod auth;
pub mod booking;
pub mod id;
pub mod role;
pub mod user;
