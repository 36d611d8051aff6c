pub mod auth;
pub mod booking;
pub mod calendar;
pub mod health;
pub mod user;
pub mod v1;
