//! Request handlers.

pub mod health;
pub mod images;
pub mod jjim;
pub mod listings;
pub mod reviews;
pub mod stores;
pub mod users;
