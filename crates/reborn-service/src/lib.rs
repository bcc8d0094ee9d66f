//! Reborn marketplace HTTP API service.
//!
//! This crate provides the HTTP API for the reborn marketplace, including:
//!
//! - User and store account registration and login
//! - Product listings and claims
//! - Favorites (jjim)
//! - Reviews and store score aggregation
//! - Image upload
//!
//! # Authentication
//!
//! The service supports two authentication methods:
//!
//! 1. **Bearer JWT tokens** - For end-user requests, issued at login
//! 2. **Service API keys** - For operational endpoints (bulk recompute)

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod images;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use images::ImageStore;
pub use routes::create_router;
pub use state::AppState;
