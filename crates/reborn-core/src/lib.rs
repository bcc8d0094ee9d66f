//! Core domain types for the reborn marketplace.
//!
//! This crate holds everything the storage and HTTP layers share:
//!
//! - Strongly-typed entity identifiers
//! - The entities themselves (users, stores, listings, reviews, jjims, tasks)
//! - Registration input validation
//! - Store rating aggregation math

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod jjim;
pub mod listing;
pub mod rating;
pub mod review;
pub mod store;
pub mod task;
pub mod user;
pub mod validate;

pub use error::{CoreError, Result};
pub use ids::{JjimId, ListingId, ReviewId, StoreId, TaskId, UserId};
pub use jjim::Jjim;
pub use listing::{Listing, ListingStatus};
pub use rating::round_score;
pub use review::{validate_review_input, Review, MAX_REVIEW_IMAGES, MAX_SCORE, MIN_SCORE};
pub use store::{Store, StoreCategory};
pub use task::{RebornTask, TaskStatus};
pub use user::{AccountStatus, User};
