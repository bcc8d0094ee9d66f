//! Storage layer for the reborn marketplace.
//!
//! This crate provides persistent storage for users, stores, listings,
//! reborn tasks, reviews and jjims behind one `Database` trait.
//!
//! # Backends
//!
//! - [`PgDatabase`]: PostgreSQL via `sqlx`, parameterized SQL and a pooled
//!   connection, with embedded migrations.
//! - [`MemDatabase`]: in-memory tables behind an `RwLock`, used by unit and
//!   integration tests.
//!
//! # Score aggregation
//!
//! The store-score recomputation operations live here because they are
//! read-aggregate-then-write over the review tables. There is deliberately
//! no transaction tying a review mutation to the following recomputation:
//! the cached score may be stale until the next recompute call, and two
//! concurrent review submissions can interleave so that the last recompute
//! wins with a slightly older mean. The score is a display-only field, so
//! this is accepted.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod mem;
pub mod pg;
pub mod types;

pub use error::{Result, StoreError};
pub use mem::MemDatabase;
pub use pg::PgDatabase;
pub use types::{
    HistoryDetailRow, HistoryRow, JjimRow, ListingUpdate, NewListing, NewReview, NewStore, NewUser,
    ReviewRow, StoreProfileUpdate, StoreSort, TaskRow, UserProfileUpdate,
};

use async_trait::async_trait;

use reborn_core::{
    AccountStatus, Jjim, Listing, ListingId, ListingStatus, RebornTask, Review, ReviewId, Store,
    StoreCategory, StoreId, TaskId, TaskStatus, User, UserId,
};

/// The storage trait defining all database operations.
///
/// Abstracts the storage layer so handlers can run against PostgreSQL in
/// production and an in-memory backend in tests.
#[async_trait]
pub trait Database: Send + Sync {
    // =========================================================================
    // User Operations
    // =========================================================================

    /// Insert a neighbor account.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` when the login id or e-mail is taken.
    async fn create_user(&self, new: NewUser) -> Result<User>;

    /// Insert a store account: the user row plus its store row.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` when the login id or e-mail is taken.
    async fn create_store_account(&self, new_user: NewUser, new_store: NewStore)
        -> Result<(User, Store)>;

    /// Get a user by id.
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Get a user by login id.
    async fn get_user_by_login_id(&self, login_id: &str) -> Result<Option<User>>;

    /// Whether a login id is already taken.
    async fn login_id_exists(&self, login_id: &str) -> Result<bool>;

    /// Update nickname, address, likes and (optionally) profile image.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the user does not exist.
    async fn update_user_profile(&self, id: UserId, update: UserProfileUpdate) -> Result<()>;

    /// Replace the password hash.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the user does not exist.
    async fn update_user_password(&self, id: UserId, password_hash: &str) -> Result<()>;

    /// Add (or subtract) points; returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the user does not exist.
    async fn adjust_user_point(&self, id: UserId, delta: i64) -> Result<i64>;

    /// Change the account lifecycle status (soft delete and reactivation).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the user does not exist.
    async fn set_user_status(&self, id: UserId, status: AccountStatus) -> Result<()>;

    // =========================================================================
    // Store Operations
    // =========================================================================

    /// Get a store by id.
    async fn get_store(&self, id: StoreId) -> Result<Option<Store>>;

    /// Get the store owned by a user, if any.
    async fn get_store_by_owner(&self, owner_id: UserId) -> Result<Option<Store>>;

    /// All active stores, most recently updated first.
    async fn list_stores(&self) -> Result<Vec<Store>>;

    /// Newest active stores, most recently created first.
    async fn list_new_stores(&self, limit: i64) -> Result<Vec<Store>>;

    /// Active stores of one category, highest score first.
    async fn list_popular_stores(&self, category: StoreCategory, limit: i64) -> Result<Vec<Store>>;

    /// Name search over active stores with the given sort order.
    async fn search_stores(&self, keyword: &str, sort: StoreSort) -> Result<Vec<Store>>;

    /// Update the store profile.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the store does not exist.
    async fn update_store_profile(&self, id: StoreId, update: StoreProfileUpdate) -> Result<()>;

    /// Change the lifecycle status of a user's store (store-account
    /// deletion).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the user owns no store.
    async fn set_store_status_by_owner(&self, owner_id: UserId, status: AccountStatus)
        -> Result<()>;

    /// Favorites across all of a store's listings.
    async fn count_store_jjims(&self, store_id: StoreId) -> Result<i64>;

    // =========================================================================
    // Listing Operations
    // =========================================================================

    /// Insert a listing.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the store does not exist.
    async fn create_listing(&self, new: NewListing) -> Result<Listing>;

    /// Get a listing by id.
    async fn get_listing(&self, id: ListingId) -> Result<Option<Listing>>;

    /// A store's listings filtered by status, newest first.
    async fn list_store_listings(
        &self,
        store_id: StoreId,
        status: ListingStatus,
    ) -> Result<Vec<Listing>>;

    /// Update product fields.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the listing does not exist.
    async fn update_listing(&self, id: ListingId, update: ListingUpdate) -> Result<()>;

    /// Change the listing lifecycle status (activate, deactivate, delete).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the listing does not exist.
    async fn set_listing_status(&self, id: ListingId, status: ListingStatus) -> Result<()>;

    // =========================================================================
    // Task Operations
    // =========================================================================

    /// Claim a listing for a user: inserts an active task and decrements
    /// the available count, marking the listing sold out at zero.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` when the listing does not exist.
    /// - `StoreError::Conflict` when the listing is not claimable.
    async fn create_task(&self, listing_id: ListingId, user_id: UserId) -> Result<RebornTask>;

    /// Get a task by id.
    async fn get_task(&self, id: TaskId) -> Result<Option<RebornTask>>;

    /// Change a task's status (complete / cancel).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the task does not exist.
    async fn set_task_status(&self, id: TaskId, status: TaskStatus) -> Result<()>;

    /// A user's active claims with listing and store info.
    async fn list_in_progress(&self, user_id: UserId) -> Result<Vec<TaskRow>>;

    /// A user's completed claims (history), newest first.
    async fn list_history(&self, user_id: UserId) -> Result<Vec<HistoryRow>>;

    /// Full detail of one history entry.
    async fn get_history_detail(&self, task_id: TaskId) -> Result<Option<HistoryDetailRow>>;

    /// The user's completed task for a listing, if any. Gates review
    /// creation.
    async fn find_completed_task(
        &self,
        listing_id: ListingId,
        user_id: UserId,
    ) -> Result<Option<RebornTask>>;

    // =========================================================================
    // Review Operations
    // =========================================================================

    /// Insert a review.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the listing does not exist.
    async fn create_review(&self, new: NewReview) -> Result<Review>;

    /// Get the bare review record (for ownership checks).
    async fn get_review_record(&self, id: ReviewId) -> Result<Option<Review>>;

    /// Get a review joined with reviewer, listing and store.
    async fn get_review(&self, id: ReviewId) -> Result<Option<ReviewRow>>;

    /// Delete a review row.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the review does not exist.
    async fn delete_review(&self, id: ReviewId) -> Result<()>;

    /// A store's reviews (joined), newest first.
    async fn list_store_reviews(&self, store_id: StoreId) -> Result<Vec<ReviewRow>>;

    /// A user's reviews (joined), newest first.
    async fn list_user_reviews(&self, user_id: UserId) -> Result<Vec<ReviewRow>>;

    /// The highest-scored reviews across the site.
    async fn best_reviews(&self, limit: i64) -> Result<Vec<ReviewRow>>;

    /// Number of reviews across a store's listings.
    async fn count_store_reviews(&self, store_id: StoreId) -> Result<i64>;

    // =========================================================================
    // Score Aggregation
    // =========================================================================

    /// Recompute one store's cached score from its reviews.
    ///
    /// Computes the mean review score across all listings of the store,
    /// rounds half-up to one decimal place, and persists it with a single
    /// update keyed by store id. A store with zero reviews keeps its
    /// previous score (no-op).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the store does not exist.
    async fn recompute_store_score(&self, store_id: StoreId) -> Result<()>;

    /// Variant keyed by listing: resolves the listing's store, then
    /// recomputes as above.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the listing does not exist.
    async fn recompute_store_score_by_listing(&self, listing_id: ListingId) -> Result<()>;

    /// Recompute every store referenced by at least one review,
    /// sequentially and independently. A failure partway through leaves
    /// earlier stores updated and later stores untouched; no rollback, no
    /// retry. Returns the number of stores updated.
    async fn recompute_all_store_scores(&self) -> Result<usize>;

    // =========================================================================
    // Jjim Operations
    // =========================================================================

    /// Favorite a listing.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` when the listing does not exist.
    /// - `StoreError::Conflict` when the favorite already exists.
    async fn create_jjim(&self, user_id: UserId, listing_id: ListingId) -> Result<Jjim>;

    /// Remove a favorite.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when the favorite does not exist.
    async fn delete_jjim(&self, user_id: UserId, listing_id: ListingId) -> Result<()>;

    /// A user's favorites with listing and store info, newest first.
    async fn list_user_jjims(&self, user_id: UserId) -> Result<Vec<JjimRow>>;
}
