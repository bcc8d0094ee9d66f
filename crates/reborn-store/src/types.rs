//! Input records and joined query rows.
//!
//! `New*` and `*Update` structs carry validated input from the HTTP layer
//! into a backend; the `*Row` structs are the shapes of multi-table join
//! queries that the handlers serve directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reborn_core::{
    JjimId, ListingId, ListingStatus, ReviewId, StoreCategory, StoreId, TaskId, TaskStatus, UserId,
};

/// Input for creating a user account.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Login id (pre-validated).
    pub login_id: String,
    /// E-mail address (pre-validated).
    pub email: String,
    /// Bcrypt password hash.
    pub password_hash: String,
    /// Display nickname.
    pub nickname: String,
    /// Residential address.
    pub address: String,
    /// Category of interest.
    pub likes: StoreCategory,
    /// Birth date (`YYYYMMDD`), neighbor accounts only.
    pub birth_date: Option<String>,
    /// Profile image URL.
    pub image_url: Option<String>,
}

/// Input for creating the store row of a store account.
#[derive(Debug, Clone)]
pub struct NewStore {
    /// Display name.
    pub name: String,
    /// Business registration number.
    pub registration_number: String,
    /// Street address.
    pub address: String,
    /// Banner image URL.
    pub image_url: Option<String>,
    /// Store category.
    pub category: StoreCategory,
}

/// Input for creating a listing.
#[derive(Debug, Clone)]
pub struct NewListing {
    /// The owning store.
    pub store_id: StoreId,
    /// Product name.
    pub product_name: String,
    /// Pickup guide.
    pub product_guide: String,
    /// Description.
    pub product_comment: String,
    /// Product image URL.
    pub image_url: Option<String>,
    /// Units available.
    pub available_count: i32,
}

/// Input for creating a review.
#[derive(Debug, Clone)]
pub struct NewReview {
    /// The reviewing user.
    pub user_id: UserId,
    /// The listing reviewed.
    pub listing_id: ListingId,
    /// Score, 1..=5 (pre-validated).
    pub score: i32,
    /// Free-form comment.
    pub comment: String,
    /// Up to five image URLs (pre-validated).
    pub image_urls: Vec<String>,
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone)]
pub struct UserProfileUpdate {
    /// New nickname.
    pub nickname: String,
    /// New address.
    pub address: String,
    /// New category of interest.
    pub likes: StoreCategory,
    /// New profile image URL, when replaced.
    pub image_url: Option<String>,
}

/// Fields a store owner may change on the store profile.
#[derive(Debug, Clone)]
pub struct StoreProfileUpdate {
    /// New display name.
    pub name: String,
    /// New street address.
    pub address: String,
    /// New banner image URL, when replaced.
    pub image_url: Option<String>,
    /// New category.
    pub category: StoreCategory,
}

/// Fields a store owner may change on a listing.
#[derive(Debug, Clone)]
pub struct ListingUpdate {
    /// New product name.
    pub product_name: String,
    /// New pickup guide.
    pub product_guide: String,
    /// New description.
    pub product_comment: String,
    /// New product image URL, when replaced.
    pub image_url: Option<String>,
    /// New unit count.
    pub available_count: i32,
}

/// Sort orders for store search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreSort {
    /// Alphabetical by name (the default, and the fallback for unknown
    /// sort parameters).
    #[default]
    Name,
    /// Highest cached score first.
    Score,
    /// Most favorited first.
    Jjim,
}

impl StoreSort {
    /// Parse a query-string sort parameter; unknown values fall back to
    /// name ordering.
    #[must_use]
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value {
            Some(s) if s.eq_ignore_ascii_case("score") => Self::Score,
            Some(s) if s.eq_ignore_ascii_case("jjim") => Self::Jjim,
            _ => Self::Name,
        }
    }
}

/// A review joined with its reviewer, listing and store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRow {
    /// Review id.
    pub review_id: ReviewId,
    /// Reviewer id.
    pub user_id: UserId,
    /// Reviewer profile image.
    pub user_image_url: Option<String>,
    /// Reviewer nickname.
    pub user_nickname: String,
    /// Store name.
    pub store_name: String,
    /// Store category.
    pub store_category: StoreCategory,
    /// The reviewed listing.
    pub listing_id: ListingId,
    /// Product name of the listing.
    pub product_name: String,
    /// Score, 1..=5.
    pub score: i32,
    /// Comment text.
    pub comment: String,
    /// Attached image URLs.
    pub image_urls: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// An active claim joined with its listing and store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRow {
    /// Task id.
    pub task_id: TaskId,
    /// The claimed listing.
    pub listing_id: ListingId,
    /// Product name.
    pub product_name: String,
    /// Product image.
    pub product_image_url: Option<String>,
    /// The store the listing belongs to.
    pub store_id: StoreId,
    /// Store name.
    pub store_name: String,
    /// Store address.
    pub store_address: String,
    /// Claim status.
    pub status: TaskStatus,
    /// Claim timestamp.
    pub created_at: DateTime<Utc>,
}

/// A completed claim as shown in the user's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRow {
    /// Task id.
    pub task_id: TaskId,
    /// Store name.
    pub store_name: String,
    /// The store's cached score at read time.
    pub store_score: f64,
    /// Store address.
    pub store_address: String,
    /// When the claim was completed.
    pub completed_at: DateTime<Utc>,
}

/// Full detail of one history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryDetailRow {
    /// Task id.
    pub task_id: TaskId,
    /// Product name.
    pub product_name: String,
    /// Pickup guide.
    pub product_guide: String,
    /// Description.
    pub product_comment: String,
    /// Product image.
    pub product_image_url: Option<String>,
    /// Store name.
    pub store_name: String,
    /// Store address.
    pub store_address: String,
    /// Claim status.
    pub status: TaskStatus,
    /// Claim timestamp.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

/// A favorite joined with its listing and store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JjimRow {
    /// Jjim id.
    pub jjim_id: JjimId,
    /// The favorited listing.
    pub listing_id: ListingId,
    /// Product name.
    pub product_name: String,
    /// Product image.
    pub product_image_url: Option<String>,
    /// Listing status at read time.
    pub listing_status: ListingStatus,
    /// The store the listing belongs to.
    pub store_id: StoreId,
    /// Store name.
    pub store_name: String,
    /// When the favorite was added.
    pub created_at: DateTime<Utc>,
}
