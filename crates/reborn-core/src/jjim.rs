//! Jjims: a user's favorite/bookmark relation to a listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{JjimId, ListingId, UserId};

/// One favorite relation. Unique per (user, listing) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jjim {
    /// Surrogate key.
    pub id: JjimId,
    /// The favoriting user.
    pub user_id: UserId,
    /// The favorited listing.
    pub listing_id: ListingId,
    /// When the favorite was added.
    pub created_at: DateTime<Utc>,
}
