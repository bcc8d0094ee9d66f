//! Listings ("reborns"): single secondhand-product entries owned by a store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::ids::{ListingId, StoreId};

/// Listing lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// Visible and claimable.
    Active,
    /// Hidden by the store.
    Inactive,
    /// All units claimed.
    SoldOut,
    /// Soft-deleted.
    Deleted,
}

impl ListingStatus {
    /// Database label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::SoldOut => "sold_out",
            Self::Deleted => "deleted",
        }
    }
}

impl FromStr for ListingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "sold_out" => Ok(Self::SoldOut),
            "deleted" => Ok(Self::Deleted),
            other => Err(CoreError::UnknownLabel {
                kind: "listing status",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single product entry. Belongs to exactly one store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Surrogate key.
    pub id: ListingId,
    /// The owning store.
    pub store_id: StoreId,
    /// Product name.
    pub product_name: String,
    /// Pickup guide shown to claimants.
    pub product_guide: String,
    /// Free-form description.
    pub product_comment: String,
    /// Product image URL.
    pub image_url: Option<String>,
    /// Units still available.
    pub available_count: i32,
    /// Lifecycle status.
    pub status: ListingStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Whether the listing can currently be claimed.
    #[must_use]
    pub fn is_claimable(&self) -> bool {
        self.status == ListingStatus::Active && self.available_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_roundtrip() {
        for status in [
            ListingStatus::Active,
            ListingStatus::Inactive,
            ListingStatus::SoldOut,
            ListingStatus::Deleted,
        ] {
            let parsed: ListingStatus = status.as_str().parse().unwrap();
            assert_eq!(status, parsed);
        }
    }
}
