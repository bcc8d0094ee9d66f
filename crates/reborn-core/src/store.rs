//! Stores (seller accounts).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::ids::{StoreId, UserId};
use crate::user::AccountStatus;

/// Store categories a seller registers under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreCategory {
    /// Cafes and dessert shops.
    Cafe,
    /// Restaurants.
    Restaurant,
    /// Clothing and fashion.
    Fashion,
    /// Books and stationery.
    Book,
    /// Groceries and daily goods.
    Grocery,
    /// Everything else.
    Etc,
}

impl StoreCategory {
    /// Database label for the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cafe => "cafe",
            Self::Restaurant => "restaurant",
            Self::Fashion => "fashion",
            Self::Book => "book",
            Self::Grocery => "grocery",
            Self::Etc => "etc",
        }
    }
}

impl FromStr for StoreCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cafe" => Ok(Self::Cafe),
            "restaurant" => Ok(Self::Restaurant),
            "fashion" => Ok(Self::Fashion),
            "book" => Ok(Self::Book),
            "grocery" => Ok(Self::Grocery),
            "etc" => Ok(Self::Etc),
            other => Err(CoreError::UnknownLabel {
                kind: "store category",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for StoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A seller account. Owns zero or more listings.
///
/// `score` is a denormalized cache of the mean review score across all of
/// the store's listings, rounded to one decimal place. It is recomputed by
/// the storage layer after review mutations and may be stale in between.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    /// Surrogate key.
    pub id: StoreId,
    /// The owning user account.
    pub owner_id: UserId,
    /// Display name.
    pub name: String,
    /// Business registration number (`000-00-00000`).
    pub registration_number: String,
    /// Street address.
    pub address: String,
    /// Banner image URL.
    pub image_url: Option<String>,
    /// Category the store registered under.
    pub category: StoreCategory,
    /// Cached mean review score, one decimal place. 0.0 until first review.
    pub score: f64,
    /// Lifecycle status.
    pub status: AccountStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_roundtrip() {
        for category in [
            StoreCategory::Cafe,
            StoreCategory::Restaurant,
            StoreCategory::Fashion,
            StoreCategory::Book,
            StoreCategory::Grocery,
            StoreCategory::Etc,
        ] {
            let parsed: StoreCategory = category.as_str().parse().unwrap();
            assert_eq!(category, parsed);
        }
    }

    #[test]
    fn category_serde_uses_snake_case() {
        let json = serde_json::to_string(&StoreCategory::Cafe).unwrap();
        assert_eq!(json, "\"cafe\"");
    }
}
