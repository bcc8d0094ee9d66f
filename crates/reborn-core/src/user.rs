//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::ids::UserId;
use crate::store::StoreCategory;

/// Lifecycle status shared by users, stores and listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Normal, visible account.
    Active,
    /// Temporarily disabled.
    Inactive,
    /// Soft-deleted; excluded from all reads.
    Deleted,
}

impl AccountStatus {
    /// Database label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Deleted => "deleted",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "deleted" => Ok(Self::Deleted),
            other => Err(CoreError::UnknownLabel {
                kind: "account status",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered account, either a neighbor (buyer) or a store owner.
///
/// Store owners additionally have a `Store` row keyed by their user id.
/// `password_hash` is a bcrypt hash; the plaintext never leaves the sign-up
/// and login handlers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Surrogate key.
    pub id: UserId,
    /// Login id, unique, 4-16 alphanumeric characters.
    pub login_id: String,
    /// E-mail address, unique.
    pub email: String,
    /// Bcrypt password hash.
    pub password_hash: String,
    /// Display nickname.
    pub nickname: String,
    /// Residential address.
    pub address: String,
    /// Store category the user is interested in.
    pub likes: StoreCategory,
    /// Birth date as `YYYYMMDD`, collected for neighbor accounts only.
    pub birth_date: Option<String>,
    /// Profile image URL.
    pub image_url: Option<String>,
    /// Point balance.
    pub point: i64,
    /// Account lifecycle status.
    pub status: AccountStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the account may log in and act.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_roundtrip() {
        for status in [
            AccountStatus::Active,
            AccountStatus::Inactive,
            AccountStatus::Deleted,
        ] {
            let parsed: AccountStatus = status.as_str().parse().unwrap();
            assert_eq!(status, parsed);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("zombie".parse::<AccountStatus>().is_err());
    }
}
