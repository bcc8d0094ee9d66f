//! Reborn tasks: claim records linking a user to a listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::ids::{ListingId, TaskId, UserId};

/// Claim lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Claimed, pickup pending.
    Active,
    /// Picked up; appears in the user's history.
    Complete,
    /// Claim withdrawn.
    Canceled,
}

impl TaskStatus {
    /// Database label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Complete => "complete",
            Self::Canceled => "canceled",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "complete" => Ok(Self::Complete),
            "canceled" => Ok(Self::Canceled),
            other => Err(CoreError::UnknownLabel {
                kind: "task status",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One claim of one listing by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebornTask {
    /// Surrogate key.
    pub id: TaskId,
    /// The claimed listing.
    pub listing_id: ListingId,
    /// The claiming user.
    pub user_id: UserId,
    /// Claim lifecycle status.
    pub status: TaskStatus,
    /// Claim timestamp.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}
