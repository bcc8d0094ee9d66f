//! Reviews: buyer-submitted ratings tied to one listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::{ListingId, ReviewId, UserId};

/// Lowest accepted review score.
pub const MIN_SCORE: i32 = 1;
/// Highest accepted review score.
pub const MAX_SCORE: i32 = 5;
/// Maximum number of image URLs attached to one review.
pub const MAX_REVIEW_IMAGES: usize = 5;

/// A buyer review of a listing. Created once, never updated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Surrogate key.
    pub id: ReviewId,
    /// The reviewing user.
    pub user_id: UserId,
    /// The listing reviewed.
    pub listing_id: ListingId,
    /// Score, 1..=5.
    pub score: i32,
    /// Free-form comment.
    pub comment: String,
    /// Up to five attached image URLs.
    pub image_urls: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validate review input before it reaches the storage layer.
///
/// # Errors
///
/// Returns [`CoreError::ScoreOutOfRange`] or [`CoreError::TooManyImages`].
pub fn validate_review_input(score: i32, image_urls: &[String]) -> Result<(), CoreError> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(CoreError::ScoreOutOfRange(score));
    }
    if image_urls.len() > MAX_REVIEW_IMAGES {
        return Err(CoreError::TooManyImages(image_urls.len()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_full_range() {
        for score in MIN_SCORE..=MAX_SCORE {
            assert!(validate_review_input(score, &[]).is_ok());
        }
    }

    #[test]
    fn rejects_out_of_range_scores() {
        assert_eq!(
            validate_review_input(0, &[]),
            Err(CoreError::ScoreOutOfRange(0))
        );
        assert_eq!(
            validate_review_input(6, &[]),
            Err(CoreError::ScoreOutOfRange(6))
        );
    }

    #[test]
    fn rejects_too_many_images() {
        let urls: Vec<String> = (0..6).map(|i| format!("https://img/{i}.jpg")).collect();
        assert_eq!(
            validate_review_input(3, &urls),
            Err(CoreError::TooManyImages(6))
        );
    }

    #[test]
    fn five_images_is_the_limit() {
        let urls: Vec<String> = (0..5).map(|i| format!("https://img/{i}.jpg")).collect();
        assert!(validate_review_input(3, &urls).is_ok());
    }
}
