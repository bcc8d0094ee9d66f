//! Review handlers and score recomputation triggers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use reborn_core::{validate_review_input, ListingId, ReviewId, StoreId};
use reborn_store::{NewReview, ReviewRow};

use crate::auth::{AuthUser, ServiceAuth};
use crate::error::ApiError;
use crate::state::AppState;

/// Number of reviews on the "best" shelf.
const BEST_LIMIT: i64 = 5;

/// Review creation request.
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    /// The listing reviewed.
    pub listing_id: ListingId,
    /// Score, 1..=5.
    pub score: i32,
    /// Free-form comment.
    pub comment: String,
    /// Up to five image URLs.
    #[serde(default)]
    pub image_urls: Vec<String>,
}

/// Create a review and recompute the store's cached score.
///
/// Requires a completed claim for the listing by the caller.
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateReviewRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate_review_input(body.score, &body.image_urls)?;

    state
        .db
        .find_completed_task(body.listing_id, auth.user_id)
        .await?
        .ok_or(ApiError::Forbidden)?;

    let review = state
        .db
        .create_review(NewReview {
            user_id: auth.user_id,
            listing_id: body.listing_id,
            score: body.score,
            comment: body.comment,
            image_urls: body.image_urls,
        })
        .await?;

    // The cached score is stale until this completes; see the storage
    // crate docs for the consistency model.
    state
        .db
        .recompute_store_score_by_listing(body.listing_id)
        .await?;

    tracing::info!(
        review_id = %review.id,
        listing_id = %body.listing_id,
        user_id = %auth.user_id,
        score = body.score,
        "Review created"
    );

    Ok(Json(serde_json::json!({ "review_id": review.id })))
}

/// Delete a review (owner only) and recompute the store's cached score.
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(review_id): Path<ReviewId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let review = state
        .db
        .get_review_record(review_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("review not found: {review_id}")))?;
    if review.user_id != auth.user_id {
        return Err(ApiError::Forbidden);
    }

    state.db.delete_review(review_id).await?;
    state
        .db
        .recompute_store_score_by_listing(review.listing_id)
        .await?;

    tracing::info!(review_id = %review_id, user_id = %auth.user_id, "Review deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Get one review joined with reviewer, listing and store.
pub async fn get_review(
    State(state): State<Arc<AppState>>,
    Path(review_id): Path<ReviewId>,
) -> Result<Json<ReviewRow>, ApiError> {
    let row = state
        .db
        .get_review(review_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("review not found: {review_id}")))?;
    Ok(Json(row))
}

/// The highest-scored reviews across the site.
pub async fn best_reviews(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ReviewRow>>, ApiError> {
    let rows = state.db.best_reviews(BEST_LIMIT).await?;
    Ok(Json(rows))
}

/// A store's reviews, newest first.
pub async fn store_reviews(
    State(state): State<Arc<AppState>>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<Vec<ReviewRow>>, ApiError> {
    let rows = state.db.list_store_reviews(store_id).await?;
    Ok(Json(rows))
}

/// Number of reviews across a store's listings.
pub async fn store_review_count(
    State(state): State<Arc<AppState>>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let count = state.db.count_store_reviews(store_id).await?;
    Ok(Json(serde_json::json!({ "count": count })))
}

/// The caller's reviews, newest first.
pub async fn my_reviews(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<ReviewRow>>, ApiError> {
    let rows = state.db.list_user_reviews(auth.user_id).await?;
    Ok(Json(rows))
}

/// Recompute the cached score of every store referenced by a review.
///
/// Service-authenticated operational endpoint. Stores are processed
/// sequentially; a failure partway leaves earlier stores updated.
pub async fn recompute_scores(
    State(state): State<Arc<AppState>>,
    service: ServiceAuth,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = state.db.recompute_all_store_scores().await?;

    tracing::info!(
        service = %service.service_name,
        updated,
        "Bulk score recomputation finished"
    );

    Ok(Json(serde_json::json!({ "updated": updated })))
}
