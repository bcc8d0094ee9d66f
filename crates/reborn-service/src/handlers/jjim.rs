//! Favorite (jjim) handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use reborn_core::ListingId;
use reborn_store::JjimRow;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Favorite request body, shared by add and remove.
#[derive(Debug, Deserialize)]
pub struct JjimRequest {
    /// The listing to (un)favorite.
    pub listing_id: ListingId,
}

/// Favorite a listing.
pub async fn create_jjim(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<JjimRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let jjim = state.db.create_jjim(auth.user_id, body.listing_id).await?;

    tracing::info!(user_id = %auth.user_id, listing_id = %body.listing_id, "Listing favorited");

    Ok(Json(serde_json::json!({ "jjim_id": jjim.id })))
}

/// Remove a favorite.
pub async fn delete_jjim(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<JjimRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.db.delete_jjim(auth.user_id, body.listing_id).await?;

    tracing::info!(user_id = %auth.user_id, listing_id = %body.listing_id, "Favorite removed");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// The caller's favorites with listing and store info.
pub async fn list_jjims(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<JjimRow>>, ApiError> {
    let rows = state.db.list_user_jjims(auth.user_id).await?;
    Ok(Json(rows))
}
