//! Listing and claim handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use reborn_core::{validate, Listing, ListingId, ListingStatus, StoreId, TaskId, TaskStatus};
use reborn_store::{HistoryDetailRow, HistoryRow, ListingUpdate, NewListing, TaskRow};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Public view of a listing.
#[derive(Debug, Serialize)]
pub struct ListingResponse {
    /// Listing id.
    pub listing_id: String,
    /// The owning store.
    pub store_id: String,
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
    /// Lifecycle status.
    pub status: ListingStatus,
}

impl From<&Listing> for ListingResponse {
    fn from(listing: &Listing) -> Self {
        Self {
            listing_id: listing.id.to_string(),
            store_id: listing.store_id.to_string(),
            product_name: listing.product_name.clone(),
            product_guide: listing.product_guide.clone(),
            product_comment: listing.product_comment.clone(),
            image_url: listing.image_url.clone(),
            available_count: listing.available_count,
            status: listing.status,
        }
    }
}

/// Listing creation request.
#[derive(Debug, Deserialize)]
pub struct CreateListingRequest {
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

/// Create a listing under the caller's store.
pub async fn create_listing(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateListingRequest>,
) -> Result<Json<ListingResponse>, ApiError> {
    validate::non_empty("product_name", &body.product_name)?;
    if body.available_count < 0 {
        return Err(ApiError::BadRequest(
            "available_count must not be negative".into(),
        ));
    }

    let store = state
        .db
        .get_store_by_owner(auth.user_id)
        .await?
        .ok_or(ApiError::Forbidden)?;

    let listing = state
        .db
        .create_listing(NewListing {
            store_id: store.id,
            product_name: body.product_name,
            product_guide: body.product_guide,
            product_comment: body.product_comment,
            image_url: body.image_url,
            available_count: body.available_count,
        })
        .await?;

    tracing::info!(listing_id = %listing.id, store_id = %store.id, "Listing created");

    Ok(Json(ListingResponse::from(&listing)))
}

/// Listing filter query.
#[derive(Debug, Deserialize)]
pub struct ListingsQuery {
    /// Status to filter by; defaults to active.
    pub status: Option<String>,
}

/// List a store's listings filtered by status.
pub async fn store_listings(
    State(state): State<Arc<AppState>>,
    Path(store_id): Path<StoreId>,
    Query(query): Query<ListingsQuery>,
) -> Result<Json<Vec<ListingResponse>>, ApiError> {
    let status = match query.status.as_deref() {
        None => ListingStatus::Active,
        Some(s) => s.parse()?,
    };
    let listings = state.db.list_store_listings(store_id, status).await?;
    Ok(Json(listings.iter().map(ListingResponse::from).collect()))
}

/// Listing update request.
#[derive(Debug, Deserialize)]
pub struct UpdateListingRequest {
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

/// Update a listing's product fields (owner only).
pub async fn update_listing(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(listing_id): Path<ListingId>,
    Json(body): Json<UpdateListingRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate::non_empty("product_name", &body.product_name)?;
    if body.available_count < 0 {
        return Err(ApiError::BadRequest(
            "available_count must not be negative".into(),
        ));
    }

    require_listing_owner(&state, &auth, listing_id).await?;

    state
        .db
        .update_listing(
            listing_id,
            ListingUpdate {
                product_name: body.product_name,
                product_guide: body.product_guide,
                product_comment: body.product_comment,
                image_url: body.image_url,
                available_count: body.available_count,
            },
        )
        .await?;

    tracing::info!(listing_id = %listing_id, "Listing updated");

    Ok(Json(serde_json::json!({ "updated": true })))
}

/// Toggle a listing between active and inactive (owner only).
pub async fn toggle_listing(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(listing_id): Path<ListingId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let listing = require_listing_owner(&state, &auth, listing_id).await?;

    let next = match listing.status {
        ListingStatus::Active => ListingStatus::Inactive,
        ListingStatus::Inactive | ListingStatus::SoldOut => ListingStatus::Active,
        ListingStatus::Deleted => {
            return Err(ApiError::Conflict("listing is deleted".into()));
        }
    };
    state.db.set_listing_status(listing_id, next).await?;

    tracing::info!(listing_id = %listing_id, status = %next, "Listing status toggled");

    Ok(Json(serde_json::json!({ "status": next })))
}

/// Soft-delete a listing (owner only).
pub async fn delete_listing(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(listing_id): Path<ListingId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_listing_owner(&state, &auth, listing_id).await?;
    state
        .db
        .set_listing_status(listing_id, ListingStatus::Deleted)
        .await?;

    tracing::info!(listing_id = %listing_id, "Listing deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Claim a listing: creates an active reborn task for the caller.
pub async fn claim_listing(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(listing_id): Path<ListingId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let task = state.db.create_task(listing_id, auth.user_id).await?;

    tracing::info!(task_id = %task.id, listing_id = %listing_id, user_id = %auth.user_id, "Listing claimed");

    Ok(Json(serde_json::json!({ "task_id": task.id })))
}

/// Mark a task complete (the claiming user or the store owner).
pub async fn complete_task(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(task_id): Path<TaskId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    set_task_status(&state, &auth, task_id, TaskStatus::Complete).await?;
    Ok(Json(serde_json::json!({ "status": TaskStatus::Complete })))
}

/// Cancel an active task (the claiming user or the store owner).
pub async fn cancel_task(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(task_id): Path<TaskId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    set_task_status(&state, &auth, task_id, TaskStatus::Canceled).await?;
    Ok(Json(serde_json::json!({ "status": TaskStatus::Canceled })))
}

/// The caller's active claims.
pub async fn in_progress(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<TaskRow>>, ApiError> {
    let rows = state.db.list_in_progress(auth.user_id).await?;
    Ok(Json(rows))
}

/// The caller's completed claims.
pub async fn history(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<HistoryRow>>, ApiError> {
    let rows = state.db.list_history(auth.user_id).await?;
    Ok(Json(rows))
}

/// Full detail of one claim (the claiming user or the store owner).
pub async fn task_detail(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(task_id): Path<TaskId>,
) -> Result<Json<HistoryDetailRow>, ApiError> {
    require_task_party(&state, &auth, task_id).await?;
    let detail = state
        .db
        .get_history_detail(task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("task not found: {task_id}")))?;
    Ok(Json(detail))
}

/// Change a task's status after checking the caller is a party to it.
async fn set_task_status(
    state: &AppState,
    auth: &AuthUser,
    task_id: TaskId,
    status: TaskStatus,
) -> Result<(), ApiError> {
    let task = require_task_party(state, auth, task_id).await?;
    if task.status != TaskStatus::Active {
        return Err(ApiError::Conflict(format!(
            "task is already {}",
            task.status
        )));
    }
    state.db.set_task_status(task_id, status).await?;

    tracing::info!(task_id = %task_id, status = %status, "Task status changed");
    Ok(())
}

/// Load a task and verify the caller is the claiming user or the owner of
/// the listing's store.
async fn require_task_party(
    state: &AppState,
    auth: &AuthUser,
    task_id: TaskId,
) -> Result<reborn_core::RebornTask, ApiError> {
    let task = state
        .db
        .get_task(task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("task not found: {task_id}")))?;
    if task.user_id == auth.user_id {
        return Ok(task);
    }
    let listing = state
        .db
        .get_listing(task.listing_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("listing not found: {}", task.listing_id)))?;
    let store = state
        .db
        .get_store(listing.store_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("store not found: {}", listing.store_id)))?;
    if store.owner_id != auth.user_id {
        return Err(ApiError::Forbidden);
    }
    Ok(task)
}

/// Load a listing and verify the caller owns its store.
async fn require_listing_owner(
    state: &AppState,
    auth: &AuthUser,
    listing_id: ListingId,
) -> Result<Listing, ApiError> {
    let listing = state
        .db
        .get_listing(listing_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("listing not found: {listing_id}")))?;
    let store = state
        .db
        .get_store(listing.store_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("store not found: {}", listing.store_id)))?;
    if store.owner_id != auth.user_id {
        return Err(ApiError::Forbidden);
    }
    Ok(listing)
}
