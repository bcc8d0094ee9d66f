//! Store browsing and management handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use reborn_core::{validate, Store, StoreCategory, StoreId};
use reborn_store::{StoreProfileUpdate, StoreSort};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Default number of entries for the "new" and "popular" shelves.
const SHELF_LIMIT: i64 = 10;

/// Public view of a store.
#[derive(Debug, Serialize)]
pub struct StoreResponse {
    /// Store id.
    pub store_id: String,
    /// Display name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Banner image URL.
    pub image_url: Option<String>,
    /// Category.
    pub category: StoreCategory,
    /// Cached mean review score, one decimal place.
    pub score: f64,
}

impl From<&Store> for StoreResponse {
    fn from(store: &Store) -> Self {
        Self {
            store_id: store.id.to_string(),
            name: store.name.clone(),
            address: store.address.clone(),
            image_url: store.image_url.clone(),
            category: store.category,
            score: store.score,
        }
    }
}

/// List all active stores, most recently updated first.
pub async fn list_stores(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StoreResponse>>, ApiError> {
    let stores = state.db.list_stores().await?;
    Ok(Json(stores.iter().map(StoreResponse::from).collect()))
}

/// List the newest stores.
pub async fn new_stores(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StoreResponse>>, ApiError> {
    let stores = state.db.list_new_stores(SHELF_LIMIT).await?;
    Ok(Json(stores.iter().map(StoreResponse::from).collect()))
}

/// Popular-stores query.
#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    /// Category to rank within.
    pub category: StoreCategory,
}

/// Top stores of a category by cached score.
pub async fn popular_stores(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PopularQuery>,
) -> Result<Json<Vec<StoreResponse>>, ApiError> {
    let stores = state
        .db
        .list_popular_stores(query.category, SHELF_LIMIT)
        .await?;
    Ok(Json(stores.iter().map(StoreResponse::from).collect()))
}

/// Store search query.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Name keyword.
    pub keyword: String,
    /// Sort order: `name` (default), `score` or `jjim`. Unknown values
    /// fall back to name ordering.
    pub sort: Option<String>,
}

/// Search stores by name.
pub async fn search_stores(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<StoreResponse>>, ApiError> {
    validate::non_empty("keyword", &query.keyword)?;
    let sort = StoreSort::parse_lenient(query.sort.as_deref());
    let stores = state.db.search_stores(&query.keyword, sort).await?;
    Ok(Json(stores.iter().map(StoreResponse::from).collect()))
}

/// Store detail including favorite and review counts.
#[derive(Debug, Serialize)]
pub struct StoreDetailResponse {
    /// The store.
    #[serde(flatten)]
    pub store: StoreResponse,
    /// Favorites across the store's listings.
    pub jjim_count: i64,
    /// Reviews across the store's listings.
    pub review_count: i64,
}

/// Get one store with its favorite and review counts.
pub async fn get_store(
    State(state): State<Arc<AppState>>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<StoreDetailResponse>, ApiError> {
    let store = state
        .db
        .get_store(store_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("store not found: {store_id}")))?;
    let jjim_count = state.db.count_store_jjims(store_id).await?;
    let review_count = state.db.count_store_reviews(store_id).await?;

    Ok(Json(StoreDetailResponse {
        store: StoreResponse::from(&store),
        jjim_count,
        review_count,
    }))
}

/// Get a store's name and address only.
pub async fn get_store_location(
    State(state): State<Arc<AppState>>,
    Path(store_id): Path<StoreId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let store = state
        .db
        .get_store(store_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("store not found: {store_id}")))?;

    Ok(Json(serde_json::json!({
        "name": store.name,
        "address": store.address,
    })))
}

/// Store profile update request.
#[derive(Debug, Deserialize)]
pub struct UpdateStoreRequest {
    /// New display name.
    pub name: String,
    /// New street address.
    pub address: String,
    /// New category.
    pub category: StoreCategory,
    /// New banner image URL, when replaced.
    pub image_url: Option<String>,
}

/// Update a store profile (owner only).
pub async fn update_store(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(store_id): Path<StoreId>,
    Json(body): Json<UpdateStoreRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    validate::nickname(&body.name)?;
    validate::non_empty("address", &body.address)?;

    let store = state
        .db
        .get_store(store_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("store not found: {store_id}")))?;
    if store.owner_id != auth.user_id {
        return Err(ApiError::Forbidden);
    }

    state
        .db
        .update_store_profile(
            store_id,
            StoreProfileUpdate {
                name: body.name,
                address: body.address,
                image_url: body.image_url,
                category: body.category,
            },
        )
        .await?;

    tracing::info!(store_id = %store_id, "Store profile updated");

    Ok(Json(serde_json::json!({ "updated": true })))
}
