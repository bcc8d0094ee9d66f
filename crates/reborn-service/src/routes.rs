//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, images, jjim, listings, reviews, stores, users};
use crate::state::AppState;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - Sign-up, login and store/review browsing under `/v1`
///
/// ## Authenticated (Bearer JWT)
/// - Profile, points, listings, claims, reviews, favorites, image upload
///
/// ## Service (API key)
/// - `POST /v1/admin/recompute-scores` - Bulk score recomputation
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let api_routes = Router::new()
        // Accounts
        .route("/users/sign-up", post(users::sign_up))
        .route("/users/sign-up-store", post(users::sign_up_store))
        .route("/users/check-duplicate", get(users::check_duplicate))
        .route("/users/log-in", post(users::log_in))
        .route("/users/log-in-store", post(users::log_in_store))
        .route("/users/me", get(users::me))
        .route("/users/me", patch(users::update_me))
        .route("/users/me/point", get(users::get_point))
        .route("/users/me/point", patch(users::adjust_point))
        .route("/users/me/password", patch(users::change_password))
        .route("/users/me/delete", post(users::delete_me))
        .route("/users/me/delete-store", post(users::delete_store_me))
        // User shelves
        .route("/users/me/in-progress", get(listings::in_progress))
        .route("/users/me/history", get(listings::history))
        .route("/users/me/reviews", get(reviews::my_reviews))
        .route("/users/me/jjim", get(jjim::list_jjims))
        // Stores
        .route("/stores", get(stores::list_stores))
        .route("/stores/new", get(stores::new_stores))
        .route("/stores/popular", get(stores::popular_stores))
        .route("/stores/search", get(stores::search_stores))
        .route("/stores/:id", get(stores::get_store))
        .route("/stores/:id", patch(stores::update_store))
        .route("/stores/:id/location", get(stores::get_store_location))
        .route("/stores/:id/listings", get(listings::store_listings))
        .route("/stores/:id/reviews", get(reviews::store_reviews))
        .route("/stores/:id/reviews/count", get(reviews::store_review_count))
        // Listings and claims
        .route("/listings", post(listings::create_listing))
        .route("/listings/:id", patch(listings::update_listing))
        .route("/listings/:id/active", post(listings::toggle_listing))
        .route("/listings/:id/delete", post(listings::delete_listing))
        .route("/listings/:id/claim", post(listings::claim_listing))
        .route("/tasks/:id", get(listings::task_detail))
        .route("/tasks/:id/complete", post(listings::complete_task))
        .route("/tasks/:id/cancel", post(listings::cancel_task))
        // Reviews
        .route("/reviews", post(reviews::create_review))
        .route("/reviews/best", get(reviews::best_reviews))
        .route("/reviews/:id", get(reviews::get_review))
        .route("/reviews/:id", delete(reviews::delete_review))
        // Favorites
        .route("/jjim", post(jjim::create_jjim))
        .route("/jjim", delete(jjim::delete_jjim))
        // Images
        .route("/images", post(images::upload_images))
        // Operational
        .route("/admin/recompute-scores", post(reviews::recompute_scores))
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API v1 routes (rate limited)
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
