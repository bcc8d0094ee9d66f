//! Common test utilities for reborn integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::json;

use reborn_service::{create_router, AppState, ServiceConfig};
use reborn_store::MemDatabase;

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct handle on the in-memory database for seeding and fault
    /// injection.
    pub db: Arc<MemDatabase>,
    /// The service API key for operational requests.
    pub service_api_key: String,
}

impl TestHarness {
    /// Create a new test harness with a fresh in-memory database.
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Create a harness with a custom configuration.
    pub fn with_config(config: ServiceConfig) -> Self {
        let db = Arc::new(MemDatabase::new());
        let service_api_key = config
            .service_api_key
            .clone()
            .unwrap_or_else(|| "test-service-key".to_string());

        let state = AppState::new(db.clone(), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            db,
            service_api_key,
        }
    }

    /// Register a neighbor account and log in; returns (token, user id).
    pub async fn sign_up_user(&self, login_id: &str) -> (String, String) {
        self.server
            .post("/v1/users/sign-up")
            .json(&json!({
                "login_id": login_id,
                "email": format!("{login_id}@example.com"),
                "password": "pass123!word",
                "nickname": login_id,
                "address": "Seoul",
                "likes": "cafe",
                "birth_date": "19900101"
            }))
            .await
            .assert_status_ok();

        let response = self
            .server
            .post("/v1/users/log-in")
            .json(&json!({
                "login_id": login_id,
                "password": "pass123!word"
            }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        (
            body["token"].as_str().expect("token").to_string(),
            body["user_id"].as_str().expect("user_id").to_string(),
        )
    }

    /// Register a store account and log in; returns (token, store id).
    pub async fn sign_up_store(&self, login_id: &str) -> (String, String) {
        self.server
            .post("/v1/users/sign-up-store")
            .json(&json!({
                "login_id": login_id,
                "email": format!("{login_id}@example.com"),
                "password": "pass123!word",
                "nickname": login_id,
                "address": "Seoul",
                "store_name": format!("{login_id}store"),
                "registration_number": "123-45-67890",
                "store_address": "Mapo, Seoul",
                "category": "cafe"
            }))
            .await
            .assert_status_ok();

        let response = self
            .server
            .post("/v1/users/log-in-store")
            .json(&json!({
                "login_id": login_id,
                "password": "pass123!word"
            }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        (
            body["token"].as_str().expect("token").to_string(),
            body["store_id"].as_str().expect("store_id").to_string(),
        )
    }

    /// Create a listing with the given owner token; returns the listing id.
    pub async fn create_listing(&self, owner_token: &str, product_name: &str) -> String {
        let response = self
            .server
            .post("/v1/listings")
            .add_header("authorization", bearer(owner_token))
            .json(&json!({
                "product_name": product_name,
                "product_guide": "pick up after 8pm",
                "product_comment": "assorted leftovers",
                "available_count": 10
            }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["listing_id"].as_str().expect("listing_id").to_string()
    }

    /// Claim a listing and complete the task; a completed claim is the
    /// precondition for reviewing.
    pub async fn claim_and_complete(&self, user_token: &str, listing_id: &str) -> String {
        let response = self
            .server
            .post(&format!("/v1/listings/{listing_id}/claim"))
            .add_header("authorization", bearer(user_token))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        let task_id = body["task_id"].as_i64().expect("task_id").to_string();

        self.server
            .post(&format!("/v1/tasks/{task_id}/complete"))
            .add_header("authorization", bearer(user_token))
            .await
            .assert_status_ok();
        task_id
    }

    /// Post a review for a listing the user has a completed claim on.
    pub async fn post_review(&self, user_token: &str, listing_id: &str, score: i32) {
        self.server
            .post("/v1/reviews")
            .add_header("authorization", bearer(user_token))
            .json(&json!({
                "listing_id": listing_id.parse::<i64>().expect("listing id"),
                "score": score,
                "comment": "tasty"
            }))
            .await
            .assert_status_ok();
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for tests: fixed JWT secret and service key.
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        jwt_secret: "test-jwt-secret".into(),
        service_api_key: Some("test-service-key".into()),
        ..ServiceConfig::default()
    }
}

/// Format a Bearer authorization header value.
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
