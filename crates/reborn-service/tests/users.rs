//! Account registration, login and profile integration tests.

mod common;

use axum::http::StatusCode;

use common::{bearer, TestHarness};
use serde_json::json;

// ============================================================================
// Sign-up
// ============================================================================

#[tokio::test]
async fn sign_up_success() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/users/sign-up")
        .json(&json!({
            "login_id": "neighbor1",
            "email": "neighbor1@example.com",
            "password": "pass123!word",
            "nickname": "neighbor1",
            "address": "Seoul",
            "likes": "cafe",
            "birth_date": "19900101"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["login_id"], "neighbor1");
    assert_eq!(body["point"], 0);
}

#[tokio::test]
async fn sign_up_rejects_short_login_id() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/users/sign-up")
        .json(&json!({
            "login_id": "ab",
            "email": "ab@example.com",
            "password": "pass123!word",
            "nickname": "shorty",
            "address": "Seoul",
            "likes": "cafe"
        }))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn sign_up_rejects_weak_password() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/users/sign-up")
        .json(&json!({
            "login_id": "neighbor1",
            "email": "neighbor1@example.com",
            "password": "abcd1234", // no symbol
            "nickname": "neighbor1",
            "address": "Seoul",
            "likes": "cafe"
        }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn sign_up_duplicate_login_id_conflicts() {
    let harness = TestHarness::new();
    harness.sign_up_user("neighbor1").await;

    let response = harness
        .server
        .post("/v1/users/sign-up")
        .json(&json!({
            "login_id": "neighbor1",
            "email": "other@example.com",
            "password": "pass123!word",
            "nickname": "other",
            "address": "Seoul",
            "likes": "cafe"
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn check_duplicate_reflects_registration() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/users/check-duplicate")
        .add_query_param("login_id", "neighbor1")
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["available"], true);

    harness.sign_up_user("neighbor1").await;

    let response = harness
        .server
        .get("/v1/users/check-duplicate")
        .add_query_param("login_id", "neighbor1")
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["available"], false);
}

// ============================================================================
// Login
// ============================================================================

#[tokio::test]
async fn log_in_with_wrong_password_fails() {
    let harness = TestHarness::new();
    harness.sign_up_user("neighbor1").await;

    let response = harness
        .server
        .post("/v1/users/log-in")
        .json(&json!({
            "login_id": "neighbor1",
            "password": "wrong123!pass"
        }))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn store_login_returns_store_id() {
    let harness = TestHarness::new();
    let (_, store_id) = harness.sign_up_store("owner1").await;
    assert!(!store_id.is_empty());
}

#[tokio::test]
async fn neighbor_cannot_log_in_as_store() {
    let harness = TestHarness::new();
    harness.sign_up_user("neighbor1").await;

    let response = harness
        .server
        .post("/v1/users/log-in-store")
        .json(&json!({
            "login_id": "neighbor1",
            "password": "pass123!word"
        }))
        .await;

    response.assert_status_unauthorized();
}

// ============================================================================
// Profile
// ============================================================================

#[tokio::test]
async fn me_requires_auth() {
    let harness = TestHarness::new();
    harness.server.get("/v1/users/me").await.assert_status_unauthorized();
}

#[tokio::test]
async fn me_returns_profile() {
    let harness = TestHarness::new();
    let (token, _) = harness.sign_up_user("neighbor1").await;

    let response = harness
        .server
        .get("/v1/users/me")
        .add_header("authorization", bearer(&token))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["login_id"], "neighbor1");
    assert_eq!(body["likes"], "cafe");
}

#[tokio::test]
async fn update_profile_changes_nickname() {
    let harness = TestHarness::new();
    let (token, _) = harness.sign_up_user("neighbor1").await;

    harness
        .server
        .patch("/v1/users/me")
        .add_header("authorization", bearer(&token))
        .json(&json!({
            "nickname": "newname",
            "address": "Busan",
            "likes": "book"
        }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get("/v1/users/me")
        .add_header("authorization", bearer(&token))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["nickname"], "newname");
    assert_eq!(body["address"], "Busan");
    assert_eq!(body["likes"], "book");
}

#[tokio::test]
async fn change_password_requires_current_password() {
    let harness = TestHarness::new();
    let (token, _) = harness.sign_up_user("neighbor1").await;

    let response = harness
        .server
        .patch("/v1/users/me/password")
        .add_header("authorization", bearer(&token))
        .json(&json!({
            "current_password": "wrong123!pass",
            "new_password": "next456!word"
        }))
        .await;
    response.assert_status_unauthorized();

    harness
        .server
        .patch("/v1/users/me/password")
        .add_header("authorization", bearer(&token))
        .json(&json!({
            "current_password": "pass123!word",
            "new_password": "next456!word"
        }))
        .await
        .assert_status_ok();

    // Old password stops working, new one logs in
    harness
        .server
        .post("/v1/users/log-in")
        .json(&json!({ "login_id": "neighbor1", "password": "pass123!word" }))
        .await
        .assert_status_unauthorized();
    harness
        .server
        .post("/v1/users/log-in")
        .json(&json!({ "login_id": "neighbor1", "password": "next456!word" }))
        .await
        .assert_status_ok();
}

// ============================================================================
// Points
// ============================================================================

#[tokio::test]
async fn points_accumulate_and_spend() {
    let harness = TestHarness::new();
    let (token, _) = harness.sign_up_user("neighbor1").await;

    let response = harness
        .server
        .patch("/v1/users/me/point")
        .add_header("authorization", bearer(&token))
        .json(&json!({ "delta": 500 }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["point"], 500);

    let response = harness
        .server
        .patch("/v1/users/me/point")
        .add_header("authorization", bearer(&token))
        .json(&json!({ "delta": -200 }))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["point"], 300);

    let response = harness
        .server
        .get("/v1/users/me/point")
        .add_header("authorization", bearer(&token))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["point"], 300);
}

// ============================================================================
// Deletion
// ============================================================================

#[tokio::test]
async fn deleted_account_cannot_log_in() {
    let harness = TestHarness::new();
    let (token, _) = harness.sign_up_user("neighbor1").await;

    harness
        .server
        .post("/v1/users/me/delete")
        .add_header("authorization", bearer(&token))
        .await
        .assert_status_ok();

    harness
        .server
        .post("/v1/users/log-in")
        .json(&json!({ "login_id": "neighbor1", "password": "pass123!word" }))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn deleted_store_disappears_from_listings() {
    let harness = TestHarness::new();
    let (token, store_id) = harness.sign_up_store("owner1").await;

    harness
        .server
        .post("/v1/users/me/delete-store")
        .add_header("authorization", bearer(&token))
        .await
        .assert_status_ok();

    let response = harness.server.get("/v1/stores").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let listed = body
        .as_array()
        .expect("array")
        .iter()
        .any(|s| s["store_id"] == store_id.as_str());
    assert!(!listed);
}
