//! Review and score aggregation integration tests.

mod common;

use axum::http::StatusCode;

use common::{bearer, TestHarness};
use serde_json::json;

async fn store_score(harness: &TestHarness, store_id: &str) -> f64 {
    let response = harness.server.get(&format!("/v1/stores/{store_id}")).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    body["score"].as_f64().expect("score")
}

#[tokio::test]
async fn review_requires_a_completed_claim() {
    let harness = TestHarness::new();
    let (owner_token, _) = harness.sign_up_store("owner1").await;
    let listing_id = harness.create_listing(&owner_token, "bread").await;
    let (user_token, _) = harness.sign_up_user("neighbor1").await;

    let response = harness
        .server
        .post("/v1/reviews")
        .add_header("authorization", bearer(&user_token))
        .json(&json!({
            "listing_id": listing_id.parse::<i64>().unwrap(),
            "score": 5,
            "comment": "never picked it up"
        }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn review_scores_outside_range_are_rejected() {
    let harness = TestHarness::new();
    let (owner_token, _) = harness.sign_up_store("owner1").await;
    let listing_id = harness.create_listing(&owner_token, "bread").await;
    let (user_token, _) = harness.sign_up_user("neighbor1").await;
    harness.claim_and_complete(&user_token, &listing_id).await;

    for score in [0, 6] {
        let response = harness
            .server
            .post("/v1/reviews")
            .add_header("authorization", bearer(&user_token))
            .json(&json!({
                "listing_id": listing_id.parse::<i64>().unwrap(),
                "score": score,
                "comment": "out of range"
            }))
            .await;
        response.assert_status_bad_request();
    }
}

#[tokio::test]
async fn more_than_five_images_are_rejected() {
    let harness = TestHarness::new();
    let (owner_token, _) = harness.sign_up_store("owner1").await;
    let listing_id = harness.create_listing(&owner_token, "bread").await;
    let (user_token, _) = harness.sign_up_user("neighbor1").await;
    harness.claim_and_complete(&user_token, &listing_id).await;

    let images: Vec<String> = (0..6).map(|i| format!("https://img/{i}.png")).collect();
    let response = harness
        .server
        .post("/v1/reviews")
        .add_header("authorization", bearer(&user_token))
        .json(&json!({
            "listing_id": listing_id.parse::<i64>().unwrap(),
            "score": 5,
            "comment": "too many pictures",
            "image_urls": images
        }))
        .await;
    response.assert_status_bad_request();
}

#[tokio::test]
async fn posting_reviews_updates_the_store_score() {
    let harness = TestHarness::new();
    let (owner_token, store_id) = harness.sign_up_store("owner1").await;
    let listing_id = harness.create_listing(&owner_token, "bread").await;
    let (user_token, _) = harness.sign_up_user("neighbor1").await;
    harness.claim_and_complete(&user_token, &listing_id).await;

    harness.post_review(&user_token, &listing_id, 4).await;
    assert!((store_score(&harness, &store_id).await - 4.0).abs() < f64::EPSILON);

    harness.post_review(&user_token, &listing_id, 5).await;
    // mean(4, 5) = 4.5
    assert!((store_score(&harness, &store_id).await - 4.5).abs() < f64::EPSILON);

    harness.post_review(&user_token, &listing_id, 3).await;
    // mean(4, 5, 3) = 4.0
    assert!((store_score(&harness, &store_id).await - 4.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn deleting_a_review_recomputes_the_score() {
    let harness = TestHarness::new();
    let (owner_token, store_id) = harness.sign_up_store("owner1").await;
    let listing_id = harness.create_listing(&owner_token, "bread").await;
    let (user_token, _) = harness.sign_up_user("neighbor1").await;
    harness.claim_and_complete(&user_token, &listing_id).await;

    harness.post_review(&user_token, &listing_id, 3).await;
    let response = harness
        .server
        .post("/v1/reviews")
        .add_header("authorization", bearer(&user_token))
        .json(&json!({
            "listing_id": listing_id.parse::<i64>().unwrap(),
            "score": 5,
            "comment": "great"
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let review_id = body["review_id"].as_i64().expect("review_id");

    assert!((store_score(&harness, &store_id).await - 4.0).abs() < f64::EPSILON);

    harness
        .server
        .delete(&format!("/v1/reviews/{review_id}"))
        .add_header("authorization", bearer(&user_token))
        .await
        .assert_status_ok();

    // Only the 3 remains
    assert!((store_score(&harness, &store_id).await - 3.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn only_the_author_may_delete_a_review() {
    let harness = TestHarness::new();
    let (owner_token, _) = harness.sign_up_store("owner1").await;
    let listing_id = harness.create_listing(&owner_token, "bread").await;
    let (user_token, _) = harness.sign_up_user("neighbor1").await;
    let (other_token, _) = harness.sign_up_user("neighbor2").await;
    harness.claim_and_complete(&user_token, &listing_id).await;

    let response = harness
        .server
        .post("/v1/reviews")
        .add_header("authorization", bearer(&user_token))
        .json(&json!({
            "listing_id": listing_id.parse::<i64>().unwrap(),
            "score": 5,
            "comment": "mine"
        }))
        .await;
    let body: serde_json::Value = response.json();
    let review_id = body["review_id"].as_i64().expect("review_id");

    harness
        .server
        .delete(&format!("/v1/reviews/{review_id}"))
        .add_header("authorization", bearer(&other_token))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn review_detail_joins_reviewer_and_store() {
    let harness = TestHarness::new();
    let (owner_token, _) = harness.sign_up_store("owner1").await;
    let listing_id = harness.create_listing(&owner_token, "bread").await;
    let (user_token, _) = harness.sign_up_user("neighbor1").await;
    harness.claim_and_complete(&user_token, &listing_id).await;

    let response = harness
        .server
        .post("/v1/reviews")
        .add_header("authorization", bearer(&user_token))
        .json(&json!({
            "listing_id": listing_id.parse::<i64>().unwrap(),
            "score": 5,
            "comment": "fresh"
        }))
        .await;
    let body: serde_json::Value = response.json();
    let review_id = body["review_id"].as_i64().expect("review_id");

    let response = harness
        .server
        .get(&format!("/v1/reviews/{review_id}"))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["user_nickname"], "neighbor1");
    assert_eq!(body["store_name"], "owner1store");
    assert_eq!(body["product_name"], "bread");
    assert_eq!(body["score"], 5);
}

#[tokio::test]
async fn best_reviews_returns_the_top_five() {
    let harness = TestHarness::new();
    let (owner_token, _) = harness.sign_up_store("owner1").await;
    let listing_id = harness.create_listing(&owner_token, "bread").await;
    let (user_token, _) = harness.sign_up_user("neighbor1").await;
    harness.claim_and_complete(&user_token, &listing_id).await;

    for score in [1, 2, 3, 4, 5, 5] {
        harness.post_review(&user_token, &listing_id, score).await;
    }

    let response = harness.server.get("/v1/reviews/best").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let scores: Vec<i64> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|r| r["score"].as_i64().unwrap())
        .collect();
    assert_eq!(scores, vec![5, 5, 4, 3, 2]);
}

#[tokio::test]
async fn store_reviews_and_count_agree() {
    let harness = TestHarness::new();
    let (owner_token, store_id) = harness.sign_up_store("owner1").await;
    let listing_id = harness.create_listing(&owner_token, "bread").await;
    let (user_token, _) = harness.sign_up_user("neighbor1").await;
    harness.claim_and_complete(&user_token, &listing_id).await;
    harness.post_review(&user_token, &listing_id, 4).await;
    harness.post_review(&user_token, &listing_id, 5).await;

    let response = harness
        .server
        .get(&format!("/v1/stores/{store_id}/reviews"))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body.as_array().expect("array").len(), 2);

    let response = harness
        .server
        .get(&format!("/v1/stores/{store_id}/reviews/count"))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["count"], 2);
}

// ============================================================================
// Bulk recomputation (operational endpoint)
// ============================================================================

#[tokio::test]
async fn bulk_recompute_requires_the_service_key() {
    let harness = TestHarness::new();

    harness
        .server
        .post("/v1/admin/recompute-scores")
        .await
        .assert_status_unauthorized();

    harness
        .server
        .post("/v1/admin/recompute-scores")
        .add_header("x-api-key", "wrong-key")
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn bulk_recompute_reports_stores_updated() {
    let harness = TestHarness::new();
    let (owner_a, _) = harness.sign_up_store("storea").await;
    let (owner_b, _) = harness.sign_up_store("storeb").await;
    let listing_a = harness.create_listing(&owner_a, "bread").await;
    let listing_b = harness.create_listing(&owner_b, "cake").await;
    let (user_token, _) = harness.sign_up_user("neighbor1").await;
    harness.claim_and_complete(&user_token, &listing_a).await;
    harness.claim_and_complete(&user_token, &listing_b).await;
    harness.post_review(&user_token, &listing_a, 4).await;
    harness.post_review(&user_token, &listing_b, 5).await;

    let response = harness
        .server
        .post("/v1/admin/recompute-scores")
        .add_header("x-api-key", harness.service_api_key.clone())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["updated"], 2);
}
