//! Store browsing and search integration tests.

mod common;

use axum::http::StatusCode;

use common::{bearer, TestHarness};
use serde_json::json;

#[tokio::test]
async fn store_detail_includes_counts() {
    let harness = TestHarness::new();
    let (owner_token, store_id) = harness.sign_up_store("owner1").await;
    let listing_id = harness.create_listing(&owner_token, "bread").await;

    let (user_token, _) = harness.sign_up_user("neighbor1").await;
    harness
        .server
        .post("/v1/jjim")
        .add_header("authorization", bearer(&user_token))
        .json(&json!({ "listing_id": listing_id.parse::<i64>().unwrap() }))
        .await
        .assert_status_ok();

    let response = harness.server.get(&format!("/v1/stores/{store_id}")).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["jjim_count"], 1);
    assert_eq!(body["review_count"], 0);
    assert_eq!(body["score"], 0.0);
}

#[tokio::test]
async fn unknown_store_is_not_found() {
    let harness = TestHarness::new();
    let response = harness.server.get("/v1/stores/999").await;
    response.assert_status_not_found();
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn location_returns_name_and_address_only() {
    let harness = TestHarness::new();
    let (_, store_id) = harness.sign_up_store("owner1").await;

    let response = harness
        .server
        .get(&format!("/v1/stores/{store_id}/location"))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["name"], "owner1store");
    assert_eq!(body["address"], "Mapo, Seoul");
    assert!(body.get("score").is_none());
}

#[tokio::test]
async fn search_requires_keyword() {
    let harness = TestHarness::new();
    harness.sign_up_store("owner1").await;

    harness
        .server
        .get("/v1/stores/search")
        .add_query_param("keyword", "")
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn search_finds_stores_by_partial_name() {
    let harness = TestHarness::new();
    harness.sign_up_store("bakery1").await;
    harness.sign_up_store("noodles").await;

    let response = harness
        .server
        .get("/v1/stores/search")
        .add_query_param("keyword", "bakery")
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let names: Vec<_> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["bakery1store"]);
}

#[tokio::test]
async fn search_sorts_by_score_when_requested() {
    let harness = TestHarness::new();

    // Two stores, the second earning the higher score
    let (owner_a, _) = harness.sign_up_store("storea").await;
    let (owner_b, _) = harness.sign_up_store("storeb").await;
    let listing_a = harness.create_listing(&owner_a, "bread").await;
    let listing_b = harness.create_listing(&owner_b, "cake").await;

    let (user_token, _) = harness.sign_up_user("neighbor1").await;
    harness.claim_and_complete(&user_token, &listing_a).await;
    harness.claim_and_complete(&user_token, &listing_b).await;
    harness.post_review(&user_token, &listing_a, 3).await;
    harness.post_review(&user_token, &listing_b, 5).await;

    let response = harness
        .server
        .get("/v1/stores/search")
        .add_query_param("keyword", "store")
        .add_query_param("sort", "score")
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let names: Vec<_> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["storebstore", "storeastore"]);
}

#[tokio::test]
async fn search_unknown_sort_falls_back_to_name() {
    let harness = TestHarness::new();
    harness.sign_up_store("zstore").await;
    harness.sign_up_store("astore").await;

    let response = harness
        .server
        .get("/v1/stores/search")
        .add_query_param("keyword", "store")
        .add_query_param("sort", "bogus")
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let names: Vec<_> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|s| s["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["astorestore", "zstorestore"]);
}

#[tokio::test]
async fn popular_ranks_by_score_within_category() {
    let harness = TestHarness::new();
    let (owner_a, _) = harness.sign_up_store("storea").await;
    let (owner_b, _) = harness.sign_up_store("storeb").await;
    let listing_a = harness.create_listing(&owner_a, "bread").await;
    let listing_b = harness.create_listing(&owner_b, "cake").await;

    let (user_token, _) = harness.sign_up_user("neighbor1").await;
    harness.claim_and_complete(&user_token, &listing_a).await;
    harness.claim_and_complete(&user_token, &listing_b).await;
    harness.post_review(&user_token, &listing_a, 2).await;
    harness.post_review(&user_token, &listing_b, 5).await;

    let response = harness
        .server
        .get("/v1/stores/popular")
        .add_query_param("category", "cafe")
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let first = &body.as_array().expect("array")[0];
    assert_eq!(first["name"], "storebstore");
    assert_eq!(first["score"], 5.0);
}

#[tokio::test]
async fn only_the_owner_may_update_a_store() {
    let harness = TestHarness::new();
    let (_, store_id) = harness.sign_up_store("owner1").await;
    let (other_token, _) = harness.sign_up_user("neighbor1").await;

    let response = harness
        .server
        .patch(&format!("/v1/stores/{store_id}"))
        .add_header("authorization", bearer(&other_token))
        .json(&json!({
            "name": "hijacked",
            "address": "nowhere",
            "category": "etc"
        }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}
