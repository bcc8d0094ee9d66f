//! Image upload integration tests.
//!
//! The object-storage collaborator is mocked with wiremock.

mod common;

use axum::http::StatusCode;

use axum_test::multipart::{MultipartForm, Part};
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{bearer, test_config, TestHarness};
use reborn_service::ServiceConfig;

async fn harness_with_storage() -> (TestHarness, MockServer) {
    let mock = MockServer::start().await;
    let config = ServiceConfig {
        storage_endpoint: Some(mock.uri()),
        storage_api_key: Some("test-storage-key".into()),
        storage_public_url: Some("https://img.example.com".into()),
        ..test_config()
    };
    (TestHarness::with_config(config), mock)
}

fn png_form() -> MultipartForm {
    MultipartForm::new().add_part(
        "image",
        Part::bytes(vec![0x89, b'P', b'N', b'G'])
            .file_name("photo.png")
            .mime_type("image/png"),
    )
}

#[tokio::test]
async fn upload_returns_public_urls() {
    let (harness, mock) = harness_with_storage().await;
    let (token, _) = harness.sign_up_user("neighbor1").await;

    Mock::given(method("PUT"))
        .and(path_regex(r"^/reborn/[0-9a-f-]+\.png$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock)
        .await;

    let response = harness
        .server
        .post("/v1/images")
        .add_header("authorization", bearer(&token))
        .multipart(png_form())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let urls = body["urls"].as_array().expect("urls");
    assert_eq!(urls.len(), 1);
    assert!(urls[0]
        .as_str()
        .expect("url")
        .starts_with("https://img.example.com/"));
}

#[tokio::test]
async fn storage_failure_maps_to_bad_gateway() {
    let (harness, mock) = harness_with_storage().await;
    let (token, _) = harness.sign_up_user("neighbor1").await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock)
        .await;

    let response = harness
        .server
        .post("/v1/images")
        .add_header("authorization", bearer(&token))
        .multipart(png_form())
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn upload_without_storage_is_unavailable() {
    let harness = TestHarness::new();
    let (token, _) = harness.sign_up_user("neighbor1").await;

    let response = harness
        .server
        .post("/v1/images")
        .add_header("authorization", bearer(&token))
        .multipart(png_form())
        .await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn upload_requires_auth() {
    let (harness, _mock) = harness_with_storage().await;

    harness
        .server
        .post("/v1/images")
        .multipart(png_form())
        .await
        .assert_status_unauthorized();
}
