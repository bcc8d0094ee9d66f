//! Object-storage client for image upload.
//!
//! Uploaded images are stored under fresh UUID keys and served from a
//! public base URL.

use reqwest::Client;
use std::time::Duration;
use uuid::Uuid;

/// Error type for image storage operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageStoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Storage API returned an error.
    #[error("storage API error: {status} - {message}")]
    Api {
        /// HTTP status.
        status: u16,
        /// Error message body.
        message: String,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Object-storage API client.
#[derive(Debug, Clone)]
pub struct ImageStore {
    client: Client,
    endpoint: String,
    api_key: String,
    bucket: String,
    public_url: String,
}

impl ImageStore {
    /// Create a new image store client.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Storage API base URL
    /// * `api_key` - Storage API key
    /// * `bucket` - Bucket uploaded images land in
    /// * `public_url` - Base URL images are served from; defaults to
    ///   `{endpoint}/{bucket}` when not set
    ///
    /// # Errors
    ///
    /// Returns `ImageStoreError::Configuration` if the HTTP client cannot
    /// be built.
    pub fn new(
        endpoint: &str,
        api_key: &str,
        bucket: &str,
        public_url: Option<&str>,
    ) -> Result<Self, ImageStoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ImageStoreError::Configuration(e.to_string()))?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        let public_url = public_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("{endpoint}/{bucket}"));

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
            bucket: bucket.to_string(),
            public_url,
        })
    }

    /// Upload one image under a fresh UUID key; returns the public URL.
    pub async fn upload(
        &self,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ImageStoreError> {
        let key = object_key(content_type);

        let response = self
            .client
            .put(format!("{}/{}/{key}", self.endpoint, self.bucket))
            .bearer_auth(&self.api_key)
            .header("content-type", content_type)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(ImageStoreError::Api { status, message });
        }

        tracing::debug!(key = %key, "image uploaded");
        Ok(format!("{}/{key}", self.public_url))
    }
}

/// Generate an object key with an extension matching the content type.
fn object_key(content_type: &str) -> String {
    let ext = match content_type {
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        // png is what the mobile clients send by default
        _ => "png",
    };
    format!("{}.{ext}", Uuid::new_v4())
}
