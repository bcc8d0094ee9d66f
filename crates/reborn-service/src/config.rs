//! Service configuration.

use serde::Deserialize;
use std::path::Path;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Maximum connections in the database pool.
    pub db_max_connections: u32,

    /// HS256 secret for signing and validating session tokens.
    pub jwt_secret: String,

    /// Session token lifetime in seconds (default: 24 hours).
    pub token_ttl_seconds: i64,

    /// Service API key for service-to-service auth.
    pub service_api_key: Option<String>,

    /// Object-storage endpoint for image upload (optional).
    pub storage_endpoint: Option<String>,

    /// Object-storage API key (optional).
    pub storage_api_key: Option<String>,

    /// Bucket for uploaded images.
    pub storage_bucket: String,

    /// Public base URL uploaded images are served from.
    pub storage_public_url: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Storage secrets file structure.
#[derive(Debug, Deserialize)]
struct StorageSecrets {
    endpoint: String,
    api_key: String,
    #[serde(default)]
    public_url: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        // Try to load storage secrets from file first, then fall back to env vars
        let (storage_endpoint, storage_api_key, storage_public_url) = load_storage_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/reborn".into()),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or_else(|_| "insecure-dev-secret".into()),
            token_ttl_seconds: std::env::var("TOKEN_TTL_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60 * 60 * 24),
            service_api_key: std::env::var("SERVICE_API_KEY").ok(),
            storage_endpoint,
            storage_api_key,
            storage_bucket: std::env::var("STORAGE_BUCKET").unwrap_or_else(|_| "reborn".into()),
            storage_public_url,
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10 * 1024 * 1024), // 10MB, image uploads included
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

/// Load object-storage secrets from file or environment.
fn load_storage_secrets() -> (Option<String>, Option<String>, Option<String>) {
    let secret_paths = [
        ".secrets/storage.json",
        "reborn/.secrets/storage.json",
        "../.secrets/storage.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<StorageSecrets>(path) {
            tracing::info!(path = %path, "Loaded storage secrets from file");
            return (
                Some(secrets.endpoint),
                Some(secrets.api_key),
                secrets.public_url,
            );
        }
    }

    // Fall back to environment variables
    tracing::debug!("Storage secrets file not found, using environment variables");
    (
        std::env::var("STORAGE_ENDPOINT").ok(),
        std::env::var("STORAGE_API_KEY").ok(),
        std::env::var("STORAGE_PUBLIC_URL").ok(),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            database_url: "postgres://localhost/reborn".into(),
            db_max_connections: 10,
            jwt_secret: "insecure-dev-secret".into(),
            token_ttl_seconds: 60 * 60 * 24,
            service_api_key: None,
            storage_endpoint: None,
            storage_api_key: None,
            storage_bucket: "reborn".into(),
            storage_public_url: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 10 * 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}
