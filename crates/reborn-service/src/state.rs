//! Application state.

use std::sync::Arc;

use reborn_store::Database;

use crate::config::ServiceConfig;
use crate::images::ImageStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub db: Arc<dyn Database>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Object-storage client for image upload (optional).
    pub images: Option<Arc<ImageStore>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(db: Arc<dyn Database>, config: ServiceConfig) -> Self {
        // Create the image store client if configured
        let images = config
            .storage_endpoint
            .as_ref()
            .zip(config.storage_api_key.as_ref())
            .and_then(|(endpoint, key)| {
                match ImageStore::new(
                    endpoint,
                    key,
                    &config.storage_bucket,
                    config.storage_public_url.as_deref(),
                ) {
                    Ok(client) => {
                        tracing::info!(endpoint = %endpoint, "Image storage enabled");
                        Some(Arc::new(client))
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to create image store client");
                        None
                    }
                }
            });

        if images.is_none() {
            tracing::warn!("Image storage not configured - uploads will be rejected");
        }

        Self { db, config, images }
    }
}
