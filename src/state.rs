use crate::config::Config;
use crate::services::blob_store::BlobStore;
use crate::services::template::engine::TemplateEngine;
use crate::services::upstream::{CompletionClient, OpenAiClient};
use anyhow::Result;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub blobs: Arc<BlobStore>,
    pub upstream: Arc<dyn CompletionClient>,
    pub templates: Arc<TemplateEngine>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_upstream(config, Arc::new(OpenAiClient::new()))
    }

    /// Same as [`AppState::new`] with a caller supplied model client
    pub fn with_upstream(config: Config, upstream: Arc<dyn CompletionClient>) -> Result<Self> {
        tracing::info!("[STATE] Initializing AppState...");
        tracing::info!("[STATE]   Model: {}", config.llm_model_name);
        tracing::info!("[STATE]   Vision input: {}", config.llm_supports_vision);
        tracing::info!(
            "[STATE]   Uploads: max {} bytes, ttl {:?}",
            config.upload_max_bytes,
            config.upload_ttl
        );
        if config.upstream_settings().is_err() {
            tracing::warn!("[STATE] ⚠️ Model API is not fully configured, streaming requests will be rejected");
        }

        let blobs = Arc::new(BlobStore::new(config.upload_ttl));
        let templates = TemplateEngine::new()?;

        Ok(Self {
            config: Arc::new(config),
            blobs,
            upstream,
            templates: Arc::new(templates),
        })
    }
}
