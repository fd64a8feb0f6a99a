//! Application initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod telemetry;

use crate::state::AppState;
use anyhow::Result;
use axum::Router;
use hakobu_core::Config;
use hakobu_extraction::{ClaudeClient, DocumentUnderstanding, ExtractionClientConfig};
use std::sync::Arc;

/// Build database pool, state, and router.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router)> {
    let pool = database::setup_database(&config).await?;

    let extraction_client: Option<Arc<dyn DocumentUnderstanding>> =
        match config.extraction_api_key() {
            Some(api_key) => {
                let client = ClaudeClient::new(ExtractionClientConfig {
                    api_url: config.extraction_api_url().to_string(),
                    api_key: api_key.to_string(),
                    model: config.extraction_model().to_string(),
                    max_tokens: config.extraction_max_tokens(),
                })?;
                Some(Arc::new(client))
            }
            None => {
                tracing::warn!(
                    "EXTRACTION_API_KEY is not set; document extraction endpoints will refuse"
                );
                None
            }
        };

    let state = Arc::new(AppState::new(config.clone(), pool, extraction_client));
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
