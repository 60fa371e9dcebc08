use std::sync::Arc;

use gpuwatch_core::config::{AppConfig, ConfigError, LoadOptions};
use gpuwatch_feed::{load_board, FeedError, HttpPriceSource};
use thiserror::Error;
use tracing::info;

use crate::state::AppState;

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("feed client construction failed: {0}")]
    FeedClient(#[source] FeedError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

/// Build the application from an already-loaded config. The initial board
/// load completes before any handler is wired up, so the first page render
/// never races an empty snapshot.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let source =
        Arc::new(HttpPriceSource::from_config(&config.feed).map_err(BootstrapError::FeedClient)?);

    let initial = load_board(source.as_ref()).await;
    info!(
        event_name = "system.bootstrap.board_loaded",
        correlation_id = "bootstrap",
        origin = ?initial.origin,
        record_count = initial.records.len(),
        "initial price board loaded"
    );

    let state = AppState::new(source, initial);
    Ok(Application { config, state })
}
