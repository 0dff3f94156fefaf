//! Wires the engine from the on-disk configuration.

use anyhow::{Context, Result};
use leafdoc_infrastructure::{ConfigService, FileKeyValueStore, LeafdocPaths};
use leafdoc_interaction::GeminiPlantAnalyzer;
use std::sync::Arc;

use crate::history_store::HistoryStore;
use crate::scan_engine::ScanEngine;

/// Builds a [`ScanEngine`] backed by the Gemini analyzer and a file store
/// under the leafdoc config directory.
///
/// A missing API key is not an error here: scans then produce fallback
/// records explaining that analysis is unavailable.
pub async fn bootstrap(paths: LeafdocPaths) -> Result<ScanEngine> {
    let config_service = ConfigService::new(paths.clone());
    let config = config_service
        .load_engine_config()
        .await
        .context("Failed to load config.toml")?;
    tracing::info!(
        "[Bootstrap] Analyzer model: {}, tick interval: {}ms",
        config.analyzer.model,
        config.progress.tick_interval_ms
    );

    let api_key = config_service.resolve_api_key().await;
    let analyzer = GeminiPlantAnalyzer::new(api_key, config.analyzer.clone())
        .context("Failed to create Gemini analyzer")?;
    if !analyzer.has_credential() {
        tracing::warn!("[Bootstrap] No Gemini API key configured, scans will record fallbacks");
    }

    let store_dir = paths
        .store_dir()
        .context("Failed to resolve the leafdoc store directory")?;
    tracing::info!("[Bootstrap] Using store directory {}", store_dir.display());
    let store = Arc::new(FileKeyValueStore::new(store_dir));
    let history = Arc::new(HistoryStore::load(store).await);

    Ok(ScanEngine::new(
        Arc::new(analyzer),
        history,
        config.progress,
    ))
}
