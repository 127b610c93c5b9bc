//! Wiring: turn an [`AppConfig`] into a ready [`SearchCoordinator`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sitesearch_core::lookup::news_map;
use sitesearch_core::{
    CachingTransport, HttpTransport, NewsItem, ProviderKind, SearchCoordinator, StaticTenants,
};

use crate::config::AppConfig;
use crate::error::{AppError, Result};

/// Provider transport used by the host: HTTP behind the optional cache.
pub type HostTransport = CachingTransport<HttpTransport>;

/// The coordinator type the host serves requests with.
pub type HostCoordinator = SearchCoordinator<HostTransport, HostTransport>;

/// Build a coordinator from a validated configuration.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, a transport cannot be
/// built, or the news fixture cannot be loaded.
pub fn build_coordinator(config: &AppConfig) -> Result<HostCoordinator> {
    config.validate()?;
    let engine = &config.engine;

    let transport = |kind: ProviderKind| -> Result<HostTransport> {
        let http_config = match kind {
            ProviderKind::WebApi => config.web_api.clone(),
            ProviderKind::LocalIndex => config.local_index.clone(),
        };
        let connect_timeout = Duration::from_millis(engine.provider(kind).attempt_timeout_ms);
        let http = HttpTransport::new(kind, http_config, connect_timeout)?;
        Ok(CachingTransport::new(
            http,
            engine.cache_ttl_seconds,
            engine.cache_max_entries,
        ))
    };

    let tenants = StaticTenants::new(config.tenants.iter().cloned());
    tracing::info!(
        tenants = tenants.len(),
        cache_ttl_seconds = engine.cache_ttl_seconds,
        "search coordinator configured"
    );

    let mut coordinator = SearchCoordinator::new(
        engine.clone(),
        Arc::new(tenants),
        transport(ProviderKind::WebApi)?,
        transport(ProviderKind::LocalIndex)?,
    )?;

    if let Some(path) = &config.news_items_path {
        let items = load_news_items(path)?;
        tracing::info!(count = items.len(), path = %path.display(), "news items loaded");
        coordinator = coordinator.with_news(Arc::new(news_map(items)));
    }

    Ok(coordinator)
}

/// Read a JSON array of news items.
///
/// # Errors
///
/// Returns [`AppError::Io`] if the file cannot be read and
/// [`AppError::Config`] if it is not a list of news items.
pub fn load_news_items(path: &Path) -> Result<Vec<NewsItem>> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| AppError::Config(format!("news items in {}: {e}", path.display())))
}
