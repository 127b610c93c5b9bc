//! Read-only collaborators the coordinator consults per request.
//!
//! [`TenantConfigProvider`] hands out tenant snapshots; [`NewsIndexLookup`]
//! resolves a result URL to a news item. Both have in-memory
//! implementations here so the engine can run without external services.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::TenantConfig;
use crate::types::NewsItem;

/// Source of tenant configuration.
///
/// Implementations return an immutable snapshot; a request keeps the
/// snapshot it started with even if the source changes meanwhile.
pub trait TenantConfigProvider: Send + Sync {
    /// The tenant registered under `handle`, if any.
    fn tenant(&self, handle: &str) -> Option<Arc<TenantConfig>>;
}

/// A fixed set of tenants keyed by handle.
#[derive(Debug, Clone, Default)]
pub struct StaticTenants {
    tenants: HashMap<String, Arc<TenantConfig>>,
}

impl StaticTenants {
    pub fn new<I: IntoIterator<Item = TenantConfig>>(tenants: I) -> Self {
        let tenants = tenants
            .into_iter()
            .map(|tenant| (tenant.handle.clone(), Arc::new(tenant)))
            .collect();
        Self { tenants }
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }
}

impl TenantConfigProvider for StaticTenants {
    fn tenant(&self, handle: &str) -> Option<Arc<TenantConfig>> {
        self.tenants.get(handle).cloned()
    }
}

/// Lookup of news items by exact URL.
pub trait NewsIndexLookup: Send + Sync {
    /// The news item whose link is exactly `url`.
    fn lookup(&self, url: &str) -> Option<NewsItem>;
}

impl NewsIndexLookup for HashMap<String, NewsItem> {
    fn lookup(&self, url: &str) -> Option<NewsItem> {
        self.get(url).cloned()
    }
}

/// Build a URL-keyed map from news items. Later items win on duplicate links.
pub fn news_map<I: IntoIterator<Item = NewsItem>>(items: I) -> HashMap<String, NewsItem> {
    items
        .into_iter()
        .map(|item| (item.link.clone(), item))
        .collect()
}

/// A live index consulted before a cached mirror.
pub struct LayeredNewsLookup {
    live: Arc<dyn NewsIndexLookup>,
    mirror: Arc<dyn NewsIndexLookup>,
}

impl LayeredNewsLookup {
    pub fn new(live: Arc<dyn NewsIndexLookup>, mirror: Arc<dyn NewsIndexLookup>) -> Self {
        Self { live, mirror }
    }
}

impl NewsIndexLookup for LayeredNewsLookup {
    fn lookup(&self, url: &str) -> Option<NewsItem> {
        self.live.lookup(url).or_else(|| self.mirror.lookup(url))
    }
}
