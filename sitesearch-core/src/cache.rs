//! Payload cache for provider transports.
//!
//! [`CachingTransport`] wraps any [`ProviderTransport`] and caches raw
//! payloads keyed by provider and request parameters, using [`moka`] for
//! async-friendly caching with TTL and automatic eviction. Cached payloads
//! report [`CacheStatus::Hit`], fresh ones [`CacheStatus::Miss`]. With
//! caching disabled the wrapper is a pass-through and payloads keep the
//! inner transport's status.

use std::time::Duration;

use moka::future::Cache;

use crate::error::TransportError;
use crate::provider::{ProviderQuery, ProviderTransport, RawPayload, ResponseAdapter};
use crate::types::{CacheStatus, ProviderKind};

/// Cache key: the provider plus its exact request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    provider: ProviderKind,
    params: Vec<(&'static str, String)>,
}

impl CacheKey {
    /// Build a deterministic key for `query` sent to `provider`.
    ///
    /// Parameters are sorted so that ordering differences between adapters
    /// never split one logical request into two entries.
    pub fn new(provider: ProviderKind, query: &ProviderQuery) -> Self {
        let mut params = provider.request_params(query);
        params.sort();
        // Tenants share a provider but not results.
        params.push(("__tenant", query.tenant.clone()));
        Self { provider, params }
    }
}

/// A transport wrapper that serves repeated queries from memory.
pub struct CachingTransport<T> {
    inner: T,
    cache: Option<Cache<CacheKey, RawPayload>>,
}

impl<T: ProviderTransport> CachingTransport<T> {
    /// Wrap `inner`. A `ttl_seconds` of 0 disables caching.
    pub fn new(inner: T, ttl_seconds: u64, max_entries: u64) -> Self {
        let cache = (ttl_seconds > 0).then(|| {
            Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(Duration::from_secs(ttl_seconds))
                .build()
        });
        Self { inner, cache }
    }

    /// The wrapped transport.
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T: ProviderTransport> ProviderTransport for CachingTransport<T> {
    async fn send(&self, query: &ProviderQuery) -> Result<RawPayload, TransportError> {
        let Some(cache) = &self.cache else {
            return self.inner.send(query).await;
        };

        let key = CacheKey::new(self.inner.kind(), query);
        if let Some(mut payload) = cache.get(&key).await {
            tracing::trace!(provider = %self.inner.kind(), "provider cache hit");
            payload.cache = CacheStatus::Hit;
            return Ok(payload);
        }

        let mut payload = self.inner.send(query).await?;
        payload.cache = CacheStatus::Miss;
        cache.insert(key, payload.clone()).await;
        Ok(payload)
    }

    fn kind(&self) -> ProviderKind {
        self.inner.kind()
    }

    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Filters;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransport {
        calls: AtomicUsize,
    }

    impl ProviderTransport for CountingTransport {
        async fn send(&self, _query: &ProviderQuery) -> Result<RawPayload, TransportError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RawPayload::new(json!({"call": n})))
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::LocalIndex
        }

        fn endpoint(&self) -> &str {
            "mock://local"
        }
    }

    fn query(q: &str, tenant: &str) -> ProviderQuery {
        ProviderQuery {
            tenant: tenant.into(),
            query: q.into(),
            offset: 0,
            limit: 20,
            filters: Filters::default(),
            enable_highlighting: true,
            geoip_info: None,
        }
    }

    fn counting() -> CountingTransport {
        CountingTransport {
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn cache_key_deterministic_for_same_inputs() {
        let a = CacheKey::new(ProviderKind::WebApi, &query("rust", "nasa"));
        let b = CacheKey::new(ProviderKind::WebApi, &query("rust", "nasa"));
        assert_eq!(a, b);
    }

    #[test]
    fn cache_key_differs_by_provider_query_and_tenant() {
        let base = CacheKey::new(ProviderKind::WebApi, &query("rust", "nasa"));
        assert_ne!(base, CacheKey::new(ProviderKind::LocalIndex, &query("rust", "nasa")));
        assert_ne!(base, CacheKey::new(ProviderKind::WebApi, &query("python", "nasa")));
        assert_ne!(base, CacheKey::new(ProviderKind::WebApi, &query("rust", "usagov")));
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let transport = CachingTransport::new(counting(), 600, 10);
        let first = transport.send(&query("mars", "nasa")).await.expect("first");
        let second = transport.send(&query("mars", "nasa")).await.expect("second");
        assert_eq!(first.cache, CacheStatus::Miss);
        assert_eq!(second.cache, CacheStatus::Hit);
        assert_eq!(first.body, second.body);
        assert_eq!(transport.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disabled_cache_passes_through() {
        let transport = CachingTransport::new(counting(), 0, 10);
        let first = transport.send(&query("mars", "nasa")).await.expect("first");
        transport.send(&query("mars", "nasa")).await.expect("second");
        assert_eq!(first.cache, CacheStatus::NotApplicable);
        assert_eq!(transport.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn wrapper_keeps_kind_and_endpoint() {
        let transport = CachingTransport::new(counting(), 60, 10);
        assert_eq!(transport.kind(), ProviderKind::LocalIndex);
        assert_eq!(transport.endpoint(), "mock://local");
    }
}
