//! Provider seams: the transport trait, provider queries, raw payloads and
//! the shared adapter interface that turns payloads into a
//! [`ProviderResponse`].
//!
//! Transports move bytes; adapters understand provider-specific payload
//! shapes. Both are selected by [`ProviderKind`], so the rest of the pipeline
//! never branches on payload shape.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::TransportError;
use crate::providers::{local_index, web_api};
use crate::request::Filters;
use crate::types::{CacheStatus, Diagnostics, ProviderKind, Total};

/// A structured query for one provider call.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderQuery {
    pub tenant: String,
    pub query: String,
    /// 0-based offset into the provider's own ranking.
    pub offset: u64,
    /// Number of records requested.
    pub limit: u32,
    pub filters: Filters,
    pub enable_highlighting: bool,
    pub geoip_info: Option<Value>,
}

/// A raw provider payload as returned by a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPayload {
    /// Provider-specific JSON body.
    pub body: Value,
    /// Opaque tracking token supplied out of band (e.g. a response header).
    pub tracking: Option<String>,
    /// Whether this payload came from a cache.
    pub cache: CacheStatus,
}

impl RawPayload {
    /// A fresh, uncached payload.
    pub fn new(body: Value) -> Self {
        Self {
            body,
            tracking: None,
            cache: CacheStatus::NotApplicable,
        }
    }
}

/// One provider result record before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResult {
    /// Title, possibly containing highlight sentinels.
    pub title: String,
    pub url: String,
    /// Snippet or description, possibly containing highlight sentinels.
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    pub provider: ProviderKind,
}

/// A provider's answer to one [`ProviderQuery`], in provider rank order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderResponse {
    pub provider: ProviderKind,
    pub results: Vec<RawResult>,
    pub total: Total,
    /// Offset the results start at in the provider's ranking.
    pub offset: u64,
    /// Raw spelling-suggestion text, if the provider offered one.
    pub spelling_suggestion: Option<String>,
    pub diagnostics: Diagnostics,
}

/// A pluggable provider backend.
///
/// Implementors send a [`ProviderQuery`] to one backend and return its raw
/// payload. Failures must be categorized so the executor can tell
/// transient failures from fatal ones.
///
/// All implementations must be `Send + Sync` for concurrent provider calls.
pub trait ProviderTransport: Send + Sync {
    /// Send one attempt of `query` to the provider.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Timeout`] or [`TransportError::Connection`]
    /// for network failures that may be retried, and any other variant for
    /// failures that must not be.
    fn send(
        &self,
        query: &ProviderQuery,
    ) -> impl std::future::Future<Output = Result<RawPayload, TransportError>> + Send;

    /// Which provider this transport talks to.
    fn kind(&self) -> ProviderKind;

    /// The resolved endpoint, for logs.
    fn endpoint(&self) -> &str;
}

/// Turns one provider's payload shape into a [`ProviderResponse`].
pub trait ResponseAdapter {
    /// Provider-specific request parameters for `query`.
    fn request_params(&self, query: &ProviderQuery) -> Vec<(&'static str, String)>;

    /// Parse a payload received for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Malformed`] when the payload does not have
    /// the provider's shape.
    fn adapt(
        &self,
        query: &ProviderQuery,
        payload: &RawPayload,
    ) -> Result<ProviderResponse, TransportError>;
}

impl ResponseAdapter for ProviderKind {
    fn request_params(&self, query: &ProviderQuery) -> Vec<(&'static str, String)> {
        match self {
            Self::WebApi => web_api::WebApiAdapter.request_params(query),
            Self::LocalIndex => local_index::LocalIndexAdapter.request_params(query),
        }
    }

    fn adapt(
        &self,
        query: &ProviderQuery,
        payload: &RawPayload,
    ) -> Result<ProviderResponse, TransportError> {
        match self {
            Self::WebApi => web_api::WebApiAdapter.adapt(query, payload),
            Self::LocalIndex => local_index::LocalIndexAdapter.adapt(query, payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct MockTransport {
        kind: ProviderKind,
        body: Option<Value>,
    }

    impl ProviderTransport for MockTransport {
        async fn send(&self, _query: &ProviderQuery) -> Result<RawPayload, TransportError> {
            match &self.body {
                Some(body) => Ok(RawPayload::new(body.clone())),
                None => Err(TransportError::Connection("mock connection refused".into())),
            }
        }

        fn kind(&self) -> ProviderKind {
            self.kind
        }

        fn endpoint(&self) -> &str {
            "mock://provider"
        }
    }

    fn query() -> ProviderQuery {
        ProviderQuery {
            tenant: "nasa".into(),
            query: "mars".into(),
            offset: 0,
            limit: 20,
            filters: Filters::default(),
            enable_highlighting: true,
            geoip_info: None,
        }
    }

    #[test]
    fn mock_transport_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MockTransport>();
    }

    #[tokio::test]
    async fn transport_payload_flows_through_kind_adapter() {
        let transport = MockTransport {
            kind: ProviderKind::LocalIndex,
            body: Some(json!({
                "metadata": {"total": 1},
                "results": [{"title": "Mars", "path": "https://nasa.gov/mars", "snippet": "Red"}]
            })),
        };
        let payload = transport.send(&query()).await.expect("payload");
        let response = transport.kind().adapt(&query(), &payload).expect("adapt");
        assert_eq!(response.provider, ProviderKind::LocalIndex);
        assert_eq!(response.total, Total::Exact(1));
        assert_eq!(response.results[0].url, "https://nasa.gov/mars");
    }

    #[tokio::test]
    async fn transport_errors_are_categorized() {
        let transport = MockTransport {
            kind: ProviderKind::WebApi,
            body: None,
        };
        let err = transport.send(&query()).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn raw_payload_defaults_to_uncached() {
        let payload = RawPayload::new(json!({}));
        assert_eq!(payload.cache, CacheStatus::NotApplicable);
        assert!(payload.tracking.is_none());
    }
}
