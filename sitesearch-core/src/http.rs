//! HTTP provider transport.
//!
//! [`HttpTransport`] sends a provider's request parameters as a GET query
//! string with a shared [`reqwest::Client`] and maps reqwest failures onto
//! the [`TransportError`] categories the executor retries on.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::TransportError;
use crate::provider::{ProviderQuery, ProviderTransport, RawPayload, ResponseAdapter};
use crate::types::ProviderKind;

const USER_AGENT: &str = concat!("sitesearch/", env!("CARGO_PKG_VERSION"));

/// Connection settings for one HTTP provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpProviderConfig {
    /// Full endpoint URL.
    pub endpoint: String,
    /// API key sent in `api_key_header`, if any.
    pub api_key: Option<String>,
    /// Header carrying the API key.
    pub api_key_header: Option<String>,
    /// Response header holding the provider's tracking token.
    pub tracking_header: Option<String>,
}

/// Build a [`reqwest::Client`] for provider calls.
///
/// The client has:
/// - Connect timeout bounded by the attempt timeout
/// - A fixed User-Agent identifying this crate
/// - Brotli and gzip decompression
///
/// Per-attempt timeouts are enforced by the executor, not the client.
///
/// # Errors
///
/// Returns [`TransportError::Other`] if the client cannot be constructed.
pub fn build_client(connect_timeout: Duration) -> Result<reqwest::Client, TransportError> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| TransportError::Other(format!("failed to build HTTP client: {e}")))
}

/// GET-based JSON transport for one provider.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    kind: ProviderKind,
    client: reqwest::Client,
    config: HttpProviderConfig,
}

impl HttpTransport {
    /// Create a transport for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Other`] if the endpoint is not a valid URL
    /// or the client cannot be built.
    pub fn new(
        kind: ProviderKind,
        config: HttpProviderConfig,
        connect_timeout: Duration,
    ) -> Result<Self, TransportError> {
        url::Url::parse(&config.endpoint).map_err(|e| {
            TransportError::Other(format!("invalid {kind} endpoint {:?}: {e}", config.endpoint))
        })?;
        Ok(Self {
            kind,
            client: build_client(connect_timeout)?,
            config,
        })
    }
}

impl ProviderTransport for HttpTransport {
    async fn send(&self, query: &ProviderQuery) -> Result<RawPayload, TransportError> {
        let params = self.kind.request_params(query);
        let mut request = self
            .client
            .get(&self.config.endpoint)
            .query(&params)
            .header("Accept", "application/json");
        if let (Some(header), Some(key)) = (&self.config.api_key_header, &self.config.api_key) {
            request = request.header(header.as_str(), key.as_str());
        }

        let response = request.send().await.map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unknown").to_owned();
            return Err(TransportError::Status {
                code: status.as_u16(),
                message: reason,
            });
        }

        let tracking = self
            .config
            .tracking_header
            .as_deref()
            .and_then(|name| response.headers().get(name))
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let body: serde_json::Value = response.json().await.map_err(|e| {
            if e.is_decode() {
                TransportError::Malformed(format!("{} returned invalid JSON: {e}", self.kind))
            } else {
                classify(e)
            }
        })?;

        tracing::trace!(provider = %self.kind, "provider payload received");

        Ok(RawPayload {
            body,
            tracking,
            cache: crate::types::CacheStatus::NotApplicable,
        })
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

fn classify(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportError::Connection(e.to_string())
    } else if e.is_request() || e.is_body() {
        // Resets mid-request surface as request/body errors.
        TransportError::Connection(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_client_succeeds() {
        assert!(build_client(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn invalid_endpoint_rejected() {
        let config = HttpProviderConfig {
            endpoint: "not a url".into(),
            ..Default::default()
        };
        let err = HttpTransport::new(ProviderKind::WebApi, config, Duration::from_secs(1))
            .unwrap_err();
        assert!(err.to_string().contains("invalid web_api endpoint"));
    }

    #[test]
    fn transport_reports_kind_and_endpoint() {
        let config = HttpProviderConfig {
            endpoint: "http://127.0.0.1:9200/api/v1/search".into(),
            ..Default::default()
        };
        let transport = HttpTransport::new(ProviderKind::LocalIndex, config, Duration::from_secs(1))
            .expect("transport");
        assert_eq!(transport.kind(), ProviderKind::LocalIndex);
        assert_eq!(transport.endpoint(), "http://127.0.0.1:9200/api/v1/search");
    }

    #[test]
    fn user_agent_names_crate() {
        assert!(USER_AGENT.starts_with("sitesearch/"));
    }
}
