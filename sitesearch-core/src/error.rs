//! Error types for the sitesearch-core crate.
//!
//! All errors use stable string messages suitable for logs and programmatic
//! handling. Surfaced provider errors carry provider identity, query text and
//! elapsed time; [`SearchError::public_message`] gives the text an end user
//! may see.

use crate::types::ProviderKind;

/// A categorized failure reported by a provider transport.
///
/// Only [`TransportError::Timeout`] and [`TransportError::Connection`] are
/// transient and eligible for retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The provider did not answer within the attempt timeout.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The connection was refused, reset, or could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The provider answered with a non-success status.
    #[error("unexpected status {code}: {message}")]
    Status {
        /// HTTP (or HTTP-like) status code.
        code: u16,
        /// Status reason or response excerpt.
        message: String,
    },

    /// The provider answered but the payload could not be understood.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Whether this failure class may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connection(_))
    }
}

/// Why a provider call ultimately failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderFailure {
    /// A timeout or connection failure that persisted through every attempt.
    #[error("transient failure after {attempts} attempt(s): {error}")]
    Transient {
        /// Attempts made before giving up.
        attempts: u32,
        /// The last transport error.
        error: TransportError,
    },

    /// A non-network failure (bad payload, authentication, unexpected status).
    #[error("fatal failure: {0}")]
    Fatal(TransportError),
}

/// Errors that can occur while answering a search request.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// A provider call failed and was not recoverable.
    #[error("{provider} query {query:?} failed after {elapsed_ms}ms: {source}")]
    Provider {
        /// Which provider failed.
        provider: ProviderKind,
        /// The query text sent to the provider.
        query: String,
        /// Elapsed time of the final attempt in milliseconds.
        elapsed_ms: u64,
        /// The categorized cause.
        #[source]
        source: ProviderFailure,
    },

    /// No tenant is configured under the requested handle.
    #[error("unknown tenant: {0}")]
    UnknownTenant(String),

    /// The tenant exists but search has been switched off for it.
    #[error("tenant {0} is inactive")]
    TenantInactive(String),

    /// Invalid engine or tenant configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The caller-supplied request deadline elapsed before a full response
    /// could be produced.
    #[error("search deadline of {0}ms exceeded")]
    DeadlineExceeded(u64),

    /// The caller cancelled the request.
    #[error("search cancelled")]
    Cancelled,
}

impl SearchError {
    /// Wrap a terminal transport error for `provider`.
    pub(crate) fn provider(
        provider: ProviderKind,
        query: &str,
        elapsed_ms: u64,
        attempts: u32,
        error: TransportError,
    ) -> Self {
        let source = if error.is_transient() {
            ProviderFailure::Transient { attempts, error }
        } else {
            ProviderFailure::Fatal(error)
        };
        Self::Provider {
            provider,
            query: query.to_owned(),
            elapsed_ms,
            source,
        }
    }

    /// Generic, non-leaking message for end users.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::TenantInactive(_) => "This search site has been turned off.",
            Self::UnknownTenant(_) => "This search site could not be found.",
            _ => "Search is temporarily unavailable. Please try again later.",
        }
    }
}

/// Convenience type alias for sitesearch-core results.
pub type Result<T> = std::result::Result<T, SearchError>;
