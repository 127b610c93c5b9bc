//! # sitesearch-core
//!
//! Query orchestration and result blending for multi-tenant hosted search.
//!
//! A tenant's query is answered from a primary provider (a commercial web
//! API or a local document index) and, when the primary provider runs out,
//! backfilled from the local index so that consecutive pages neither skip
//! nor repeat results.
//!
//! ## Design
//!
//! - Provider calls retry once, immediately, on timeouts and connection failures
//! - Primary and backfill queries run concurrently and are joined before blending
//! - Per-provider adapters map payloads to one canonical result shape
//! - Optional in-memory payload cache with configurable TTL
//! - Request deadlines and cancellation drop in-flight calls; callers get a
//!   full response or an error, never a partial page
//!
//! ## Security
//!
//! - Query text is logged only at debug/trace level
//! - [`SearchError::public_message`] gives end users a generic message
//! - Highlighted output is HTML-escaped

pub mod blend;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod http;
pub mod lookup;
pub mod normalize;
pub mod observability;
pub mod provider;
pub mod providers;
pub mod request;
pub mod spelling;
pub mod types;

pub use cache::CachingTransport;
pub use config::{EngineConfig, FeatureFlags, ProviderSelection, ProviderSettings, TenantConfig};
pub use coordinator::SearchCoordinator;
pub use error::{ProviderFailure, Result, SearchError, TransportError};
pub use http::{HttpProviderConfig, HttpTransport};
pub use lookup::{LayeredNewsLookup, NewsIndexLookup, StaticTenants, TenantConfigProvider};
pub use observability::{ChannelSink, DiagnosticsSink, NoopSink, SearchEvent, SearchOutcome, TracingSink};
pub use provider::{ProviderQuery, ProviderTransport, RawPayload};
pub use request::SearchParams;
pub use types::{
    CacheStatus, CanonicalResult, Diagnostics, FileType, NewsItem, ProviderKind, SearchResponse,
    SpellingSuggestion, Total,
};
