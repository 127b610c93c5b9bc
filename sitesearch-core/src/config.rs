//! Engine and tenant configuration with sensible defaults.
//!
//! [`EngineConfig`] controls request limits, retry behaviour and
//! per-provider settings. [`TenantConfig`] is the read-only, per-tenant
//! snapshot a [`crate::lookup::TenantConfigProvider`] hands out.

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::types::ProviderKind;

/// Behaviour settings for one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Timeout for a single attempt in milliseconds.
    pub attempt_timeout_ms: u64,
    /// Deepest local offset the provider will serve. `None` means no limit.
    pub max_offset: Option<u64>,
    /// Whether the provider's reported totals are exact. When false, totals
    /// are reported as unbounded and backfill is skipped.
    pub exact_totals: bool,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            attempt_timeout_ms: 4_000,
            max_offset: None,
            exact_totals: true,
        }
    }
}

/// Engine-wide configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Page size used when the request gives none or an out-of-range one.
    pub default_per_page: u32,
    /// Largest page size a request may ask for, unless the tenant lowers it.
    pub max_per_page: u32,
    /// Longest accepted query, in characters.
    pub max_query_length: usize,
    /// Attempts per provider call, including the first.
    pub max_attempts: u32,
    /// Descriptions longer than this many visible characters are truncated.
    pub description_max_chars: usize,
    /// How long provider payloads are cached, in seconds. 0 disables caching.
    pub cache_ttl_seconds: u64,
    /// Maximum number of cached payloads per provider.
    pub cache_max_entries: u64,
    /// Deadline for a whole request in milliseconds, if any.
    pub request_deadline_ms: Option<u64>,
    /// Queries that are rejected as if they were empty (case-insensitive).
    pub blocked_queries: Vec<String>,
    pub web_api: ProviderSettings,
    pub local_index: ProviderSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_per_page: 20,
            max_per_page: 50,
            max_query_length: 1_000,
            max_attempts: 2,
            description_max_chars: 255,
            cache_ttl_seconds: 0,
            cache_max_entries: 1_000,
            request_deadline_ms: None,
            blocked_queries: Vec::new(),
            web_api: ProviderSettings {
                attempt_timeout_ms: 4_000,
                max_offset: Some(1_000),
                exact_totals: true,
            },
            local_index: ProviderSettings {
                attempt_timeout_ms: 3_000,
                max_offset: None,
                exact_totals: true,
            },
        }
    }
}

impl EngineConfig {
    /// Settings for the given provider.
    pub fn provider(&self, kind: ProviderKind) -> &ProviderSettings {
        match kind {
            ProviderKind::WebApi => &self.web_api,
            ProviderKind::LocalIndex => &self.local_index,
        }
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `default_per_page` and `max_per_page` must be greater than 0
    /// - `default_per_page` must be <= `max_per_page`
    /// - `max_query_length` and `max_attempts` must be greater than 0
    /// - every provider's `attempt_timeout_ms` must be greater than 0
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.default_per_page == 0 || self.max_per_page == 0 {
            return Err(SearchError::Config(
                "per_page limits must be greater than 0".into(),
            ));
        }
        if self.default_per_page > self.max_per_page {
            return Err(SearchError::Config(
                "default_per_page must be <= max_per_page".into(),
            ));
        }
        if self.max_query_length == 0 {
            return Err(SearchError::Config(
                "max_query_length must be greater than 0".into(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(SearchError::Config(
                "max_attempts must be greater than 0".into(),
            ));
        }
        for kind in ProviderKind::all() {
            if self.provider(*kind).attempt_timeout_ms == 0 {
                return Err(SearchError::Config(format!(
                    "{kind} attempt_timeout_ms must be greater than 0"
                )));
            }
        }
        Ok(())
    }
}

/// Which providers serve a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderSelection {
    /// Web API only.
    #[default]
    WebApi,
    /// Local index only.
    LocalIndex,
    /// Web API first, backfilled from the local index.
    Blended,
}

impl ProviderSelection {
    /// The primary provider and optional backfill provider.
    pub fn providers(&self) -> (ProviderKind, Option<ProviderKind>) {
        match self {
            Self::WebApi => (ProviderKind::WebApi, None),
            Self::LocalIndex => (ProviderKind::LocalIndex, None),
            Self::Blended => (ProviderKind::WebApi, Some(ProviderKind::LocalIndex)),
        }
    }
}

/// Per-tenant feature switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub spelling_suggestions: bool,
    pub news_enrichment: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            spelling_suggestions: true,
            news_enrichment: true,
        }
    }
}

/// A tenant's search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantConfig {
    pub handle: String,
    /// Inactive tenants are refused before any provider is called.
    pub active: bool,
    pub providers: ProviderSelection,
    /// URLs that must never appear in results.
    pub excluded_urls: Vec<String>,
    /// Lower per-page ceiling for this tenant.
    pub per_page_max: Option<u32>,
    pub features: FeatureFlags,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            handle: String::new(),
            active: true,
            providers: ProviderSelection::default(),
            excluded_urls: Vec::new(),
            per_page_max: None,
            features: FeatureFlags::default(),
        }
    }
}

impl TenantConfig {
    /// A default, active tenant with the given handle and provider selection.
    pub fn new(handle: impl Into<String>, providers: ProviderSelection) -> Self {
        Self {
            handle: handle.into(),
            providers,
            ..Default::default()
        }
    }

    /// The effective per-page ceiling under `engine`.
    pub fn max_per_page(&self, engine: &EngineConfig) -> u32 {
        self.per_page_max
            .map_or(engine.max_per_page, |max| max.min(engine.max_per_page))
    }

    /// Validates this tenant.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.handle.trim().is_empty() {
            return Err(SearchError::Config("tenant handle must not be empty".into()));
        }
        if self.per_page_max == Some(0) {
            return Err(SearchError::Config(format!(
                "tenant {} per_page_max must be greater than 0",
                self.handle
            )));
        }
        Ok(())
    }
}
