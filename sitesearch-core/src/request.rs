//! Incoming search parameters and their resolution into a [`SearchRequest`].
//!
//! Parameters arrive loosely typed (query strings, JSON bodies). Resolution
//! never fails: malformed values fall back to defaults, and query validity is
//! checked separately by [`validate_query`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::EngineConfig;
use crate::types::FileType;

/// Message returned for empty, blank, malformed or blocked queries.
pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a search term in the box above.";

/// Message returned for queries longer than the configured maximum.
pub const QUERY_TOO_LONG_MESSAGE: &str = "That is too long a word. Try using a shorter word.";

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Relevance,
    Date,
}

/// Safe-search filter level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterLevel {
    Off,
    #[default]
    Moderate,
    Strict,
}

impl FilterLevel {
    /// Parse the numeric `filter` parameter. Anything other than 0, 1 or 2
    /// resolves to [`FilterLevel::Moderate`].
    pub fn parse(raw: Option<&Value>) -> Self {
        let digits = match raw {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.trim().to_owned(),
            _ => return Self::default(),
        };
        match digits.as_str() {
            "0" => Self::Off,
            "1" => Self::Moderate,
            "2" => Self::Strict,
            _ => Self::default(),
        }
    }
}

/// Result filters forwarded to providers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Filters {
    pub since_date: Option<NaiveDate>,
    pub until_date: Option<NaiveDate>,
    pub sort_by: SortOrder,
    pub file_type: Option<FileType>,
    pub document_collection_id: Option<u64>,
    pub filter_level: FilterLevel,
}

/// Raw, loosely typed search parameters as received from a caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub tenant: String,
    pub query: Option<Value>,
    pub page: Option<Value>,
    pub per_page: Option<Value>,
    pub since_date: Option<String>,
    pub until_date: Option<String>,
    pub sort_by: Option<String>,
    pub file_type: Option<String>,
    /// Document collection id.
    pub dc: Option<Value>,
    /// Safe-search level, 0 to 2.
    pub filter: Option<Value>,
    pub enable_highlighting: Option<Value>,
    /// Opaque geolocation hint.
    pub geoip_info: Option<Value>,
}

impl SearchParams {
    /// Parameters for a plain text query on `tenant`.
    pub fn new(tenant: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            tenant: tenant.into(),
            query: Some(Value::String(query.into())),
            ..Default::default()
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(Value::from(page));
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(Value::from(per_page));
        self
    }

    pub fn with_highlighting(mut self, enabled: bool) -> Self {
        self.enable_highlighting = Some(Value::Bool(enabled));
        self
    }

    /// Resolve into a [`SearchRequest`], coercing out-of-range or malformed
    /// values to their defaults. `max_per_page` is the effective ceiling for
    /// the tenant.
    pub fn resolve(&self, engine: &EngineConfig, max_per_page: u32) -> SearchRequest {
        let default_per_page = engine.default_per_page.min(max_per_page);
        let per_page = positive_integer(self.per_page.as_ref())
            .filter(|n| *n <= max_per_page)
            .unwrap_or(default_per_page);

        SearchRequest {
            tenant: self.tenant.clone(),
            query: scalar_query(self.query.as_ref()),
            page: positive_integer(self.page.as_ref()).unwrap_or(1),
            per_page,
            filters: Filters {
                since_date: self.since_date.as_deref().and_then(parse_date),
                until_date: self.until_date.as_deref().and_then(parse_date),
                sort_by: match self.sort_by.as_deref().map(str::trim) {
                    Some("date") => SortOrder::Date,
                    _ => SortOrder::Relevance,
                },
                file_type: self
                    .file_type
                    .as_deref()
                    .and_then(|ext| FileType::from_extension(&ext.trim().to_ascii_lowercase())),
                document_collection_id: positive_integer(self.dc.as_ref()).map(u64::from),
                filter_level: FilterLevel::parse(self.filter.as_ref()),
            },
            enable_highlighting: highlighting_flag(self.enable_highlighting.as_ref()),
            geoip_info: self.geoip_info.clone(),
        }
    }
}

/// A resolved search request. Every field is within range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub tenant: String,
    /// Whitespace-squeezed query text; empty when the input was not a scalar.
    pub query: String,
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
    pub filters: Filters,
    pub enable_highlighting: bool,
    pub geoip_info: Option<Value>,
}

impl SearchRequest {
    /// First global ordinal of the requested window (1-based).
    pub fn start(&self) -> u64 {
        (u64::from(self.page) - 1) * u64::from(self.per_page) + 1
    }
}

/// Check a resolved query, returning the user-facing message when it must
/// not reach any provider.
pub fn validate_query(query: &str, engine: &EngineConfig) -> Result<(), &'static str> {
    if query.trim().is_empty() {
        return Err(EMPTY_QUERY_MESSAGE);
    }
    if query.chars().count() > engine.max_query_length {
        return Err(QUERY_TOO_LONG_MESSAGE);
    }
    if engine
        .blocked_queries
        .iter()
        .any(|blocked| blocked.trim().eq_ignore_ascii_case(query.trim()))
    {
        return Err(EMPTY_QUERY_MESSAGE);
    }
    Ok(())
}

fn scalar_query(raw: Option<&Value>) -> String {
    let text = match raw {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => return String::new(),
    };
    squish(&text)
}

fn positive_integer(raw: Option<&Value>) -> Option<u32> {
    let n = match raw? {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    u32::try_from(n).ok().filter(|n| *n >= 1)
}

fn highlighting_flag(raw: Option<&Value>) -> bool {
    match raw {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.trim().eq_ignore_ascii_case("false"),
        _ => true,
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .ok()
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub(crate) fn squish(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
