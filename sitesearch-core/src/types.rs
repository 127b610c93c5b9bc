//! Core types shared across the search pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// The closed set of backend providers a tenant can be served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Commercial web-search API.
    WebApi,
    /// Locally indexed document corpus.
    LocalIndex,
}

impl ProviderKind {
    /// Returns the stable identifier of this provider.
    pub fn name(&self) -> &'static str {
        match self {
            Self::WebApi => "web_api",
            Self::LocalIndex => "local_index",
        }
    }

    /// Returns the module tag reported when this provider contributes results.
    pub fn module_tag(&self) -> &'static str {
        match self {
            Self::WebApi => "BWEB",
            Self::LocalIndex => "AIDOC",
        }
    }

    /// Returns all provider variants.
    pub fn all() -> &'static [ProviderKind] {
        &[Self::WebApi, Self::LocalIndex]
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A result count that may be unknown.
///
/// Serializes as a number, or as the string `"unbounded"` when the provider
/// cannot report an exact count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Total {
    /// An exact count.
    Exact(u64),
    /// The provider cannot report an exact count.
    Unbounded,
}

impl Total {
    /// The exact count, if known.
    pub fn exact(&self) -> Option<u64> {
        match self {
            Self::Exact(n) => Some(*n),
            Self::Unbounded => None,
        }
    }

    /// Reduce an exact count by `n`, saturating at zero.
    pub fn saturating_sub(self, n: u64) -> Self {
        match self {
            Self::Exact(total) => Self::Exact(total.saturating_sub(n)),
            Self::Unbounded => Self::Unbounded,
        }
    }
}

impl Serialize for Total {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Exact(n) => serializer.serialize_u64(*n),
            Self::Unbounded => serializer.serialize_str("unbounded"),
        }
    }
}

impl<'de> Deserialize<'de> for Total {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Count(u64),
            Word(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Count(n) => Ok(Self::Exact(n)),
            Repr::Word(w) if w == "unbounded" => Ok(Self::Unbounded),
            Repr::Word(w) => Err(serde::de::Error::custom(format!(
                "expected a count or \"unbounded\", got {w:?}"
            ))),
        }
    }
}

/// Whether a provider payload was served from cache.
///
/// Serializes as `true` / `false`, or `"none"` when caching does not apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheStatus {
    /// Served from cache.
    Hit,
    /// Fetched from the provider and cacheable.
    Miss,
    /// The transport does not cache.
    #[default]
    NotApplicable,
}

impl CacheStatus {
    /// Combine the cache status of several provider calls.
    ///
    /// Any miss makes the whole response a miss; all-hit is a hit; calls
    /// without caching do not affect the outcome.
    pub fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Miss, _) | (_, Self::Miss) => Self::Miss,
            (Self::Hit, _) | (_, Self::Hit) => Self::Hit,
            _ => Self::NotApplicable,
        }
    }
}

impl Serialize for CacheStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Hit => serializer.serialize_bool(true),
            Self::Miss => serializer.serialize_bool(false),
            Self::NotApplicable => serializer.serialize_str("none"),
        }
    }
}

impl<'de> Deserialize<'de> for CacheStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Flag(bool),
            Word(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Flag(true) => Ok(Self::Hit),
            Repr::Flag(false) => Ok(Self::Miss),
            Repr::Word(w) if w == "none" => Ok(Self::NotApplicable),
            Repr::Word(w) => Err(serde::de::Error::custom(format!(
                "expected a boolean or \"none\", got {w:?}"
            ))),
        }
    }
}

/// Recognized document file types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    Doc,
    Pdf,
    Ppt,
    Ps,
    Rtf,
    Swf,
    Txt,
    Xls,
    Docx,
    Pptx,
    Xlsx,
}

impl FileType {
    /// Map a lower-case extension through the allow-list.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let file_type = match ext {
            "doc" => Self::Doc,
            "pdf" => Self::Pdf,
            "ppt" => Self::Ppt,
            "ps" => Self::Ps,
            "rtf" => Self::Rtf,
            "swf" => Self::Swf,
            "txt" => Self::Txt,
            "xls" => Self::Xls,
            "docx" => Self::Docx,
            "pptx" => Self::Pptx,
            "xlsx" => Self::Xlsx,
            _ => return None,
        };
        Some(file_type)
    }

    /// The lower-case extension, as providers expect it in filters.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Doc => "doc",
            Self::Pdf => "pdf",
            Self::Ppt => "ppt",
            Self::Ps => "ps",
            Self::Rtf => "rtf",
            Self::Swf => "swf",
            Self::Txt => "txt",
            Self::Xls => "xls",
            Self::Docx => "docx",
            Self::Pptx => "pptx",
            Self::Xlsx => "xlsx",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_ascii_uppercase())
    }
}

/// The normalized, provider-agnostic result record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalResult {
    /// Title, highlight-processed or plain.
    pub title: String,
    /// Result URL.
    pub url: String,
    /// Snippet or description, highlight-processed or plain.
    pub description: String,
    /// Recognized file type of the URL, if any.
    #[serde(rename = "fileType", skip_serializing_if = "Option::is_none", default)]
    pub file_type: Option<FileType>,
    /// Publication time, when known.
    #[serde(rename = "publishedAt", skip_serializing_if = "Option::is_none", default)]
    pub published_at: Option<DateTime<Utc>>,
    /// Which provider produced this result.
    pub provider: ProviderKind,
}

/// A news item available for enriching results with the same URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Canonical link of the item; matched exactly against result URLs.
    pub link: String,
    pub title: String,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Execution diagnostics for one provider call, or merged across calls.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub result_count: usize,
    pub from_cache: CacheStatus,
    pub retry_count: u32,
    pub elapsed_time_ms: u64,
    /// Opaque provider-supplied tracking token.
    pub tracking_information: Option<String>,
}

impl Diagnostics {
    /// Merge diagnostics from concurrent calls: counts and retries are
    /// summed, elapsed time is the maximum, the first tracking token wins.
    pub fn merge(&self, other: &Diagnostics) -> Diagnostics {
        Diagnostics {
            result_count: self.result_count + other.result_count,
            from_cache: self.from_cache.merge(other.from_cache),
            retry_count: self.retry_count + other.retry_count,
            elapsed_time_ms: self.elapsed_time_ms.max(other.elapsed_time_ms),
            tracking_information: self
                .tracking_information
                .clone()
                .or_else(|| other.tracking_information.clone()),
        }
    }
}

/// A cleaned spelling correction for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellingSuggestion {
    /// The query as the user typed it.
    pub original: String,
    /// The corrected query, plain text.
    pub suggested: String,
    /// The corrected query prepared for display (emphasis markup applied).
    pub display: String,
}

/// The final response for a search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<CanonicalResult>,
    pub total: Total,
    pub startrecord: Option<u64>,
    pub endrecord: Option<u64>,
    #[serde(rename = "totalPages")]
    pub total_pages: Option<u64>,
    pub page: u32,
    pub per_page: u32,
    #[serde(rename = "spellingSuggestion", skip_serializing_if = "Option::is_none", default)]
    pub spelling_suggestion: Option<SpellingSuggestion>,
    /// Module tags of the providers that contributed results.
    pub modules: Vec<String>,
    /// Diagnostics merged across every provider call.
    pub diagnostics: Diagnostics,
    /// Diagnostics of each provider call, by provider.
    pub provider_diagnostics: BTreeMap<ProviderKind, Diagnostics>,
    /// User-facing message when the request could not be served.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

impl SearchResponse {
    /// A zero-result response carrying a user-facing message.
    pub fn rejected(page: u32, per_page: u32, message: &str) -> Self {
        Self {
            results: Vec::new(),
            total: Total::Exact(0),
            startrecord: None,
            endrecord: None,
            total_pages: Some(0),
            page,
            per_page,
            spelling_suggestion: None,
            modules: Vec::new(),
            diagnostics: Diagnostics::default(),
            provider_diagnostics: BTreeMap::new(),
            error: Some(message.to_owned()),
        }
    }
}
