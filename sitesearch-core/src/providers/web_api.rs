//! Commercial web-search API adapter.
//!
//! The API takes `q`/`count`/`offset` style parameters, marks matched terms
//! with private-use sentinels when text decorations are requested, and can
//! only estimate its total.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::TransportError;
use crate::provider::{ProviderQuery, ProviderResponse, RawPayload, RawResult, ResponseAdapter};
use crate::request::FilterLevel;
use crate::types::{Diagnostics, ProviderKind, Total};

/// Adapter for the commercial web API.
pub struct WebApiAdapter;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebApiBody {
    #[serde(rename = "_type")]
    body_type: Option<String>,
    query_context: Option<QueryContext>,
    web_pages: Option<WebPages>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryContext {
    altered_query: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebPages {
    total_estimated_matches: Option<u64>,
    #[serde(default)]
    value: Vec<WebPage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebPage {
    name: String,
    url: String,
    #[serde(default)]
    snippet: String,
    date_published: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<String>,
    message: Option<String>,
}

impl ResponseAdapter for WebApiAdapter {
    fn request_params(&self, query: &ProviderQuery) -> Vec<(&'static str, String)> {
        let q = match query.filters.file_type {
            Some(file_type) => format!("{} filetype:{}", query.query, file_type.extension()),
            None => query.query.clone(),
        };
        let safe_search = match query.filters.filter_level {
            FilterLevel::Off => "Off",
            FilterLevel::Moderate => "Moderate",
            FilterLevel::Strict => "Strict",
        };

        let mut params = vec![
            ("q", q),
            ("count", query.limit.to_string()),
            ("offset", query.offset.to_string()),
            ("safeSearch", safe_search.to_owned()),
            ("textDecorations", query.enable_highlighting.to_string()),
            ("textFormat", "Raw".to_owned()),
        ];

        if let Some(since) = query.filters.since_date {
            let until = query
                .filters
                .until_date
                .unwrap_or_else(|| Utc::now().date_naive());
            params.push(("freshness", format!("{since}..{until}")));
        }

        if let Some(country) = query
            .geoip_info
            .as_ref()
            .and_then(|geo| geo.get("country_code"))
            .and_then(|cc| cc.as_str())
        {
            params.push(("cc", country.to_owned()));
        }

        params
    }

    fn adapt(
        &self,
        query: &ProviderQuery,
        payload: &RawPayload,
    ) -> Result<ProviderResponse, TransportError> {
        let body: WebApiBody = serde_json::from_value(payload.body.clone())
            .map_err(|e| TransportError::Malformed(format!("web API payload: {e}")))?;

        if body.body_type.as_deref() == Some("ErrorResponse") || !body.errors.is_empty() {
            let detail = body
                .errors
                .iter()
                .map(|e| {
                    format!(
                        "{}: {}",
                        e.code.as_deref().unwrap_or("Unknown"),
                        e.message.as_deref().unwrap_or("")
                    )
                })
                .collect::<Vec<_>>()
                .join("; ");
            return Err(TransportError::Other(format!("web API error response: {detail}")));
        }

        let (total, pages) = match body.web_pages {
            Some(pages) => (pages.total_estimated_matches, pages.value),
            None => (Some(0), Vec::new()),
        };

        let results: Vec<RawResult> = pages
            .into_iter()
            .map(|page| RawResult {
                title: page.name,
                url: page.url,
                description: page.snippet,
                published_at: page.date_published,
                provider: ProviderKind::WebApi,
            })
            .collect();

        tracing::trace!(count = results.len(), "web API results parsed");

        Ok(ProviderResponse {
            provider: ProviderKind::WebApi,
            total: total.map_or(Total::Unbounded, Total::Exact),
            offset: query.offset,
            spelling_suggestion: body.query_context.and_then(|ctx| ctx.altered_query),
            diagnostics: Diagnostics {
                result_count: results.len(),
                from_cache: payload.cache,
                tracking_information: payload.tracking.clone(),
                ..Default::default()
            },
            results,
        })
    }
}
