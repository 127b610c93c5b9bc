//! Local document index adapter.
//!
//! The local index always reports an exact total and returns documents in
//! its own rank order. A missing `results` array means no matches.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::TransportError;
use crate::provider::{ProviderQuery, ProviderResponse, RawPayload, RawResult, ResponseAdapter};
use crate::request::SortOrder;
use crate::types::{Diagnostics, ProviderKind, Total};

/// Adapter for the locally indexed document corpus.
pub struct LocalIndexAdapter;

#[derive(Debug, Deserialize)]
struct LocalIndexBody {
    #[serde(default)]
    metadata: Option<Metadata>,
    #[serde(default)]
    results: Option<Vec<Document>>,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    total: Option<u64>,
    suggestion: Option<Suggestion>,
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    text: Option<String>,
    highlighted: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    title: String,
    path: String,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    description: Option<String>,
    changed: Option<DateTime<Utc>>,
    created: Option<DateTime<Utc>>,
}

impl ResponseAdapter for LocalIndexAdapter {
    fn request_params(&self, query: &ProviderQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("query", query.query.clone()),
            ("offset", query.offset.to_string()),
            ("size", query.limit.to_string()),
            ("handle", query.tenant.clone()),
        ];
        if query.filters.sort_by == SortOrder::Date {
            params.push(("sort_by_date", "1".to_owned()));
        }
        if let Some(since) = query.filters.since_date {
            params.push(("min_timestamp", format!("{since}T00:00:00Z")));
        }
        if let Some(until) = query.filters.until_date {
            params.push(("max_timestamp", format!("{until}T23:59:59Z")));
        }
        if let Some(file_type) = query.filters.file_type {
            params.push(("filetype", file_type.extension().to_owned()));
        }
        if let Some(dc) = query.filters.document_collection_id {
            params.push(("document_collection", dc.to_string()));
        }
        params
    }

    fn adapt(
        &self,
        query: &ProviderQuery,
        payload: &RawPayload,
    ) -> Result<ProviderResponse, TransportError> {
        if !payload.body.is_object() {
            return Err(TransportError::Malformed(
                "local index payload is not an object".into(),
            ));
        }
        let body: LocalIndexBody = serde_json::from_value(payload.body.clone())
            .map_err(|e| TransportError::Malformed(format!("local index payload: {e}")))?;

        let results: Vec<RawResult> = body
            .results
            .unwrap_or_default()
            .into_iter()
            .map(|doc| RawResult {
                title: doc.title,
                url: doc.path,
                description: doc.snippet.or(doc.description).unwrap_or_default(),
                published_at: doc.changed.or(doc.created),
                provider: ProviderKind::LocalIndex,
            })
            .collect();

        let (total, suggestion) = match body.metadata {
            Some(meta) => (
                meta.total,
                meta.suggestion.and_then(|s| s.highlighted.or(s.text)),
            ),
            None => (None, None),
        };
        let total = total.unwrap_or(query.offset + results.len() as u64);

        tracing::trace!(count = results.len(), total, "local index results parsed");

        Ok(ProviderResponse {
            provider: ProviderKind::LocalIndex,
            total: Total::Exact(total),
            offset: query.offset,
            spelling_suggestion: suggestion,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Filters;
    use serde_json::json;

    fn query(offset: u64) -> ProviderQuery {
        ProviderQuery {
            tenant: "nonsense".into(),
            query: "no_results".into(),
            offset,
            limit: 20,
            filters: Filters::default(),
            enable_highlighting: false,
            geoip_info: None,
        }
    }

    #[test]
    fn parses_documents_and_exact_total() {
        let payload = RawPayload::new(json!({
            "metadata": {"total": 25, "offset": 0, "suggestion": null},
            "results": [
                {"title": "Indexed Result 1", "path": "http://nonsense.com/1.html",
                 "description": "This is an indexed result.", "changed": "2024-05-01T00:00:00Z"},
                {"title": "Indexed Result 2", "path": "http://nonsense.com/2.html",
                 "snippet": "This is an \u{e000}indexed\u{e001} result."}
            ]
        }));
        let response = LocalIndexAdapter.adapt(&query(0), &payload).expect("adapt");
        assert_eq!(response.total, Total::Exact(25));
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].description, "This is an indexed result.");
        assert!(response.results[0].published_at.is_some());
        assert!(response.results[1].description.contains('\u{e000}'));
        assert!(response.spelling_suggestion.is_none());
    }

    #[test]
    fn null_results_mean_zero() {
        let payload = RawPayload::new(json!({"metadata": {"total": 0}, "results": null}));
        let response = LocalIndexAdapter.adapt(&query(0), &payload).expect("adapt");
        assert!(response.results.is_empty());
        assert_eq!(response.total, Total::Exact(0));
    }

    #[test]
    fn missing_total_is_inferred_from_page() {
        let payload = RawPayload::new(json!({
            "results": [{"title": "t", "path": "http://a.gov/x"}]
        }));
        let response = LocalIndexAdapter.adapt(&query(40), &payload).expect("adapt");
        assert_eq!(response.total, Total::Exact(41));
    }

    #[test]
    fn suggestion_prefers_highlighted_text() {
        let payload = RawPayload::new(json!({
            "metadata": {"total": 0, "suggestion": {"text": "mars", "highlighted": "\u{e000}mars\u{e001}"}},
            "results": []
        }));
        let response = LocalIndexAdapter.adapt(&query(0), &payload).expect("adapt");
        assert_eq!(response.spelling_suggestion.as_deref(), Some("\u{e000}mars\u{e001}"));
    }

    #[test]
    fn non_object_payload_is_malformed() {
        let payload = RawPayload::new(json!([1, 2, 3]));
        assert!(matches!(
            LocalIndexAdapter.adapt(&query(0), &payload),
            Err(TransportError::Malformed(_))
        ));
    }

    #[test]
    fn request_params_carry_filters() {
        let mut q = query(14);
        q.filters.sort_by = SortOrder::Date;
        q.filters.document_collection_id = Some(7);
        let params = LocalIndexAdapter.request_params(&q);
        assert!(params.contains(&("offset", "14".to_owned())));
        assert!(params.contains(&("size", "20".to_owned())));
        assert!(params.contains(&("sort_by_date", "1".to_owned())));
        assert!(params.contains(&("document_collection", "7".to_owned())));
        assert!(params.contains(&("handle", "nonsense".to_owned())));
    }
}
