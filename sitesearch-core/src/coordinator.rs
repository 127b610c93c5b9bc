//! Search coordination: one flow per request, from raw parameters to the
//! final [`SearchResponse`].
//!
//! # Pipeline
//!
//! 1. Validate the query (invalid queries never reach a tenant or provider)
//! 2. Look up the tenant snapshot; refuse unknown or inactive tenants
//! 3. Query the primary provider for the requested window, and, for blended
//!    tenants, the backfill provider's first page concurrently with
//!    [`futures::future::join`]. Excluded URLs are dropped before any
//!    position is counted, and totals are reduced accordingly
//! 4. Plan the window; fetch deeper backfill rows if the first page does
//!    not cover it
//! 5. Normalize, assemble, resolve spelling, merge diagnostics
//!
//! The whole flow runs under the optional request deadline and can be
//! cancelled; either way the caller gets a full response or an error.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::blend::{BlendedResultAssembler, SourceRows};
use crate::config::EngineConfig;
use crate::error::{Result, SearchError};
use crate::executor::QueryExecutor;
use crate::lookup::{NewsIndexLookup, TenantConfigProvider};
use crate::normalize::{ExclusionSet, NormalizeOptions, ResultNormalizer};
use crate::observability::{DiagnosticsSink, SearchEvent, SearchOutcome, TracingSink};
use crate::provider::{ProviderQuery, ProviderResponse, ProviderTransport};
use crate::request::{SearchParams, SearchRequest, validate_query};
use crate::spelling;
use crate::types::{Diagnostics, ProviderKind, SearchResponse, Total};

/// Answers search requests for every tenant.
///
/// `W` talks to the web API and `L` to the local index. Both are shared,
/// read-only, across concurrent requests.
pub struct SearchCoordinator<W, L> {
    config: EngineConfig,
    tenants: Arc<dyn TenantConfigProvider>,
    web: W,
    local: L,
    news: Option<Arc<dyn NewsIndexLookup>>,
    sink: Arc<dyn DiagnosticsSink>,
}

impl<W: ProviderTransport, L: ProviderTransport> SearchCoordinator<W, L> {
    /// Create a coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` is invalid.
    pub fn new(
        config: EngineConfig,
        tenants: Arc<dyn TenantConfigProvider>,
        web: W,
        local: L,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            tenants,
            web,
            local,
            news: None,
            sink: Arc::new(TracingSink),
        })
    }

    /// Enrich results from a news index.
    pub fn with_news(mut self, news: Arc<dyn NewsIndexLookup>) -> Self {
        self.news = Some(news);
        self
    }

    /// Report search events to `sink` instead of the tracing log.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Answer one search request.
    ///
    /// Validation failures are not errors: they produce a zero-result
    /// response whose `error` carries the user-facing message.
    ///
    /// # Errors
    ///
    /// - [`SearchError::UnknownTenant`] / [`SearchError::TenantInactive`]
    /// - [`SearchError::Provider`] when the primary provider fails
    /// - [`SearchError::DeadlineExceeded`] when the configured request
    ///   deadline elapses first
    pub async fn search(&self, params: &SearchParams) -> Result<SearchResponse> {
        self.search_with_cancel(params, &CancellationToken::new()).await
    }

    /// Like [`search`](Self::search), but abandons the request as soon as
    /// `cancel` fires. In-flight provider calls are dropped and nothing
    /// computed so far is returned.
    ///
    /// # Errors
    ///
    /// As [`search`](Self::search), plus [`SearchError::Cancelled`].
    pub async fn search_with_cancel(
        &self,
        params: &SearchParams,
        cancel: &CancellationToken,
    ) -> Result<SearchResponse> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "search",
            %request_id,
            tenant = %params.tenant,
            page = tracing::field::Empty,
        );

        let work = async {
            let run = self.run(request_id, params);
            match self.config.request_deadline_ms {
                Some(ms) => tokio::time::timeout(Duration::from_millis(ms), run)
                    .await
                    .unwrap_or_else(|_| Err(SearchError::DeadlineExceeded(ms))),
                None => run.await,
            }
        };

        let result = async {
            tokio::select! {
                biased;
                () = cancel.cancelled() => Err(SearchError::Cancelled),
                result = work => result,
            }
        }
        .instrument(span.clone())
        .await;

        if let Err(err) = &result {
            let _entered = span.enter();
            tracing::warn!(error = %err, "search failed");
            self.sink.record(SearchEvent {
                request_id,
                at: Utc::now(),
                tenant: params.tenant.clone(),
                query: query_text(params.query.as_ref()),
                page: 0,
                outcome: SearchOutcome::Failed {
                    error: err.to_string(),
                },
                diagnostics: Diagnostics::default(),
                provider_diagnostics: BTreeMap::new(),
            });
        }
        result
    }

    async fn run(&self, request_id: Uuid, params: &SearchParams) -> Result<SearchResponse> {
        // Invalid queries are answered before the tenant is even looked up.
        let unchecked = params.resolve(&self.config, self.config.max_per_page);
        if let Err(message) = validate_query(&unchecked.query, &self.config) {
            tracing::debug!(query = %unchecked.query, reason = message, "query rejected");
            let response = SearchResponse::rejected(unchecked.page, unchecked.per_page, message);
            self.record(request_id, &unchecked, &response);
            return Ok(response);
        }

        let tenant = self
            .tenants
            .tenant(&params.tenant)
            .ok_or_else(|| SearchError::UnknownTenant(params.tenant.clone()))?;
        if !tenant.active {
            return Err(SearchError::TenantInactive(tenant.handle.clone()));
        }

        let request = params.resolve(&self.config, tenant.max_per_page(&self.config));
        tracing::Span::current().record("page", request.page);

        let (primary_kind, secondary_kind) = tenant.providers.providers();
        let primary_settings = self.config.provider(primary_kind);
        // Backfill only makes sense behind an exact primary total.
        let secondary_kind = secondary_kind.filter(|_| primary_settings.exact_totals);
        let exclusions = ExclusionSet::new(&tenant.excluded_urls);

        let start = request.start();
        let reachable = primary_settings
            .max_offset
            .map_or(true, |max| start - 1 <= max);

        let primary_call = async {
            if reachable {
                self.fetch_filtered(primary_kind, &request, start - 1, request.per_page, &exclusions)
                    .await
                    .map(Some)
            } else if primary_settings.exact_totals {
                tracing::debug!(offset = start - 1, "primary offset beyond max, probing total only");
                self.execute(primary_kind, &provider_query(&request, 0, 1))
                    .await
                    .map(|mut probe| {
                        probe.results.clear();
                        Some(probe)
                    })
            } else {
                tracing::debug!(offset = start - 1, "primary offset beyond max, nothing to fetch");
                Ok(None)
            }
        };
        let head_call = async {
            match secondary_kind {
                Some(kind) => Some(
                    self.fetch_filtered(kind, &request, 0, request.per_page, &exclusions)
                        .await,
                ),
                None => None,
            }
        };
        let (primary, secondary) = futures::future::join(primary_call, head_call).await;
        let primary = primary?;

        let mut secondary = match secondary {
            Some(Ok(response)) => Some(response),
            Some(Err(err)) => {
                tracing::warn!(error = %err, "backfill provider failed, serving primary results only");
                None
            }
            None => None,
        };

        let secondary_total = match secondary.as_ref().map(|response| response.total) {
            Some(Total::Exact(total)) => total,
            Some(Total::Unbounded) => {
                tracing::warn!("backfill provider reported no exact total, serving primary results only");
                secondary = None;
                0
            }
            None => 0,
        };

        let primary_total = primary.as_ref().map_or(Total::Unbounded, |response| response.total);
        let assembler = BlendedResultAssembler::new(primary_settings.max_offset);
        let plan = assembler.plan(primary_total, secondary_total, request.page, request.per_page);

        let news = if tenant.features.news_enrichment {
            self.news.as_deref()
        } else {
            None
        };
        let normalizer = ResultNormalizer::new(
            NormalizeOptions {
                highlighting: request.enable_highlighting,
                description_max_chars: self.config.description_max_chars,
            },
            news,
        );
        let rows = |response: Option<&ProviderResponse>| {
            response.map_or_else(SourceRows::empty, |response| {
                SourceRows::new(response.offset, normalizer.normalize_all(&response.results))
            })
        };

        let primary_rows = rows(primary.as_ref());
        let mut secondary_rows = rows(secondary.as_ref());
        if let (Some(slice), Some(response)) = (plan.secondary, secondary.as_mut()) {
            if !secondary_rows.covers(slice) {
                match self
                    .fetch_filtered(response.provider, &request, slice.offset, request.per_page, &exclusions)
                    .await
                {
                    Ok(follow) => {
                        response.diagnostics = sequential(&response.diagnostics, &follow.diagnostics);
                        response.results = follow.results;
                        response.offset = follow.offset;
                        secondary_rows = rows(Some(&*response));
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "backfill page fetch failed, serving primary results only");
                        response.results.clear();
                        secondary_rows = SourceRows::empty();
                    }
                }
            }
        }
        let window = assembler.assemble(&plan, primary_rows, secondary_rows);

        let spelling_suggestion = if tenant.features.spelling_suggestions {
            let raw = primary
                .as_ref()
                .and_then(|response| response.spelling_suggestion.as_deref())
                .or_else(|| {
                    secondary
                        .as_ref()
                        .and_then(|response| response.spelling_suggestion.as_deref())
                });
            spelling::resolve(raw, &request.query)
        } else {
            None
        };

        let mut modules = Vec::new();
        if window.primary_count > 0 {
            modules.push(primary_kind.module_tag().to_owned());
        }
        if let Some(response) = secondary.as_ref().filter(|_| window.secondary_count() > 0) {
            modules.push(response.provider.module_tag().to_owned());
        }

        // Per-provider entries keep raw fetch counts; the merged entry counts
        // what is actually returned.
        let mut provider_diagnostics = BTreeMap::new();
        for response in primary.iter().chain(secondary.iter()) {
            provider_diagnostics.insert(response.provider, response.diagnostics.clone());
        }
        let mut diagnostics = provider_diagnostics
            .values()
            .fold(None, |merged: Option<Diagnostics>, d| {
                Some(merged.map_or_else(|| d.clone(), |m| m.merge(d)))
            })
            .unwrap_or_default();
        diagnostics.result_count = window.results.len();

        let response = SearchResponse {
            startrecord: window.startrecord(),
            endrecord: window.endrecord(),
            results: window.results,
            total: window.total,
            total_pages: window.total_pages,
            page: request.page,
            per_page: request.per_page,
            spelling_suggestion,
            modules,
            diagnostics,
            provider_diagnostics,
            error: None,
        };
        self.record(request_id, &request, &response);
        Ok(response)
    }

    /// Fetch `limit` rows starting at position `offset` of the provider's
    /// result list with excluded URLs removed.
    ///
    /// Every excluded row shifts later rows up, so with exclusions configured
    /// the provider is read from its first row and the window is cut from the
    /// filtered list. Each read asks for `exclusions.len()` extra rows; reads
    /// continue while rows are missing and the provider still has more. The
    /// exact total is reduced by the rows dropped along the way.
    async fn fetch_filtered(
        &self,
        kind: ProviderKind,
        request: &SearchRequest,
        offset: u64,
        limit: u32,
        exclusions: &ExclusionSet,
    ) -> Result<ProviderResponse> {
        if exclusions.is_empty() {
            return self.execute(kind, &provider_query(request, offset, limit)).await;
        }

        let wanted = offset + u64::from(limit);
        let slack = exclusions.len() as u64;
        let scan = |raw_offset: u64, rows: u64| {
            provider_query(request, raw_offset, u32::try_from(rows).unwrap_or(u32::MAX))
        };

        let mut response = self.execute(kind, &scan(0, wanted + slack)).await?;
        let mut raw_offset = response.results.len() as u64;
        let mut exhausted = raw_offset < wanted + slack;
        let mut dropped = exclusions.retain(&mut response.results) as u64;

        while !exhausted && (response.results.len() as u64) < wanted {
            let rows = wanted - response.results.len() as u64 + slack;
            let mut more = self.execute(kind, &scan(raw_offset, rows)).await?;
            let fetched = more.results.len() as u64;
            raw_offset += fetched;
            exhausted = fetched < rows;
            dropped += exclusions.retain(&mut more.results) as u64;
            response.results.append(&mut more.results);
            response.diagnostics = sequential(&response.diagnostics, &more.diagnostics);
        }

        if dropped > 0 {
            tracing::debug!(provider = %kind, dropped, "excluded URLs removed");
        }
        response.total = response.total.saturating_sub(dropped);
        response.results = response
            .results
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        response.offset = offset;
        Ok(response)
    }

    async fn execute(&self, kind: ProviderKind, query: &ProviderQuery) -> Result<ProviderResponse> {
        let settings = self.config.provider(kind);
        match kind {
            ProviderKind::WebApi => {
                QueryExecutor::new(&self.web, settings, self.config.max_attempts)
                    .execute(query)
                    .await
            }
            ProviderKind::LocalIndex => {
                QueryExecutor::new(&self.local, settings, self.config.max_attempts)
                    .execute(query)
                    .await
            }
        }
    }

    fn record(&self, request_id: Uuid, request: &SearchRequest, response: &SearchResponse) {
        let outcome = match &response.error {
            Some(message) => SearchOutcome::Rejected {
                message: message.clone(),
            },
            None => SearchOutcome::Completed {
                total: response.total,
                returned: response.results.len(),
            },
        };
        self.sink.record(SearchEvent {
            request_id,
            at: Utc::now(),
            tenant: request.tenant.clone(),
            query: request.query.clone(),
            page: request.page,
            outcome,
            diagnostics: response.diagnostics.clone(),
            provider_diagnostics: response.provider_diagnostics.clone(),
        });
    }
}

fn provider_query(request: &SearchRequest, offset: u64, limit: u32) -> ProviderQuery {
    ProviderQuery {
        tenant: request.tenant.clone(),
        query: request.query.clone(),
        offset,
        limit,
        filters: request.filters.clone(),
        enable_highlighting: request.enable_highlighting,
        geoip_info: request.geoip_info.clone(),
    }
}

/// Diagnostics of two calls made one after the other.
fn sequential(first: &Diagnostics, second: &Diagnostics) -> Diagnostics {
    let mut merged = first.merge(second);
    merged.elapsed_time_ms = first.elapsed_time_ms + second.elapsed_time_ms;
    merged
}

fn query_text(raw: Option<&Value>) -> String {
    match raw {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
