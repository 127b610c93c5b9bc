//! Single-provider query execution with timeout and bounded retry.
//!
//! Each attempt is timed from just before the network call. Only transient
//! failures (timeouts, connection failures) are retried, immediately and at
//! most `max_attempts` times in total. Diagnostics describe the final,
//! successful attempt only.

use std::time::{Duration, Instant};

use crate::config::ProviderSettings;
use crate::error::{SearchError, TransportError};
use crate::provider::{ProviderQuery, ProviderResponse, ProviderTransport, ResponseAdapter};
use crate::types::Total;

/// Executes one provider query against a transport.
pub struct QueryExecutor<'a, T> {
    transport: &'a T,
    settings: &'a ProviderSettings,
    max_attempts: u32,
}

impl<'a, T: ProviderTransport> QueryExecutor<'a, T> {
    /// Create an executor. `max_attempts` is clamped to at least 1.
    pub fn new(transport: &'a T, settings: &'a ProviderSettings, max_attempts: u32) -> Self {
        Self {
            transport,
            settings,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Execute `query`, retrying transient failures.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Provider`] wrapping the last transport error
    /// once attempts are exhausted, or immediately for non-transient
    /// failures, including payloads the provider's adapter rejects.
    pub async fn execute(&self, query: &ProviderQuery) -> Result<ProviderResponse, SearchError> {
        let kind = self.transport.kind();
        let timeout = Duration::from_millis(self.settings.attempt_timeout_ms);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            tracing::debug!(
                provider = %kind,
                endpoint = self.transport.endpoint(),
                params = ?kind.request_params(query),
                attempt,
                "executing provider query"
            );

            let started = Instant::now();
            let outcome = match tokio::time::timeout(timeout, self.transport.send(query)).await {
                Ok(result) => result.and_then(|payload| kind.adapt(query, &payload)),
                Err(_) => Err(TransportError::Timeout(format!(
                    "no response within {}ms",
                    self.settings.attempt_timeout_ms
                ))),
            };
            let elapsed_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok(mut response) => {
                    if !self.settings.exact_totals {
                        response.total = Total::Unbounded;
                    }
                    response.diagnostics.retry_count = attempt - 1;
                    response.diagnostics.elapsed_time_ms = elapsed_ms;
                    tracing::debug!(
                        provider = %kind,
                        results = response.results.len(),
                        retry_count = attempt - 1,
                        elapsed_ms,
                        "provider query succeeded"
                    );
                    return Ok(response);
                }
                Err(err) if err.is_transient() && attempt < self.max_attempts => {
                    tracing::warn!(provider = %kind, attempt, error = %err, "transient provider failure, retrying");
                }
                Err(err) => {
                    tracing::warn!(provider = %kind, attempt, elapsed_ms, error = %err, "provider query failed");
                    return Err(SearchError::provider(
                        kind,
                        &query.query,
                        elapsed_ms,
                        attempt,
                        err,
                    ));
                }
            }
        }
    }
}
