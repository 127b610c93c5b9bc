//! Diagnostics sinks.
//!
//! Every completed or failed search produces one [`SearchEvent`]. Sinks are
//! fire-and-forget: [`DiagnosticsSink::record`] is synchronous and must not
//! block, so the response path never waits on observability.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::types::{Diagnostics, ProviderKind, Total};

/// How a search ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// A full response was produced.
    Completed { total: Total, returned: usize },
    /// The query failed validation; no provider was called.
    Rejected { message: String },
    /// The request failed.
    Failed { error: String },
}

/// One search, as reported to observability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchEvent {
    pub request_id: Uuid,
    pub at: DateTime<Utc>,
    pub tenant: String,
    pub query: String,
    pub page: u32,
    pub outcome: SearchOutcome,
    pub diagnostics: Diagnostics,
    pub provider_diagnostics: BTreeMap<ProviderKind, Diagnostics>,
}

/// Receives search events.
pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, event: SearchEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticsSink for NoopSink {
    fn record(&self, _event: SearchEvent) {}
}

/// Emits each event as a structured `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn record(&self, event: SearchEvent) {
        let d = &event.diagnostics;
        match &event.outcome {
            SearchOutcome::Completed { total, returned } => tracing::info!(
                request_id = %event.request_id,
                tenant = %event.tenant,
                page = event.page,
                total = ?total,
                returned,
                retry_count = d.retry_count,
                elapsed_ms = d.elapsed_time_ms,
                from_cache = ?d.from_cache,
                "search completed"
            ),
            SearchOutcome::Rejected { message } => tracing::info!(
                request_id = %event.request_id,
                tenant = %event.tenant,
                reason = %message,
                "search rejected"
            ),
            SearchOutcome::Failed { error } => tracing::warn!(
                request_id = %event.request_id,
                tenant = %event.tenant,
                error = %error,
                "search failed"
            ),
        }
    }
}

/// Forwards events into an unbounded channel for an external consumer.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SearchEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SearchEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DiagnosticsSink for ChannelSink {
    fn record(&self, event: SearchEvent) {
        // A dropped receiver means nobody is listening any more.
        if self.tx.send(event).is_err() {
            tracing::trace!("diagnostics receiver dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(outcome: SearchOutcome) -> SearchEvent {
        SearchEvent {
            request_id: Uuid::new_v4(),
            at: Utc::now(),
            tenant: "nasa".into(),
            query: "mars".into(),
            page: 1,
            outcome,
            diagnostics: Diagnostics::default(),
            provider_diagnostics: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn channel_sink_delivers_events() {
        let (sink, mut rx) = ChannelSink::new();
        sink.record(event(SearchOutcome::Completed {
            total: Total::Exact(3),
            returned: 3,
        }));
        let received = rx.recv().await.expect("event");
        assert_eq!(received.tenant, "nasa");
        assert!(matches!(received.outcome, SearchOutcome::Completed { returned: 3, .. }));
    }

    #[test]
    fn channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.record(event(SearchOutcome::Failed {
            error: "boom".into(),
        }));
    }

    #[test]
    fn tracing_and_noop_sinks_accept_every_outcome() {
        for outcome in [
            SearchOutcome::Completed {
                total: Total::Unbounded,
                returned: 0,
            },
            SearchOutcome::Rejected {
                message: "Please enter a search term in the box above.".into(),
            },
            SearchOutcome::Failed {
                error: "web_api failed".into(),
            },
        ] {
            TracingSink.record(event(outcome.clone()));
            NoopSink.record(event(outcome));
        }
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(SearchOutcome::Rejected {
            message: "m".into(),
        })
        .expect("serialize");
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["message"], "m");
    }
}
