//! Sitesearch: hosted site search for many tenants.
//!
//! This crate is the host around [`sitesearch_core`]: it loads the TOML
//! configuration, builds HTTP provider transports (optionally cached) and
//! hands back a ready [`SearchCoordinator`](sitesearch_core::SearchCoordinator).
//!
//! # Architecture
//!
//! - **Config**: one TOML file with engine limits, provider endpoints and tenants
//! - **Transports**: `reqwest` over HTTP, wrapped in a `moka` payload cache
//! - **Engine**: `sitesearch-core` blends web API results with local index backfill
//! - **CLI**: the `sitesearch` binary prints JSON responses on stdout

pub mod app;
pub mod config;
pub mod error;

pub use app::{HostCoordinator, build_coordinator, load_news_items};
pub use config::AppConfig;
pub use error::{AppError, Result};
pub use sitesearch_core::{SearchParams, SearchResponse};
