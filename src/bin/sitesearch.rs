//! CLI binary for sitesearch.

use anyhow::Context;
use clap::{Parser, Subcommand};
use sitesearch::{AppConfig, SearchParams, build_coordinator};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Sitesearch: blended web API and local index search for hosted sites.
#[derive(Parser)]
#[command(name = "sitesearch", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long, env = "SITESEARCH_CONFIG")]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Run one search and print the JSON response.
    Search {
        /// Tenant handle.
        #[arg(short, long)]
        tenant: String,

        /// Query text.
        query: String,

        /// 1-based page number.
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Results per page (engine default when omitted).
        #[arg(long)]
        per_page: Option<u32>,

        /// Plain text instead of `<strong>` highlighting.
        #[arg(long)]
        no_highlighting: bool,

        /// Pretty-print the JSON response.
        #[arg(long)]
        pretty: bool,
    },

    /// Validate the configuration file and exit.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sitesearch=info,sitesearch_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let path = cli.config.unwrap_or_else(AppConfig::default_config_path);
    let config = AppConfig::from_file(&path)
        .with_context(|| format!("loading {}", path.display()))?;

    match cli.command {
        Command::Check => {
            config.validate()?;
            println!("{}: ok ({} tenants)", path.display(), config.tenants.len());
            Ok(())
        }
        Command::Search {
            tenant,
            query,
            page,
            per_page,
            no_highlighting,
            pretty,
        } => {
            let mut params = SearchParams::new(tenant, query)
                .with_page(page)
                .with_highlighting(!no_highlighting);
            if let Some(per_page) = per_page {
                params = params.with_per_page(per_page);
            }
            run_search(&config, &params, pretty).await
        }
    }
}

async fn run_search(config: &AppConfig, params: &SearchParams, pretty: bool) -> anyhow::Result<()> {
    let coordinator = build_coordinator(config)?;

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupted, cancelling search");
                cancel.cancel();
            }
        })
    };

    let result = coordinator.search_with_cancel(params, &cancel).await;
    ctrl_c.abort();

    let response = result.context("search failed")?;
    let json = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{json}");
    Ok(())
}
