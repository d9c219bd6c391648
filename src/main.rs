//! refdesk server binary.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use refdesk::agent::{ResolverConfig, select_provider};
use refdesk::pipeline::QueryResolver;
use refdesk::server::{AppState, router};
use refdesk::store::{BOOK_HEADERS, CsvStore, RESEARCH_HEADERS};

/// AI research assistant serving book and topic queries over HTTP.
#[derive(Debug, Parser)]
#[command(name = "refdesk", version, about)]
struct Cli {
    /// Listen address.
    #[arg(long, env = "REFDESK_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Listen port.
    #[arg(long, env = "REFDESK_PORT", default_value_t = 5000)]
    port: u16,

    /// Book results file.
    #[arg(long, env = "REFDESK_DATA_FILE", default_value = "data.csv")]
    data_file: String,

    /// Research results file.
    #[arg(long, env = "REFDESK_RESEARCH_FILE", default_value = "research.csv")]
    research_file: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; shell environment still applies.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = ResolverConfig::from_env();

    // Provider selection happens once; a failed selection leaves the
    // server up in degraded mode so the interface still loads.
    let provider = match select_provider(&config) {
        Ok(provider) => {
            info!(provider = provider.name(), "reasoning provider selected");
            Some(provider)
        }
        Err(e) => {
            warn!(error = %e, "no reasoning provider; queries will be rejected");
            None
        }
    };

    let state = AppState {
        resolver: Arc::new(QueryResolver::new(provider, config)),
        books: Arc::new(CsvStore::new(&cli.data_file, BOOK_HEADERS)),
        research: Arc::new(CsvStore::new(&cli.research_file, RESEARCH_HEADERS)),
    };

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
