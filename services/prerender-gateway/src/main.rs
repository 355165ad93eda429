//! Prerender edge gateway service.
//!
//! Sits between the internet and a client-rendered SPA: serves crawlers
//! prerendered HTML snapshots from the cache backend and passes everyone
//! else through to the origin unchanged.

use std::net::SocketAddr;

use anyhow::Result;
use clap::Parser;
use edge_core::GatewayConfig;
use edge_dispatch::{router, AppState};
use tracing_subscriber::EnvFilter;

/// Prerender edge gateway - crawler-aware cache serving for SPAs
#[derive(Parser)]
#[command(name = "prerender-gateway")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8080", env = "PRERENDER_LISTEN_ADDR")]
    listen: SocketAddr,

    /// Cache backend base URL (overrides PRERENDER_BACKEND_URL)
    #[arg(long)]
    backend_url: Option<String>,

    /// Origin SPA base URL (overrides PRERENDER_ORIGIN_URL)
    #[arg(long)]
    origin_url: Option<String>,

    /// Disable script-fragment injection
    #[arg(long)]
    no_script_injection: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = GatewayConfig::from_env();
    if let Some(backend_url) = cli.backend_url {
        config = config.with_backend_url(backend_url);
    }
    if let Some(origin_url) = cli.origin_url {
        config = config.with_origin_url(origin_url);
    }
    if cli.no_script_injection {
        config.script_injection_enabled = false;
    }

    if config.is_degraded() {
        tracing::warn!(
            "no cache backend configured; serving in always-fallback mode \
             (set PRERENDER_BACKEND_URL to enable prerender serving)"
        );
    }
    tracing::info!(
        origin = %config.origin_url,
        backend = config.backend_url.as_deref().unwrap_or("<none>"),
        script_injection = config.script_injection_enabled,
        "gateway configuration loaded"
    );

    let state = AppState::new(config);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(cli.listen).await?;
    tracing::info!(addr = %cli.listen, "prerender gateway listening");
    axum::serve(listener, app).await?;

    Ok(())
}
