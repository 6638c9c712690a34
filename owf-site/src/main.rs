use std::env;

use anyhow::Context;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use owf_site::{cache, cli, render, router, AppState, Conference};

fn setup_logging(verbose: usize) {
    let default = match verbose {
        0 => "owf_site=info",
        1 => "owf_site=debug",
        _ => "owf_site=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose >= 2)
        .init();
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::parse(env::args().skip(1).collect());
    setup_logging(args.verbose);

    render::templates().context("Failed to register templates")?;

    let conference = Conference::load(&args.data)
        .with_context(|| format!("Failed to load conference from {}", args.data.display()))?;
    info!(
        path = %args.data.display(),
        languages = ?conference.site.languages,
        "Loaded conference"
    );

    let state = AppState::new(
        conference,
        cache::Config {
            enabled: args.enable_cache,
            ttl: args.cache_ttl,
            capacity: args.cache_capacity,
        },
    );

    let listener = TcpListener::bind(args.address)
        .await
        .with_context(|| format!("Failed to bind {}", args.address))?;
    info!("Listening at http://{}", args.address);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
