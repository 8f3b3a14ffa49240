//! Paradex hedge agent - Entry Point

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Delta-neutral hedge agent for Paradex perpetuals
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via HEDGE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    hedge_telemetry::init_logging()?;

    info!("Starting hedge agent v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > HEDGE_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("HEDGE_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = hedge_bot::AppConfig::from_file(&config_path)?;
    info!(
        http_url = %config.http_url,
        markets = ?config.markets,
        "Configuration loaded"
    );

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let mut engine = hedge_bot::Application::new(config)?.setup().await?;
    engine.run(shutdown).await?;

    match hedge_telemetry::Metrics::render() {
        Ok(metrics) => debug!(%metrics, "Final metrics"),
        Err(e) => warn!(error = %e, "Failed to render metrics"),
    }
    info!("Hedge agent stopped");
    Ok(())
}

/// Cancel `shutdown` on SIGINT, SIGTERM or SIGQUIT.
async fn watch_signals(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut term, mut quit) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::quit()),
        ) {
            (Ok(term), Ok(quit)) => (term, quit),
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Failed to install signal handlers, using Ctrl-C only");
                let _ = tokio::signal::ctrl_c().await;
                shutdown.cancel();
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
            _ = term.recv() => info!("Received SIGTERM"),
            _ = quit.recv() => info!("Received SIGQUIT"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received Ctrl-C");
    }

    shutdown.cancel();
}
