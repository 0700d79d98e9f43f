use std::sync::Arc;

use pac_relay::ConfigRegistry;
use pac_relay::LogConfig;
use pac_relay::Settings;
use pac_relay::new_metrics_registry;
use pac_relay::register_custom_metrics;
use pac_relay::set_default_routes_metrics;
use pac_relay::start_server;
use pac_relay::Error;
use pac_relay::Result;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let settings = Settings::load()?;

    // Initializing Logs
    init_observability(&settings.log);

    // Initializing Metrics
    let metrics_registry = new_metrics_registry(&settings.monitoring.hostname)?;
    register_custom_metrics(&metrics_registry)?;
    set_default_routes_metrics();

    // Initializing Shutdown Signal
    let (graceful_tx, graceful_rx) = watch::channel(());
    tokio::spawn(async move {
        if let Err(e) = graceful_shutdown(graceful_tx).await {
            error!("Failed to shutdown: {:?}", e);
        }
    });

    let registry = Arc::new(ConfigRegistry::new());
    start_server(
        settings.server.listen_address,
        registry,
        settings.server.max_upload_bytes,
        metrics_registry,
        graceful_rx,
    )
    .await?;

    info!("Exiting program.");
    Ok(())
}

async fn graceful_shutdown(graceful_tx: watch::Sender<()>) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }

    info!("Shutdown server..");
    graceful_tx.send(()).map_err(|e| {
        error!("Failed to send shutdown signal: {}", e);
        Error::SignalSenderClosed(format!("Failed to send shutdown signal: {}", e))
    })?;
    Ok(())
}

/// `RUST_LOG` wins over `log.filter`
fn init_observability(log: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let base_subscriber = tracing_subscriber::fmt::layer().with_filter(filter);
    tracing_subscriber::registry().with(base_subscriber).init();
}
