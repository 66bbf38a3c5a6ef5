use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voicecast_backend::infrastructure::config::{Config, LogFormat};
use voicecast_backend::infrastructure::http::{build_application, start_http_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {}", e))?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        environment = ?config.environment,
        "Starting VoiceCast Backend on {}:{}",
        config.host,
        config.port
    );

    // Cancelled on Ctrl-C / SIGTERM; stops the server, the reaper and in-flight FPT polls
    let shutdown = CancellationToken::new();

    let app = build_application(&config, shutdown.clone())
        .await
        .map_err(|e| anyhow::anyhow!("failed to start: {}", e))?;

    let reaper = tokio::spawn(app.reaper.run(shutdown.clone()));
    tokio::spawn(wait_for_signal(shutdown.clone()));

    start_http_server(&config, app.router, shutdown.clone())
        .await
        .map_err(|e| anyhow::anyhow!("server error: {}", e))?;

    shutdown.cancel();
    if let Err(e) = reaper.await {
        tracing::warn!(error = %e, "Artifact reaper task ended abnormally");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn wait_for_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "voicecast_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "voicecast_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
