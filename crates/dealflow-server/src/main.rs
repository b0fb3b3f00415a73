//! Dealflow Server - Main entry point

use anyhow::Result;
use dealflow_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, time::Duration};
use tokio::signal;
use tracing::info;

use dealflow_server::{app, auth::spawn_purge_task, config::Config, features::AppState, mailer};

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("dealflow-server")
        .filter_directives("dealflow_server=debug,dealflow_common=info,tower_http=debug,sqlx=warn")
        .build()
        .merge_dotenv()?;

    init_logging(&log_config)?;

    info!("Starting Dealflow Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let sender = mailer::from_config(&config.mail)?;
    let state = AppState::from_config(config.clone(), sender)?;

    let purge = spawn_purge_task(
        state.magic_links.clone(),
        Duration::from_secs(config.auth.purge_interval_secs),
    );
    info!(
        interval_secs = config.auth.purge_interval_secs,
        "Magic link purge task started"
    );

    let app = app(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    purge.abort();
    info!("Server shut down gracefully");

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM, then give in-flight requests a grace period
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
