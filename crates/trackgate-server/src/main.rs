//! trackgate — telematics ingestion endpoint.
//!
//! Binds the device-facing TCP listener, wires decoded events to the
//! stdout sink, and runs until SIGINT/SIGTERM. Exit codes: 0 on a
//! graceful shutdown, 1 on listener failure, 2 on bad configuration.

mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use trackgate_network::{TcpServerConfig, TrackerServer};
use trackgate_session::StdoutSink;

use config::AppConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("invalid configuration: {err}");
            std::process::exit(2);
        }
    };

    let sink = Arc::new(StdoutSink::new(config.print_mode));
    let server_config = TcpServerConfig {
        bind_addr: SocketAddr::from(([0, 0, 0, 0], config.listen_port)),
        register_token: config.register_token.clone(),
        log_hex: config.log_hex,
        ..TcpServerConfig::default()
    };

    let server = match TrackerServer::bind(server_config, sink).await {
        Ok(server) => server,
        Err(err) => {
            error!("{err}");
            std::process::exit(1);
        }
    };

    info!(
        port = config.listen_port,
        print_mode = %config.print_mode,
        "trackgate v{} ready",
        trackgate_core::VERSION
    );

    tokio::select! {
        result = server.run() => {
            if let Err(err) = result {
                error!("listener failed: {err}");
                std::process::exit(1);
            }
        }
        _ = shutdown_signal() => {
            info!("shutdown signal received, closing listener");
        }
    }
}

/// Completes on SIGINT or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
