//! Reservation server (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (axum, request ID, timeout)
//!                        │
//!                        ▼
//!                     routing::Router ── miss ──▶ 404 {"message":"API not found"}
//!                        │
//!                        ▼
//!                     handler(task, ctx)
//!                        │
//!                        ▼
//!                     db::ConnectionPool ◀── health::PoolSweeper (periodic)
//!                        │
//!                        ▼
//!                     data source
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use reservation_server::app::{build_router, Context};
use reservation_server::config::{load_config, ServerConfig};
use reservation_server::db::{ConnectionPool, TcpConnector};
use reservation_server::health::PoolSweeper;
use reservation_server::observability::{logging, metrics};
use reservation_server::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "reservation-server")]
#[command(about = "Reservation server: route dispatch and pooled database access", long_about = None)]
struct Cli {
    /// Path to a TOML config file; built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    logging::init(&config.observability.log_level)?;
    tracing::info!("reservation-server v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        data_source = %config.pool.data_source,
        pool_size = ?config.pool.size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    // Opening the pool blocks on connects.
    let pool_config = config.pool.clone();
    let pool = tokio::task::spawn_blocking(move || {
        ConnectionPool::from_config(TcpConnector::default(), &pool_config)
    })
    .await??;

    let shutdown = Shutdown::new();

    let sweeper = PoolSweeper::new(
        pool.clone(),
        Duration::from_secs(config.pool.sweep_interval_secs),
    );
    tokio::spawn(sweeper.run(shutdown.subscribe()));

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { shutdown.trigger_on_ctrl_c().await });
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(build_router(), Context::new(pool), config.listener.clone());
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
