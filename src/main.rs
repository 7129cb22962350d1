//! TimeLock Vault server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser / CLI ──▶ http (session guard, handlers)
//!                           │
//!                           ▼
//!                       views (create flow, manage screen, NFT panel)
//!                           │
//!              ┌────────────┼──────────────┐
//!              ▼            ▼              ▼
//!          vault facade   repository    action tracker
//!              │            │              │
//!              ▼            ▼              ▼
//!        wallet bridge   chain API ◀───────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use timelock_vault::config::load_or_default;
use timelock_vault::http::HttpServer;
use timelock_vault::lifecycle::{build_state, spawn_signal_handler, Shutdown};
use timelock_vault::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "timelock-vault")]
#[command(about = "TimeLock Vault server", long_about = None)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind address from the configuration
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_or_default(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "timelock-vault starting");

    tracing::info!(
        bind_address = %config.server.bind_address,
        network = %config.network.default,
        contract = %format!("{}.{}", config.contract.address, config.contract.name),
        wallet_bridge = %config.wallet.bridge_url,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let state = build_state(config).await?;

    let shutdown = Arc::new(Shutdown::new());
    let stopped = shutdown.signalled();
    spawn_signal_handler(shutdown.clone());

    HttpServer::new(state).run(listener, stopped).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
