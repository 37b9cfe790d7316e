//! Pairlink Server - pairs a desktop browser with a phone and relays one link.

use anyhow::Result;
use clap::Parser;
use pairlink_core::{MemoryStore, SessionStore};
use pairlink_server::server::{self, spawn_purge_task, AppState};
use pairlink_server::{Args, StoreBackend};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins over --debug
    let default_level = if args.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    info!("Starting Pairlink Server");
    args.validate()?;

    if args.uses_default_admin_pass() {
        warn!("ADMIN_PASS not set, using the default admin password");
    }

    let store: Arc<dyn SessionStore> = match args.store {
        StoreBackend::Memory => {
            let memory = Arc::new(MemoryStore::new());
            spawn_purge_task(memory.clone());
            memory
        }
        StoreBackend::Upstash => Arc::new(args.upstash_store()?),
    };
    info!("Session store: {}", store.backend_name());

    let state = AppState::new(store, args.pairing_config(), args.admin_pass.clone());
    let addr = server::start_server(state, &args.host, args.port).await?;

    info!("Server running on {}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);
    info!("REST endpoints under http://{}/api/pairing", addr);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
