// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Mintara Labs

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use mintara_sweep_server::api;
use mintara_sweep_server::blockchain::EthClient;
use mintara_sweep_server::config::{Settings, TREASURY_ADDRESS_ENV};
use mintara_sweep_server::state::AppState;
use mintara_sweep_server::storage::{FileStore, StoragePaths};
use mintara_sweep_server::sweep::{SweepExecutor, SweepScheduler};
use mintara_sweep_server::vault::KeyVault;

#[tokio::main]
async fn main() {
    init_tracing();

    let settings = Arc::new(Settings::from_env());
    info!(
        network = settings.network.name,
        rpc_url = %settings.rpc_url,
        data_dir = %settings.data_dir.display(),
        "Starting Mintara sweep server"
    );

    // Storage is mandatory; nothing works without a writable data directory.
    let mut store = FileStore::new(StoragePaths::new(&settings.data_dir));
    store
        .initialize()
        .expect("Failed to initialize data directory");
    let store = Arc::new(store);

    // Logs loudly when falling back to the insecure development secret.
    let vault = Arc::new(KeyVault::from_env());

    let chain = Arc::new(
        EthClient::new(settings.network, &settings.rpc_url)
            .expect("Failed to construct chain client"),
    );

    let shutdown = CancellationToken::new();

    let scheduler = match settings.treasury_address.clone() {
        Some(treasury_address) => {
            let executor = SweepExecutor::new(
                chain.clone(),
                vault.clone(),
                store.clone(),
                treasury_address,
                settings.network.name.to_string(),
            );
            Some(Arc::new(SweepScheduler::new(
                store.clone(),
                executor,
                settings.sweep_interval,
                settings.user_delay,
            )))
        }
        None => {
            warn!(
                "{} is not set; sweeping is DISABLED. Deposit funds will accumulate \
                 at per-user addresses until a treasury address is configured.",
                TREASURY_ADDRESS_ENV
            );
            None
        }
    };

    let scheduler_task = scheduler
        .clone()
        .map(|s| tokio::spawn(s.run(shutdown.clone())));

    let state = AppState::new(
        settings.clone(),
        store,
        vault,
        chain,
        scheduler,
        shutdown.clone(),
    );
    let app = api::router(state);

    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port)
        .parse()
        .expect("Failed to parse bind address");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");

    info!(%addr, "Mintara sweep server listening (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .expect("HTTP server failed");

    // Stop the scheduler between users and wait for the in-flight run.
    shutdown.cancel();
    if let Some(task) = scheduler_task {
        let _ = task.await;
    }

    info!("Shutdown complete");
}

/// Resolve when SIGINT arrives, cancelling the shared shutdown token.
async fn shutdown_signal(shutdown: CancellationToken) {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");
    info!("Shutdown signal received");
    shutdown.cancel();
}

/// Initialize tracing from `RUST_LOG` and `LOG_FORMAT`.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=debug"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
