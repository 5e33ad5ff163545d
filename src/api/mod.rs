// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Mintara Labs

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;
use crate::storage::{SweepRecord, SweepStatus, WalletView};
use crate::sweep::scheduler::{FailedEntry, RunSummary, SkippedEntry, SweptEntry};
use crate::sweep::SkipReason;

pub mod health;
pub mod sweep;
pub mod wallets;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/wallets", post(wallets::create_wallet))
        .route("/wallets/{user_id}", get(wallets::get_wallet))
        .route("/wallets/{user_id}/balance", get(wallets::deposit_balance))
        .route("/treasury/balance", get(sweep::treasury_balance))
        .route("/sweep/run", post(sweep::trigger_sweep))
        .route("/sweep/records", get(sweep::list_records))
        .route("/sweep/records/{tx_hash}", get(sweep::get_record))
        .route("/sweep/records/{tx_hash}/status", get(sweep::record_status))
        .with_state(state.clone());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state)
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        wallets::create_wallet,
        wallets::get_wallet,
        wallets::deposit_balance,
        sweep::trigger_sweep,
        sweep::treasury_balance,
        sweep::list_records,
        sweep::get_record,
        sweep::record_status
    ),
    components(
        schemas(
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks,
            wallets::CreateWalletRequest,
            wallets::DepositBalanceResponse,
            sweep::TreasuryBalanceResponse,
            sweep::RecordsResponse,
            sweep::TxStatusResponse,
            WalletView,
            SweepRecord,
            SweepStatus,
            SkipReason,
            RunSummary,
            SweptEntry,
            SkippedEntry,
            FailedEntry
        )
    ),
    tags(
        (name = "Health", description = "Service health probes"),
        (name = "Wallets", description = "Deposit wallet provisioning and queries"),
        (name = "Sweep", description = "Sweep runs, ledger and treasury")
    )
)]
struct ApiDoc;

/// Test fixture: a fully wired `AppState` over a temp data directory, with
/// sweeping disabled (no treasury) and an RPC endpoint that is never dialed.
#[cfg(test)]
pub(crate) fn test_state() -> (AppState, tempfile::TempDir) {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use crate::blockchain::{EthClient, ETH_SEPOLIA};
    use crate::config::Settings;
    use crate::storage::{FileStore, StoragePaths};
    use crate::vault::KeyVault;

    let dir = tempfile::tempdir().expect("create temp dir");
    let mut store = FileStore::new(StoragePaths::new(dir.path()));
    store.initialize().expect("initialize test store");

    let settings = Settings {
        network: ETH_SEPOLIA,
        rpc_url: "http://localhost:8545".to_string(),
        treasury_address: None,
        sweep_interval: Duration::from_secs(180),
        user_delay: Duration::from_millis(1000),
        data_dir: dir.path().to_path_buf(),
        host: "127.0.0.1".to_string(),
        port: 0,
    };
    let chain = EthClient::new(settings.network, &settings.rpc_url).expect("test client");

    let state = AppState::new(
        Arc::new(settings),
        Arc::new(store),
        Arc::new(KeyVault::new("test-secret")),
        Arc::new(chain),
        None,
        CancellationToken::new(),
    );

    (state, dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let (state, _dir) = test_state();
        let app = router(state);
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }
}
