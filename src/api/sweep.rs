// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Mintara Labs

//! Sweep operations: manual trigger, ledger queries and treasury balance.
//!
//! The manual trigger is the operator-facing equivalent of the scheduled
//! run; both go through the scheduler's run lock, so they can never sweep
//! the same address concurrently.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    blockchain::{Chain, ChainError},
    error::ApiError,
    state::AppState,
    storage::{StorageError, SweepRecord, SweepRepository},
    sweep::{RunSummary, SweepRunError},
};

/// Treasury balance response.
#[derive(Debug, Serialize, ToSchema)]
pub struct TreasuryBalanceResponse {
    /// Treasury wallet address.
    pub address: String,
    /// Confirmed on-chain balance in wei, decimal string.
    pub balance_wei: String,
    /// Network queried.
    pub network: String,
}

/// Query parameters for ledger listing.
#[derive(Debug, Deserialize, IntoParams)]
pub struct RecordsQuery {
    /// Only return records for this user.
    pub user_id: Option<String>,
}

/// Ledger listing response.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordsResponse {
    /// Matching ledger entries, most recent first.
    pub records: Vec<SweepRecord>,
    /// Total count.
    pub total: usize,
}

/// On-chain confirmation status of a swept transaction.
#[derive(Debug, Serialize, ToSchema)]
pub struct TxStatusResponse {
    /// Transaction hash queried.
    pub tx_hash: String,
    /// Whether a receipt exists yet.
    pub confirmed: bool,
    /// Block the transaction was included in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Gas actually used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    /// Whether the transaction succeeded on-chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

/// Trigger a sweep run now.
///
/// Runs the same code path as the scheduled sweep, including the run lock:
/// a trigger that overlaps a scheduled run gets 409 instead of a second
/// concurrent run.
#[utoipa::path(
    post,
    path = "/v1/sweep/run",
    tag = "Sweep",
    responses(
        (status = 200, description = "Sweep run completed", body = RunSummary),
        (status = 409, description = "A sweep run is already in progress"),
        (status = 503, description = "Sweeping is disabled (no treasury address configured)")
    )
)]
pub async fn trigger_sweep(
    State(state): State<AppState>,
) -> Result<Json<RunSummary>, ApiError> {
    let scheduler = state.scheduler.as_ref().ok_or_else(|| {
        ApiError::service_unavailable("Sweeping is disabled: no treasury address configured")
    })?;

    let summary = scheduler
        .run_once(&state.shutdown)
        .await
        .map_err(|e| match e {
            SweepRunError::AlreadyRunning => ApiError::conflict(e.to_string()),
            SweepRunError::Storage(e) => {
                ApiError::internal(format!("Sweep run failed: {e}"))
            }
        })?;

    Ok(Json(summary))
}

/// Get the treasury wallet's on-chain balance.
#[utoipa::path(
    get,
    path = "/v1/treasury/balance",
    tag = "Sweep",
    responses(
        (status = 200, description = "Balance retrieved", body = TreasuryBalanceResponse),
        (status = 503, description = "No treasury configured or chain node unavailable")
    )
)]
pub async fn treasury_balance(
    State(state): State<AppState>,
) -> Result<Json<TreasuryBalanceResponse>, ApiError> {
    let address = state
        .settings
        .treasury_address
        .clone()
        .ok_or_else(|| ApiError::service_unavailable("No treasury address configured"))?;

    let balance = state.chain.balance_of(&address).await.map_err(|e| match e {
        ChainError::Network(msg) => {
            ApiError::service_unavailable(format!("Chain node unavailable: {msg}"))
        }
        other => ApiError::internal(format!("Balance query failed: {other}")),
    })?;

    Ok(Json(TreasuryBalanceResponse {
        address,
        balance_wei: balance.to_string(),
        network: state.chain.network().name.to_string(),
    }))
}

/// List sweep ledger entries.
#[utoipa::path(
    get,
    path = "/v1/sweep/records",
    tag = "Sweep",
    params(RecordsQuery),
    responses(
        (status = 200, description = "Ledger entries", body = RecordsResponse)
    )
)]
pub async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<RecordsQuery>,
) -> Result<Json<RecordsResponse>, ApiError> {
    let ledger = SweepRepository::new(&state.store);
    let records = match query.user_id {
        Some(user_id) => ledger.list_by_user(&user_id),
        None => ledger.list(),
    }
    .map_err(|e| ApiError::internal(format!("Failed to read ledger: {e}")))?;

    let total = records.len();
    Ok(Json(RecordsResponse { records, total }))
}

/// Get one sweep ledger entry by transaction hash.
#[utoipa::path(
    get,
    path = "/v1/sweep/records/{tx_hash}",
    tag = "Sweep",
    params(("tx_hash" = String, Path, description = "Transaction hash")),
    responses(
        (status = 200, description = "Ledger entry", body = SweepRecord),
        (status = 404, description = "No ledger entry for this hash")
    )
)]
pub async fn get_record(
    State(state): State<AppState>,
    Path(tx_hash): Path<String>,
) -> Result<Json<SweepRecord>, ApiError> {
    let record = SweepRepository::new(&state.store)
        .get(&tx_hash)
        .map_err(|e| match e {
            StorageError::NotFound(_) => ApiError::not_found("No ledger entry for this hash"),
            other => ApiError::internal(format!("Failed to read ledger: {other}")),
        })?;

    Ok(Json(record))
}

/// Get the on-chain confirmation status of a swept transaction.
#[utoipa::path(
    get,
    path = "/v1/sweep/records/{tx_hash}/status",
    tag = "Sweep",
    params(("tx_hash" = String, Path, description = "Transaction hash")),
    responses(
        (status = 200, description = "Confirmation status", body = TxStatusResponse),
        (status = 400, description = "Invalid transaction hash"),
        (status = 503, description = "Chain node unavailable")
    )
)]
pub async fn record_status(
    State(state): State<AppState>,
    Path(tx_hash): Path<String>,
) -> Result<Json<TxStatusResponse>, ApiError> {
    let receipt = state
        .chain
        .transaction_status(&tx_hash)
        .await
        .map_err(|e| match e {
            ChainError::Network(msg) => {
                ApiError::service_unavailable(format!("Chain node unavailable: {msg}"))
            }
            ChainError::InvalidAddress(msg) => ApiError::bad_request(msg),
            other => ApiError::internal(format!("Status query failed: {other}")),
        })?;

    Ok(Json(match receipt {
        Some(r) => TxStatusResponse {
            tx_hash,
            confirmed: true,
            block_number: Some(r.block_number),
            gas_used: Some(r.gas_used),
            success: Some(r.success),
        },
        None => TxStatusResponse {
            tx_hash,
            confirmed: false,
            block_number: None,
            gas_used: None,
            success: None,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_state;
    use crate::storage::SweepStatus;

    use axum::http::StatusCode;
    use chrono::Utc;

    fn record(user_id: &str, tx_hash: &str) -> SweepRecord {
        SweepRecord {
            user_id: user_id.to_string(),
            deposit_address: "0x1111111111111111111111111111111111111111".to_string(),
            amount_swept_wei: "580000".to_string(),
            gas_cost_wei: "420000".to_string(),
            tx_hash: tx_hash.to_string(),
            status: SweepStatus::Success,
            swept_at: Utc::now(),
            block_number: None,
            network: "sepolia".to_string(),
        }
    }

    #[tokio::test]
    async fn trigger_without_treasury_is_unavailable() {
        let (state, _dir) = test_state();
        assert!(state.scheduler.is_none());

        let err = trigger_sweep(State(state)).await.expect_err("disabled");
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn treasury_balance_without_treasury_is_unavailable() {
        let (state, _dir) = test_state();

        let err = treasury_balance(State(state))
            .await
            .expect_err("no treasury configured");
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn list_records_filters_by_user() {
        let (state, _dir) = test_state();
        let ledger = SweepRepository::new(&state.store);
        ledger.append(&record("user-1", "0xaaa")).unwrap();
        ledger.append(&record("user-2", "0xbbb")).unwrap();

        let Json(all) = list_records(
            State(state.clone()),
            Query(RecordsQuery { user_id: None }),
        )
        .await
        .unwrap();
        assert_eq!(all.total, 2);

        let Json(filtered) = list_records(
            State(state),
            Query(RecordsQuery {
                user_id: Some("user-1".into()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(filtered.total, 1);
        assert_eq!(filtered.records[0].user_id, "user-1");
    }

    #[tokio::test]
    async fn get_record_returns_not_found_for_unknown_hash() {
        let (state, _dir) = test_state();

        let err = get_record(State(state), Path("0xmissing".into()))
            .await
            .expect_err("unknown hash");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
