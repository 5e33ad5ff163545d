// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Mintara Labs

//! Wallet provisioning and deposit-address queries.
//!
//! Provisioning is the only place a deposit key pair is created; the
//! marketplace calls it once per user at signup. Responses never carry key
//! material.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    blockchain::{Chain, ChainError},
    error::ApiError,
    state::AppState,
    storage::{StorageError, UserWallet, WalletRepository, WalletView},
};

/// Request to provision a wallet for a marketplace user.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateWalletRequest {
    /// Marketplace user ID.
    pub user_id: String,
}

/// On-chain balance of a deposit address.
#[derive(Debug, Serialize, ToSchema)]
pub struct DepositBalanceResponse {
    /// Marketplace user ID.
    pub user_id: String,
    /// Deposit address queried.
    pub deposit_address: String,
    /// Confirmed on-chain balance in wei, decimal string.
    pub balance_wei: String,
    /// Network queried.
    pub network: String,
}

/// Provision a deposit wallet for a user.
///
/// Generates a fresh key pair, encrypts the private key at rest and
/// persists the wallet record. Idempotency: provisioning the same user
/// twice is a conflict; the existing wallet is never overwritten.
#[utoipa::path(
    post,
    path = "/v1/wallets",
    tag = "Wallets",
    request_body = CreateWalletRequest,
    responses(
        (status = 201, description = "Wallet provisioned", body = WalletView),
        (status = 400, description = "Invalid user ID"),
        (status = 409, description = "Wallet already provisioned")
    )
)]
pub async fn create_wallet(
    State(state): State<AppState>,
    Json(request): Json<CreateWalletRequest>,
) -> Result<(StatusCode, Json<WalletView>), ApiError> {
    let user_id = request.user_id.trim();
    if user_id.is_empty() || user_id.contains(['/', '\\', '.']) {
        return Err(ApiError::bad_request("Invalid user ID"));
    }

    let repo = WalletRepository::new(&state.store);
    if repo.exists(user_id) {
        return Err(ApiError::conflict("Wallet already provisioned"));
    }

    let provisioned = state
        .vault
        .generate()
        .map_err(|e| ApiError::internal(format!("Key generation failed: {e}")))?;

    let wallet = UserWallet::new(
        user_id,
        provisioned.address,
        provisioned.encrypted_private_key,
    );

    repo.create(&wallet).map_err(|e| match e {
        StorageError::AlreadyExists(_) => ApiError::conflict("Wallet already provisioned"),
        other => ApiError::internal(format!("Failed to persist wallet: {other}")),
    })?;

    tracing::info!(user_id = %wallet.user_id, address = ?wallet.deposit_address, "Wallet provisioned");

    Ok((StatusCode::CREATED, Json(wallet.into())))
}

/// Get a wallet record (custodial balance and sweep audit fields).
#[utoipa::path(
    get,
    path = "/v1/wallets/{user_id}",
    tag = "Wallets",
    params(("user_id" = String, Path, description = "Marketplace user ID")),
    responses(
        (status = 200, description = "Wallet found", body = WalletView),
        (status = 404, description = "Wallet not found")
    )
)]
pub async fn get_wallet(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<WalletView>, ApiError> {
    let wallet = WalletRepository::new(&state.store)
        .get(&user_id)
        .map_err(|e| match e {
            StorageError::NotFound(_) => ApiError::not_found("Wallet not found"),
            other => ApiError::internal(format!("Failed to read wallet: {other}")),
        })?;

    Ok(Json(wallet.into()))
}

/// Get the current on-chain balance of a user's deposit address.
///
/// Dashboard query; delegates to the chain client.
#[utoipa::path(
    get,
    path = "/v1/wallets/{user_id}/balance",
    tag = "Wallets",
    params(("user_id" = String, Path, description = "Marketplace user ID")),
    responses(
        (status = 200, description = "Balance retrieved", body = DepositBalanceResponse),
        (status = 404, description = "Wallet not found or not provisioned"),
        (status = 503, description = "Chain node unavailable")
    )
)]
pub async fn deposit_balance(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DepositBalanceResponse>, ApiError> {
    let wallet = WalletRepository::new(&state.store)
        .get(&user_id)
        .map_err(|e| match e {
            StorageError::NotFound(_) => ApiError::not_found("Wallet not found"),
            other => ApiError::internal(format!("Failed to read wallet: {other}")),
        })?;

    let deposit_address = wallet
        .deposit_address
        .ok_or_else(|| ApiError::not_found("Wallet has no deposit address"))?;

    let balance = state
        .chain
        .balance_of(&deposit_address)
        .await
        .map_err(|e| match e {
            ChainError::Network(msg) => {
                ApiError::service_unavailable(format!("Chain node unavailable: {msg}"))
            }
            other => ApiError::internal(format!("Balance query failed: {other}")),
        })?;

    Ok(Json(DepositBalanceResponse {
        user_id,
        deposit_address,
        balance_wei: balance.to_string(),
        network: state.chain.network().name.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_state;

    #[tokio::test]
    async fn create_wallet_provisions_and_returns_view() {
        let (state, _dir) = test_state();

        let (status, Json(view)) = create_wallet(
            State(state.clone()),
            Json(CreateWalletRequest {
                user_id: "user-1".into(),
            }),
        )
        .await
        .expect("provisioning succeeds");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(view.user_id, "user-1");
        assert!(view.deposit_address.as_deref().unwrap().starts_with("0x"));
        assert_eq!(view.internal_balance_wei, "0");

        // Key material is persisted encrypted, but never serialized out
        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("ciphertext"));

        let stored = WalletRepository::new(&state.store).get("user-1").unwrap();
        assert!(stored.encrypted_private_key.is_some());
    }

    #[tokio::test]
    async fn create_wallet_twice_conflicts() {
        let (state, _dir) = test_state();
        let request = CreateWalletRequest {
            user_id: "user-1".into(),
        };

        create_wallet(State(state.clone()), Json(request.clone()))
            .await
            .expect("first provisioning succeeds");

        let err = create_wallet(State(state.clone()), Json(request))
            .await
            .expect_err("second provisioning conflicts");
        assert_eq!(err.status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn create_wallet_rejects_path_like_user_ids() {
        let (state, _dir) = test_state();

        for bad in ["", "  ", "../escape", "a/b", "dot.dot"] {
            let err = create_wallet(
                State(state.clone()),
                Json(CreateWalletRequest {
                    user_id: bad.into(),
                }),
            )
            .await
            .expect_err("invalid user id rejected");
            assert_eq!(err.status, StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn get_wallet_returns_not_found_for_unknown_user() {
        let (state, _dir) = test_state();

        let err = get_wallet(State(state), Path("ghost".into()))
            .await
            .expect_err("unknown wallet");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
