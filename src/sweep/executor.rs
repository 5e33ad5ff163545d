// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Mintara Labs

//! Per-user sweep execution.
//!
//! One `sweep_wallet` call runs the full pipeline for one user: read the
//! deposit balance, plan, decrypt the key, broadcast the transfer to the
//! treasury and record the result. Every error is converted into a
//! `SweepOutcome` at this boundary so one user can never abort a batch.
//!
//! ## Crash window
//!
//! The broadcast is irreversible; the ledger append and balance credit are
//! not. If the process dies between the two, the chain is ahead of the
//! ledger. The next run's planning pass sees the drained deposit balance
//! and skips, so the pipeline converges, but the missing custodial credit
//! is a known reconciliation gap that is not auto-repaired.

use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use chrono::Utc;

use crate::blockchain::{Chain, ChainError};
use crate::storage::{
    FileStore, StorageError, SweepRecord, SweepRepository, SweepStatus, UserWallet,
    WalletRepository,
};
use crate::sweep::planner::{plan, SkipReason, SweepDecision};
use crate::vault::{KeyVault, VaultError};

/// Result of one per-user sweep attempt.
#[derive(Debug, Clone)]
pub enum SweepOutcome {
    /// Transfer broadcast and recorded.
    Swept {
        amount: U256,
        gas_cost: U256,
        tx_hash: String,
    },
    /// Nothing to do this run; re-evaluated next run.
    Skipped { reason: SkipReason },
    /// Attempt failed; the batch continues with the next user.
    Failed { reason: String },
}

/// Internal error type; converted to `SweepOutcome::Failed` at the
/// `sweep_wallet` boundary.
#[derive(Debug, thiserror::Error)]
enum SweepError {
    #[error("wallet is not provisioned for sweeping")]
    NotProvisioned,

    #[error("stored deposit address is invalid: {0}")]
    InvalidDepositAddress(String),

    /// Stored key and deposit address do not belong to the same key pair.
    #[error("decrypted key does not match the deposit address")]
    KeyAddressMismatch,

    /// Broadcast happened but an entry for this hash already exists; the
    /// custodial balance is not credited a second time.
    #[error("ledger entry already exists for transaction {0}")]
    DuplicateLedgerEntry(String),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Executes the sweep pipeline for single wallets.
pub struct SweepExecutor<C: Chain> {
    chain: Arc<C>,
    vault: Arc<KeyVault>,
    store: Arc<FileStore>,
    treasury_address: String,
    network_name: String,
}

impl<C: Chain> SweepExecutor<C> {
    pub fn new(
        chain: Arc<C>,
        vault: Arc<KeyVault>,
        store: Arc<FileStore>,
        treasury_address: String,
        network_name: String,
    ) -> Self {
        Self {
            chain,
            vault,
            store,
            treasury_address,
            network_name,
        }
    }

    /// Run one sweep attempt for one wallet.
    ///
    /// Never panics and never propagates an error: every failure is
    /// reported as `SweepOutcome::Failed` so the caller's batch isolation
    /// holds.
    pub async fn sweep_wallet(&self, wallet: &UserWallet) -> SweepOutcome {
        match self.try_sweep(wallet).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(user_id = %wallet.user_id, error = %e, "Sweep attempt failed");
                SweepOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn try_sweep(&self, wallet: &UserWallet) -> Result<SweepOutcome, SweepError> {
        let (address, encrypted) = match (&wallet.deposit_address, &wallet.encrypted_private_key) {
            (Some(address), Some(encrypted)) => (address.as_str(), encrypted),
            _ => return Err(SweepError::NotProvisioned),
        };

        let balance = self.chain.balance_of(address).await?;
        let fees = self.chain.fee_estimate().await?;

        let (amount, gas_cost) = match plan(balance, fees) {
            SweepDecision::Skip(reason) => {
                tracing::debug!(
                    user_id = %wallet.user_id,
                    balance_wei = %balance,
                    %reason,
                    "Sweep skipped"
                );
                return Ok(SweepOutcome::Skipped { reason });
            }
            SweepDecision::Sweep { amount, gas_cost } => (amount, gas_cost),
        };

        let signer = self.vault.signer(encrypted)?;
        let expected = Address::from_str(address)
            .map_err(|e| SweepError::InvalidDepositAddress(e.to_string()))?;
        if signer.address() != expected {
            return Err(SweepError::KeyAddressMismatch);
        }

        let pending = self
            .chain
            .submit_transfer(signer, &self.treasury_address, amount, fees)
            .await?;

        let swept_at = Utc::now();
        let record = SweepRecord {
            user_id: wallet.user_id.clone(),
            deposit_address: address.to_string(),
            amount_swept_wei: amount.to_string(),
            gas_cost_wei: gas_cost.to_string(),
            tx_hash: pending.tx_hash.clone(),
            status: SweepStatus::Success,
            swept_at,
            block_number: None,
            network: self.network_name.clone(),
        };

        let ledger = SweepRepository::new(&self.store);
        match ledger.append(&record) {
            Ok(()) => {}
            Err(StorageError::AlreadyExists(_)) => {
                return Err(SweepError::DuplicateLedgerEntry(pending.tx_hash));
            }
            Err(e) => return Err(e.into()),
        }

        WalletRepository::new(&self.store).record_sweep(
            &wallet.user_id,
            amount,
            &pending.tx_hash,
            swept_at,
        )?;

        tracing::info!(
            user_id = %wallet.user_id,
            tx_hash = %pending.tx_hash,
            amount_wei = %amount,
            gas_cost_wei = %gas_cost,
            "Sweep broadcast and recorded"
        );

        Ok(SweepOutcome::Swept {
            amount,
            gas_cost,
            tx_hash: pending.tx_hash,
        })
    }
}
