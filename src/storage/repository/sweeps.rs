// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Mintara Labs

//! Append-only sweep ledger.
//!
//! One JSON record per on-chain transaction under `sweeps/{tx_hash}.json`.
//! Entries are created once, on a successful broadcast, and never updated
//! or deleted. Keying records by transaction hash and writing them with
//! create-new semantics gives at-most-one ledger row per transaction,
//! which is the guard against double-crediting a custodial balance when a
//! run is retried after a crash mid-confirmation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{FileStore, StorageError, StorageResult};

/// Outcome status carried by a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SweepStatus {
    Success,
    Failed,
    Pending,
}

/// One ledger entry per swept transaction.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SweepRecord {
    /// Marketplace user whose deposit was swept.
    pub user_id: String,
    /// Deposit address the funds left.
    pub deposit_address: String,
    /// Amount moved to the treasury, in wei.
    pub amount_swept_wei: String,
    /// Gas budget reserved for the transfer, in wei.
    pub gas_cost_wei: String,
    /// On-chain transaction hash; unique across the ledger.
    pub tx_hash: String,
    /// Entry status; successful broadcasts write `success`.
    pub status: SweepStatus,
    /// When the sweep was recorded.
    pub swept_at: DateTime<Utc>,
    /// Block the transaction was included in, once known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Network the sweep ran against.
    pub network: String,
}

/// Repository for the append-only sweep ledger.
pub struct SweepRepository<'a> {
    store: &'a FileStore,
}

impl<'a> SweepRepository<'a> {
    /// Create a new SweepRepository.
    pub fn new(store: &'a FileStore) -> Self {
        Self { store }
    }

    /// Append a ledger entry.
    ///
    /// Fails with `StorageError::AlreadyExists` when an entry for the same
    /// transaction hash is already present; the existing entry is left
    /// untouched.
    pub fn append(&self, record: &SweepRecord) -> StorageResult<()> {
        self.store
            .create_json(self.store.paths().sweep_file(&record.tx_hash), record)
            .map_err(|e| match e {
                StorageError::AlreadyExists(_) => {
                    StorageError::AlreadyExists(format!("Sweep record {}", record.tx_hash))
                }
                other => other,
            })
    }

    /// Get a ledger entry by transaction hash.
    pub fn get(&self, tx_hash: &str) -> StorageResult<SweepRecord> {
        let path = self.store.paths().sweep_file(tx_hash);
        if !self.store.exists(&path) {
            return Err(StorageError::NotFound(format!("Sweep record {tx_hash}")));
        }
        self.store.read_json(path)
    }

    /// List all ledger entries, most recent first.
    pub fn list(&self) -> StorageResult<Vec<SweepRecord>> {
        let hashes = self
            .store
            .list_files(self.store.paths().sweeps_dir(), "json")?;

        let mut records = Vec::new();
        for tx_hash in &hashes {
            match self.get(tx_hash) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(tx_hash = %tx_hash, error = %e, "Skipping unreadable ledger entry");
                }
            }
        }

        records.sort_by(|a, b| b.swept_at.cmp(&a.swept_at));
        Ok(records)
    }

    /// List all ledger entries for one user, most recent first.
    pub fn list_by_user(&self, user_id: &str) -> StorageResult<Vec<SweepRecord>> {
        let mut records = self.list()?;
        records.retain(|r| r.user_id == user_id);
        Ok(records)
    }
}
