// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Mintara Labs

//! Wallet repository.
//!
//! One JSON record per marketplace user under `wallets/{user_id}.json`.
//! The private key is embedded as AES-256-GCM ciphertext and is never
//! serialized into API responses.
//!
//! A wallet is *sweepable* once both the deposit address and the encrypted
//! private key are present; both come from the same key pair at
//! provisioning time and are never rotated independently.

use alloy::primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{FileStore, StorageError, StorageResult};
use crate::vault::EncryptedKey;

/// Persisted wallet record for one marketplace user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserWallet {
    /// Marketplace user ID that owns this wallet.
    pub user_id: String,
    /// Deposit address, generated once and immutable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit_address: Option<String>,
    /// Private key ciphertext; plaintext never persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_private_key: Option<EncryptedKey>,
    /// Custodial ledger balance in wei, decimal string.
    pub internal_balance_wei: String,
    /// When the last successful sweep happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_swept_at: Option<DateTime<Utc>>,
    /// Amount moved by the last successful sweep, in wei.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sweep_amount_wei: Option<String>,
    /// Transaction hash of the last successful sweep.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sweep_tx_hash: Option<String>,
    /// When the wallet was created.
    pub created_at: DateTime<Utc>,
}

impl UserWallet {
    /// Fresh wallet with a zero custodial balance.
    pub fn new(user_id: impl Into<String>, address: String, key: EncryptedKey) -> Self {
        Self {
            user_id: user_id.into(),
            deposit_address: Some(address),
            encrypted_private_key: Some(key),
            internal_balance_wei: U256::ZERO.to_string(),
            last_swept_at: None,
            last_sweep_amount_wei: None,
            last_sweep_tx_hash: None,
            created_at: Utc::now(),
        }
    }

    /// Parse the custodial balance.
    pub fn internal_balance(&self) -> StorageResult<U256> {
        self.internal_balance_wei.parse::<U256>().map_err(|e| {
            StorageError::Corrupt(format!(
                "wallet {} has unparseable balance: {e}",
                self.user_id
            ))
        })
    }

    /// Whether this wallet can be swept: deposit address and encrypted key
    /// both present.
    pub fn is_sweepable(&self) -> bool {
        self.deposit_address.is_some() && self.encrypted_private_key.is_some()
    }
}

/// Wallet as returned to API clients (never includes key material).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletView {
    /// Marketplace user ID.
    pub user_id: String,
    /// Deposit address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deposit_address: Option<String>,
    /// Custodial ledger balance in wei, decimal string.
    pub internal_balance_wei: String,
    /// When the last successful sweep happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_swept_at: Option<DateTime<Utc>>,
    /// Amount moved by the last successful sweep, in wei.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sweep_amount_wei: Option<String>,
    /// Transaction hash of the last successful sweep.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sweep_tx_hash: Option<String>,
    /// When the wallet was created.
    pub created_at: DateTime<Utc>,
}

impl From<UserWallet> for WalletView {
    fn from(wallet: UserWallet) -> Self {
        Self {
            user_id: wallet.user_id,
            deposit_address: wallet.deposit_address,
            internal_balance_wei: wallet.internal_balance_wei,
            last_swept_at: wallet.last_swept_at,
            last_sweep_amount_wei: wallet.last_sweep_amount_wei,
            last_sweep_tx_hash: wallet.last_sweep_tx_hash,
            created_at: wallet.created_at,
        }
    }
}

/// Repository for wallet records.
pub struct WalletRepository<'a> {
    store: &'a FileStore,
}

impl<'a> WalletRepository<'a> {
    /// Create a new WalletRepository.
    pub fn new(store: &'a FileStore) -> Self {
        Self { store }
    }

    /// Check if a wallet exists for a user.
    pub fn exists(&self, user_id: &str) -> bool {
        self.store.exists(self.store.paths().wallet_file(user_id))
    }

    /// Get a wallet by user ID.
    pub fn get(&self, user_id: &str) -> StorageResult<UserWallet> {
        let path = self.store.paths().wallet_file(user_id);
        if !self.store.exists(&path) {
            return Err(StorageError::NotFound(format!("Wallet for {user_id}")));
        }
        self.store.read_json(path)
    }

    /// Create a new wallet record.
    pub fn create(&self, wallet: &UserWallet) -> StorageResult<()> {
        if self.exists(&wallet.user_id) {
            return Err(StorageError::AlreadyExists(format!(
                "Wallet for {}",
                wallet.user_id
            )));
        }

        self.store
            .write_json(self.store.paths().wallet_file(&wallet.user_id), wallet)
    }

    /// Overwrite an existing wallet record.
    pub fn update(&self, wallet: &UserWallet) -> StorageResult<()> {
        if !self.exists(&wallet.user_id) {
            return Err(StorageError::NotFound(format!(
                "Wallet for {}",
                wallet.user_id
            )));
        }

        self.store
            .write_json(self.store.paths().wallet_file(&wallet.user_id), wallet)
    }

    /// List all user IDs with a wallet record.
    pub fn list_ids(&self) -> StorageResult<Vec<String>> {
        self.store
            .list_files(self.store.paths().wallets_dir(), "json")
    }

    /// Load all wallets eligible for sweeping.
    ///
    /// Records that fail to parse are skipped with a warning rather than
    /// failing the whole listing; one bad record must not stop a run.
    pub fn list_sweepable(&self) -> StorageResult<Vec<UserWallet>> {
        let ids = self.list_ids()?;
        let mut wallets = Vec::new();

        for user_id in &ids {
            match self.get(user_id) {
                Ok(wallet) if wallet.is_sweepable() => wallets.push(wallet),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(user_id = %user_id, error = %e, "Skipping unreadable wallet record");
                }
            }
        }

        Ok(wallets)
    }

    /// Credit a confirmed sweep to the custodial balance and stamp the
    /// audit fields. The only writer of `last_swept_*`; the sweep subsystem
    /// never decrements the balance.
    pub fn record_sweep(
        &self,
        user_id: &str,
        amount: U256,
        tx_hash: &str,
        swept_at: DateTime<Utc>,
    ) -> StorageResult<UserWallet> {
        let mut wallet = self.get(user_id)?;

        let balance = wallet.internal_balance()?;
        wallet.internal_balance_wei = (balance + amount).to_string();
        wallet.last_swept_at = Some(swept_at);
        wallet.last_sweep_amount_wei = Some(amount.to_string());
        wallet.last_sweep_tx_hash = Some(tx_hash.to_string());

        self.update(&wallet)?;
        Ok(wallet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;
    use crate::vault::KeyVault;

    fn test_store() -> (FileStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut store = FileStore::new(StoragePaths::new(dir.path()));
        store.initialize().expect("initialize test store");
        (store, dir)
    }

    fn provisioned_wallet(user_id: &str) -> UserWallet {
        let vault = KeyVault::new("test-secret");
        let key = vault.generate().unwrap();
        UserWallet::new(user_id, key.address, key.encrypted_private_key)
    }

    #[test]
    fn create_and_get_wallet() {
        let (store, _dir) = test_store();
        let repo = WalletRepository::new(&store);

        let wallet = provisioned_wallet("user-1");
        repo.create(&wallet).unwrap();

        let loaded = repo.get("user-1").unwrap();
        assert_eq!(loaded.user_id, "user-1");
        assert_eq!(loaded.deposit_address, wallet.deposit_address);
        assert_eq!(loaded.internal_balance_wei, "0");
    }

    #[test]
    fn create_duplicate_fails() {
        let (store, _dir) = test_store();
        let repo = WalletRepository::new(&store);

        let wallet = provisioned_wallet("user-1");
        repo.create(&wallet).unwrap();

        let result = repo.create(&wallet);
        assert!(matches!(result, Err(StorageError::AlreadyExists(_))));
    }

    #[test]
    fn list_sweepable_filters_unprovisioned() {
        let (store, _dir) = test_store();
        let repo = WalletRepository::new(&store);

        repo.create(&provisioned_wallet("user-1")).unwrap();
        repo.create(&provisioned_wallet("user-2")).unwrap();

        // Account without wallet provisioning
        let mut bare = provisioned_wallet("user-3");
        bare.deposit_address = None;
        bare.encrypted_private_key = None;
        repo.create(&bare).unwrap();

        let sweepable = repo.list_sweepable().unwrap();
        let ids: Vec<_> = sweepable.iter().map(|w| w.user_id.as_str()).collect();
        assert_eq!(ids, vec!["user-1", "user-2"]);
    }

    #[test]
    fn record_sweep_credits_balance_and_audit_fields() {
        let (store, _dir) = test_store();
        let repo = WalletRepository::new(&store);

        repo.create(&provisioned_wallet("user-1")).unwrap();

        let now = Utc::now();
        let amount = U256::from(580_000u64);
        let updated = repo.record_sweep("user-1", amount, "0xhash1", now).unwrap();

        assert_eq!(updated.internal_balance_wei, "580000");
        assert_eq!(updated.last_sweep_amount_wei.as_deref(), Some("580000"));
        assert_eq!(updated.last_sweep_tx_hash.as_deref(), Some("0xhash1"));
        assert_eq!(updated.last_swept_at, Some(now));

        // Second sweep accumulates
        let updated = repo
            .record_sweep("user-1", U256::from(20u64), "0xhash2", now)
            .unwrap();
        assert_eq!(updated.internal_balance_wei, "580020");
    }

    #[test]
    fn record_sweep_handles_wei_scale_values() {
        let (store, _dir) = test_store();
        let repo = WalletRepository::new(&store);

        repo.create(&provisioned_wallet("whale")).unwrap();

        // 5000 ETH in wei, far beyond u64
        let amount = U256::from(5000u64) * U256::from(10u64).pow(U256::from(18u64));
        let updated = repo
            .record_sweep("whale", amount, "0xbig", Utc::now())
            .unwrap();

        assert_eq!(
            updated.internal_balance_wei,
            "5000000000000000000000"
        );
        assert_eq!(updated.internal_balance().unwrap(), amount);
    }

    #[test]
    fn wallet_view_excludes_key_material() {
        let wallet = provisioned_wallet("user-1");
        let view: WalletView = wallet.clone().into();

        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("ciphertext_b64"));
        assert!(!json.contains("encrypted_private_key"));
        assert_eq!(view.deposit_address, wallet.deposit_address);
    }
}
