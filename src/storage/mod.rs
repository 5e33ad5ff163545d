// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Mintara Labs

//! # Persistent Storage Module
//!
//! JSON-file persistence for custodial wallet records and the append-only
//! sweep ledger. All data lives under the configured data directory.
//!
//! ## Storage Layout
//!
//! ```text
//! /data/
//!   wallets/
//!     {user_id}.json    # Wallet record (encrypted key, custodial balance)
//!   sweeps/
//!     {tx_hash}.json    # Append-only ledger entry, one per transaction
//! ```
//!
//! Private keys are stored only as AES-256-GCM ciphertext inside the wallet
//! record; plaintext key material never touches disk.
//!
//! The one-file-per-transaction-hash layout makes ledger uniqueness a
//! filesystem property: a second append with the same hash fails with
//! `StorageError::AlreadyExists`.

pub mod fs;
pub mod paths;
pub mod repository;

pub use fs::{FileStore, StorageError, StorageResult};
pub use paths::StoragePaths;
pub use repository::{
    SweepRecord, SweepRepository, SweepStatus, UserWallet, WalletRepository, WalletView,
};
