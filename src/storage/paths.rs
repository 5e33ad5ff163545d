// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Mintara Labs

//! Path constants and utilities for the persistent storage layout.

use std::path::{Path, PathBuf};

/// Default base directory for all persistent storage.
pub const DATA_ROOT: &str = "/data";

/// Storage path utilities for the data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all persistent data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory containing all wallet records.
    pub fn wallets_dir(&self) -> PathBuf {
        self.root.join("wallets")
    }

    /// Path to a wallet record file.
    pub fn wallet_file(&self, user_id: &str) -> PathBuf {
        self.wallets_dir().join(format!("{user_id}.json"))
    }

    /// Directory containing the sweep ledger.
    pub fn sweeps_dir(&self) -> PathBuf {
        self.root.join("sweeps")
    }

    /// Path to a sweep ledger entry, keyed by transaction hash.
    pub fn sweep_file(&self, tx_hash: &str) -> PathBuf {
        self.sweeps_dir().join(format!("{tx_hash}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_file_is_under_wallets_dir() {
        let paths = StoragePaths::new("/tmp/sweep-data");
        assert_eq!(
            paths.wallet_file("user-1"),
            PathBuf::from("/tmp/sweep-data/wallets/user-1.json")
        );
    }

    #[test]
    fn sweep_file_is_keyed_by_tx_hash() {
        let paths = StoragePaths::new("/tmp/sweep-data");
        assert_eq!(
            paths.sweep_file("0xabc"),
            PathBuf::from("/tmp/sweep-data/sweeps/0xabc.json")
        );
    }
}
