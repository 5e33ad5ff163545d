// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Mintara Labs

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::blockchain::EthClient;
use crate::config::Settings;
use crate::storage::FileStore;
use crate::sweep::SweepScheduler;
use crate::vault::KeyVault;

/// Shared application state.
///
/// All components are constructed once at startup and injected; no module
/// reaches for a global.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<FileStore>,
    pub vault: Arc<KeyVault>,
    pub chain: Arc<EthClient>,
    /// `None` when no treasury address is configured: sweeping is disabled
    /// and the manual trigger reports 503.
    pub scheduler: Option<Arc<SweepScheduler<EthClient>>>,
    /// Process-wide shutdown token, shared with the scheduler loop.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        settings: Arc<Settings>,
        store: Arc<FileStore>,
        vault: Arc<KeyVault>,
        chain: Arc<EthClient>,
        scheduler: Option<Arc<SweepScheduler<EthClient>>>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            settings,
            store,
            vault,
            chain,
            scheduler,
            shutdown,
        }
    }
}
