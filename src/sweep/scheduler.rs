// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Mintara Labs

//! # Sweep Scheduler
//!
//! Background task that periodically sweeps every provisioned deposit
//! address into the treasury.
//!
//! ## Strategy
//!
//! Every `interval` (default 3 min) the scheduler:
//! 1. Loads all wallets with a deposit address and an encrypted key.
//! 2. Invokes the executor per wallet, sequentially, pausing `user_delay`
//!    between wallets to respect node rate limits.
//! 3. Aggregates per-user outcomes into a `RunSummary`.
//!
//! One failing user never stops a run. The scheduled tick and the manual
//! trigger share `run_once`, guarded by a run lock: at most one sweep run
//! (and therefore at most one sweep attempt per address) is in flight at
//! any time. The loser of the lock gets `SweepRunError::AlreadyRunning`
//! instead of a second concurrent run.
//!
//! ## Shutdown
//!
//! Uses `tokio_util::sync::CancellationToken` for graceful shutdown. The
//! token is also checked between per-user iterations, so shutdown stops a
//! batch between users rather than leaving one user's sweep half-applied.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::blockchain::Chain;
use crate::storage::{FileStore, StorageError, WalletRepository};
use crate::sweep::executor::{SweepExecutor, SweepOutcome};
use crate::sweep::planner::SkipReason;

/// Errors surfaced to the trigger caller; per-user failures are inside the
/// summary instead.
#[derive(Debug, thiserror::Error)]
pub enum SweepRunError {
    #[error("a sweep run is already in progress")]
    AlreadyRunning,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// One swept wallet in a run summary.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SweptEntry {
    pub user_id: String,
    pub amount_wei: String,
    pub gas_cost_wei: String,
    pub tx_hash: String,
}

/// One skipped wallet in a run summary.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SkippedEntry {
    pub user_id: String,
    pub reason: SkipReason,
}

/// One failed wallet in a run summary.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FailedEntry {
    pub user_id: String,
    pub reason: String,
}

/// Aggregated outcome of one sweep run.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub swept: Vec<SweptEntry>,
    pub skipped: Vec<SkippedEntry>,
    pub failed: Vec<FailedEntry>,
}

/// Periodic sweep driver with single-flight discipline.
pub struct SweepScheduler<C: Chain> {
    store: Arc<FileStore>,
    executor: SweepExecutor<C>,
    interval: Duration,
    user_delay: Duration,
    run_lock: tokio::sync::Mutex<()>,
}

impl<C: Chain> SweepScheduler<C> {
    pub fn new(
        store: Arc<FileStore>,
        executor: SweepExecutor<C>,
        interval: Duration,
        user_delay: Duration,
    ) -> Self {
        Self {
            store,
            executor,
            interval,
            user_delay,
            run_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Run the scheduler loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(scheduler.clone().run(shutdown.clone()));
    /// ```
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            user_delay_ms = self.user_delay.as_millis() as u64,
            "Sweep scheduler starting"
        );

        loop {
            if shutdown.is_cancelled() {
                info!("Sweep scheduler shutting down");
                return;
            }

            match self.run_once(&shutdown).await {
                Ok(_) => {}
                Err(SweepRunError::AlreadyRunning) => {
                    warn!("Previous sweep run still in progress, skipping this tick");
                }
                Err(e) => {
                    warn!(error = %e, "Sweep run failed, will retry next tick");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Sweep scheduler shutting down");
                    return;
                }
            }
        }
    }

    /// Execute one sweep run.
    ///
    /// Shared by the scheduled tick and the manual trigger; both pass
    /// through the same run lock, so overlapping invocations serialize and
    /// the loser reports `AlreadyRunning`.
    pub async fn run_once(
        &self,
        shutdown: &CancellationToken,
    ) -> Result<RunSummary, SweepRunError> {
        let _guard = self
            .run_lock
            .try_lock()
            .map_err(|_| SweepRunError::AlreadyRunning)?;

        self.sweep_all(shutdown).await
    }

    async fn sweep_all(&self, shutdown: &CancellationToken) -> Result<RunSummary, SweepRunError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let started = Instant::now();

        let wallets = WalletRepository::new(&self.store).list_sweepable()?;
        info!(run_id = %run_id, wallets = wallets.len(), "Sweep run starting");

        let mut summary = RunSummary {
            run_id,
            started_at,
            duration_ms: 0,
            swept: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        };

        for (i, wallet) in wallets.iter().enumerate() {
            if shutdown.is_cancelled() {
                warn!(
                    run_id = %run_id,
                    remaining = wallets.len() - i,
                    "Sweep run cancelled between users"
                );
                break;
            }

            if i > 0 {
                tokio::select! {
                    _ = tokio::time::sleep(self.user_delay) => {},
                    _ = shutdown.cancelled() => {
                        warn!(
                            run_id = %run_id,
                            remaining = wallets.len() - i,
                            "Sweep run cancelled between users"
                        );
                        break;
                    }
                }
            }

            match self.executor.sweep_wallet(wallet).await {
                SweepOutcome::Swept {
                    amount,
                    gas_cost,
                    tx_hash,
                } => summary.swept.push(SweptEntry {
                    user_id: wallet.user_id.clone(),
                    amount_wei: amount.to_string(),
                    gas_cost_wei: gas_cost.to_string(),
                    tx_hash,
                }),
                SweepOutcome::Skipped { reason } => summary.skipped.push(SkippedEntry {
                    user_id: wallet.user_id.clone(),
                    reason,
                }),
                SweepOutcome::Failed { reason } => summary.failed.push(FailedEntry {
                    user_id: wallet.user_id.clone(),
                    reason,
                }),
            }
        }

        summary.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            swept = summary.swept.len(),
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            duration_ms = summary.duration_ms,
            "Sweep run complete"
        );

        Ok(summary)
    }
}
