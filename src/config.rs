// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Mintara Labs

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! `Settings` struct loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for persistent storage | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `SWEEP_NETWORK` | Target network (`mainnet` or `sepolia`) | `sepolia` |
//! | `SWEEP_RPC_URL` | JSON-RPC endpoint override | Network preset URL |
//! | `TREASURY_ADDRESS` | Treasury wallet address | Unset disables sweeping |
//! | `WALLET_ENCRYPTION_SECRET` | Key-encryption secret | Insecure dev fallback |
//! | `SWEEP_INTERVAL_SECS` | Seconds between scheduled sweep runs | `180` |
//! | `SWEEP_USER_DELAY_MS` | Pause between per-user sweeps in a run | `1000` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;
use tracing::warn;

use crate::blockchain::{network_from_name, NetworkConfig, ETH_SEPOLIA};

/// Environment variable name for the persistent data directory path.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the target network (`mainnet` / `sepolia`).
pub const NETWORK_ENV: &str = "SWEEP_NETWORK";

/// Environment variable name for the JSON-RPC endpoint override.
pub const RPC_URL_ENV: &str = "SWEEP_RPC_URL";

/// Environment variable name for the treasury wallet address.
///
/// When unset the sweep scheduler is disabled entirely; the service still
/// serves wallet provisioning and ledger queries.
pub const TREASURY_ADDRESS_ENV: &str = "TREASURY_ADDRESS";

/// Environment variable name for the scheduled run interval in seconds.
pub const SWEEP_INTERVAL_ENV: &str = "SWEEP_INTERVAL_SECS";

/// Environment variable name for the inter-user delay in milliseconds.
pub const SWEEP_USER_DELAY_ENV: &str = "SWEEP_USER_DELAY_MS";

/// Default interval between scheduled sweep runs.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(180);

/// Default pause between per-user sweeps within a run, to respect node
/// rate limits.
pub const DEFAULT_USER_DELAY: Duration = Duration::from_millis(1000);

/// Runtime settings resolved from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Target network preset.
    pub network: NetworkConfig,
    /// Resolved JSON-RPC endpoint (env override or network preset).
    pub rpc_url: String,
    /// Treasury wallet address; `None` disables sweeping.
    pub treasury_address: Option<String>,
    /// Interval between scheduled sweep runs.
    pub sweep_interval: Duration,
    /// Pause between per-user sweeps within a run.
    pub user_delay: Duration,
    /// Root directory for persistent storage.
    pub data_dir: PathBuf,
    /// Server bind address.
    pub host: String,
    /// Server bind port.
    pub port: u16,
}

impl Settings {
    /// Load settings from the environment.
    ///
    /// Never fails: invalid or missing values fall back to defaults with a
    /// logged warning. A missing treasury address degrades the sweep
    /// subsystem to a no-op rather than crashing the host process.
    pub fn from_env() -> Self {
        let network = match env::var(NETWORK_ENV) {
            Ok(raw) => network_from_name(&raw).unwrap_or_else(|| {
                warn!(value = %raw, "Unknown {NETWORK_ENV}, falling back to sepolia");
                ETH_SEPOLIA
            }),
            Err(_) => ETH_SEPOLIA,
        };

        let rpc_url = env::var(RPC_URL_ENV).unwrap_or_else(|_| network.rpc_url.to_string());

        let treasury_address = match env::var(TREASURY_ADDRESS_ENV) {
            Ok(raw) => match Address::from_str(raw.trim()) {
                Ok(addr) => Some(format!("{addr:#x}")),
                Err(e) => {
                    warn!(error = %e, "Invalid {TREASURY_ADDRESS_ENV}; sweeping disabled");
                    None
                }
            },
            Err(_) => None,
        };

        let sweep_interval = env_duration_secs(SWEEP_INTERVAL_ENV, DEFAULT_SWEEP_INTERVAL);
        let user_delay = env_duration_millis(SWEEP_USER_DELAY_ENV, DEFAULT_USER_DELAY);

        let data_dir = env::var(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/data"));

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        Self {
            network,
            rpc_url,
            treasury_address,
            sweep_interval,
            user_delay,
            data_dir,
            host,
            port,
        }
    }

    /// Whether the sweep scheduler can run at all.
    pub fn sweeping_enabled(&self) -> bool {
        self.treasury_address.is_some()
    }
}

fn env_duration_secs(name: &str, default: Duration) -> Duration {
    match env::var(name) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                warn!(value = %raw, "Invalid {name}, using default");
                default
            }
        },
        Err(_) => default,
    }
}

fn env_duration_millis(name: &str, default: Duration) -> Duration {
    match env::var(name) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                warn!(value = %raw, "Invalid {name}, using default");
                default
            }
        },
        Err(_) => default,
    }
}
