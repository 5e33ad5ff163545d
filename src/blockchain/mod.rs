// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Mintara Labs

//! Ethereum JSON-RPC integration (alloy).

pub mod client;
pub mod types;

pub use client::{Chain, ChainError, EthClient};
pub use types::{
    network_from_name, FeeEstimate, NetworkConfig, PendingTransfer, TxReceipt, ETH_MAINNET,
    ETH_SEPOLIA, TRANSFER_GAS_LIMIT,
};
