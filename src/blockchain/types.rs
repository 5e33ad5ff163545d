// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Mintara Labs

//! Blockchain types and constants.

use alloy::primitives::U256;

/// Gas limit for a plain native value transfer.
pub const TRANSFER_GAS_LIMIT: u64 = 21_000;

/// Ethereum network configuration.
#[derive(Debug, Clone, Copy)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// Default RPC endpoint URL
    pub rpc_url: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

/// Ethereum mainnet configuration.
pub const ETH_MAINNET: NetworkConfig = NetworkConfig {
    name: "mainnet",
    chain_id: 1,
    rpc_url: "https://ethereum-rpc.publicnode.com",
    explorer_url: "https://etherscan.io",
};

/// Sepolia testnet configuration.
pub const ETH_SEPOLIA: NetworkConfig = NetworkConfig {
    name: "sepolia",
    chain_id: 11_155_111,
    rpc_url: "https://ethereum-sepolia-rpc.publicnode.com",
    explorer_url: "https://sepolia.etherscan.io",
};

/// Look up a network preset by name.
pub fn network_from_name(raw: &str) -> Option<NetworkConfig> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "mainnet" => Some(ETH_MAINNET),
        "sepolia" => Some(ETH_SEPOLIA),
        _ => None,
    }
}

/// Fee parameters for a plain value transfer.
#[derive(Debug, Clone, Copy)]
pub struct FeeEstimate {
    /// Gas price ceiling in wei per gas unit.
    pub gas_price: u128,
    /// Gas limit for the transfer.
    pub gas_limit: u64,
}

impl FeeEstimate {
    /// Worst-case transfer cost in wei.
    pub fn max_cost_wei(&self) -> U256 {
        U256::from(self.gas_price) * U256::from(self.gas_limit)
    }
}

/// Broadcast result; returned as soon as the node accepts the transaction,
/// before confirmation.
#[derive(Debug, Clone)]
pub struct PendingTransfer {
    /// Transaction hash
    pub tx_hash: String,
    /// Explorer URL for the transaction
    pub explorer_url: String,
}

/// Transaction receipt after confirmation.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    /// Transaction hash
    pub tx_hash: String,
    /// Block number where the transaction was included
    pub block_number: u64,
    /// Gas actually used
    pub gas_used: u64,
    /// Whether the transaction succeeded
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_lookup_is_case_insensitive() {
        assert_eq!(network_from_name("Mainnet").unwrap().chain_id, 1);
        assert_eq!(network_from_name(" sepolia ").unwrap().chain_id, 11_155_111);
        assert!(network_from_name("goerli").is_none());
    }

    #[test]
    fn fee_estimate_max_cost() {
        let fees = FeeEstimate {
            gas_price: 20,
            gas_limit: 21_000,
        };
        assert_eq!(fees.max_cost_wei(), U256::from(420_000u64));
    }
}
