// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Mintara Labs

//! Ethereum client for blockchain interactions.
//!
//! The `Chain` trait is the seam between the sweep pipeline and the
//! network: the executor and scheduler are generic over it, so tests run
//! against an in-memory double while production uses `EthClient` over an
//! alloy HTTP provider.

use std::future::Future;
use std::str::FromStr;

use alloy::{
    eips::BlockNumberOrTag,
    network::{Ethereum, EthereumWallet},
    primitives::{Address, U256},
    providers::{
        fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
        Identity, Provider, ProviderBuilder, RootProvider,
    },
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
};

use super::types::{FeeEstimate, NetworkConfig, PendingTransfer, TxReceipt, TRANSFER_GAS_LIMIT};

/// HTTP provider type (with all fillers).
type HttpProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider<Ethereum>,
>;

/// Priority fee (tip) for sweep transfers, in wei per gas unit.
const PRIORITY_FEE_WEI: u128 = 1_500_000_000; // 1.5 gwei

/// Fallback base fee when the latest block carries none, in wei per gas unit.
const DEFAULT_BASE_FEE_WEI: u128 = 10_000_000_000; // 10 gwei

/// Errors that can occur during blockchain operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Node unreachable or timed out; retryable on the next run.
    #[error("network error: {0}")]
    Network(String),

    /// Broadcast rejected (insufficient gas funds, nonce conflict, node
    /// rejection); not retried within a run.
    #[error("transaction rejected: {0}")]
    Submission(String),
}

/// Blockchain operations the sweep pipeline depends on.
pub trait Chain: Send + Sync {
    /// Current confirmed native balance of `address`, in wei.
    fn balance_of(&self, address: &str) -> impl Future<Output = Result<U256, ChainError>> + Send;

    /// Current fee parameters for a plain value transfer.
    fn fee_estimate(&self) -> impl Future<Output = Result<FeeEstimate, ChainError>> + Send;

    /// Sign and broadcast a native transfer.
    ///
    /// Returns as soon as the node accepts the transaction; broadcast does
    /// not wait for confirmation. Once accepted the on-chain state change
    /// is irreversible regardless of what the caller does afterwards.
    fn submit_transfer(
        &self,
        signer: PrivateKeySigner,
        to: &str,
        amount: U256,
        fees: FeeEstimate,
    ) -> impl Future<Output = Result<PendingTransfer, ChainError>> + Send;
}

/// Ethereum JSON-RPC client.
pub struct EthClient {
    network: NetworkConfig,
    rpc_url: url::Url,
    provider: HttpProvider,
}

impl EthClient {
    /// Create a new client for the given network and RPC endpoint.
    pub fn new(network: NetworkConfig, rpc_url: &str) -> Result<Self, ChainError> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e: url::ParseError| ChainError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new().connect_http(url.clone());

        Ok(Self {
            network,
            rpc_url: url,
            provider,
        })
    }

    /// Get the network configuration.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Get the current block number.
    pub async fn block_number(&self) -> Result<u64, ChainError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| ChainError::Network(e.to_string()))
    }

    /// Get the transaction status by checking for a receipt.
    pub async fn transaction_status(
        &self,
        tx_hash: &str,
    ) -> Result<Option<TxReceipt>, ChainError> {
        let hash = tx_hash
            .parse()
            .map_err(|_| ChainError::InvalidAddress(format!("invalid tx hash: {tx_hash}")))?;

        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| ChainError::Network(e.to_string()))?;

        Ok(receipt.map(|r| TxReceipt {
            tx_hash: tx_hash.to_string(),
            block_number: r.block_number.unwrap_or(0),
            gas_used: r.gas_used as u64,
            success: r.status(),
        }))
    }

    /// Current gas price ceiling: twice the latest base fee plus the tip,
    /// so the estimate survives a base fee increase between estimation and
    /// inclusion.
    async fn gas_price(&self) -> Result<u128, ChainError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| ChainError::Network(e.to_string()))?
            .ok_or_else(|| ChainError::Network("no latest block".to_string()))?;

        let base_fee: u128 = block
            .header
            .base_fee_per_gas
            .map(|f| f as u128)
            .unwrap_or(DEFAULT_BASE_FEE_WEI);

        Ok(base_fee.saturating_mul(2).saturating_add(PRIORITY_FEE_WEI))
    }
}

impl Chain for EthClient {
    async fn balance_of(&self, address: &str) -> Result<U256, ChainError> {
        let addr = Address::from_str(address)
            .map_err(|e| ChainError::InvalidAddress(e.to_string()))?;

        self.provider
            .get_balance(addr)
            .await
            .map_err(|e| ChainError::Network(e.to_string()))
    }

    async fn fee_estimate(&self) -> Result<FeeEstimate, ChainError> {
        let gas_price = self.gas_price().await?;
        Ok(FeeEstimate {
            gas_price,
            gas_limit: TRANSFER_GAS_LIMIT,
        })
    }

    async fn submit_transfer(
        &self,
        signer: PrivateKeySigner,
        to: &str,
        amount: U256,
        fees: FeeEstimate,
    ) -> Result<PendingTransfer, ChainError> {
        let to_addr = Address::from_str(to)
            .map_err(|e| ChainError::InvalidAddress(format!("invalid to address: {e}")))?;

        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect_http(self.rpc_url.clone());

        let tx = TransactionRequest::default()
            .to(to_addr)
            .value(amount)
            .max_fee_per_gas(fees.gas_price)
            .max_priority_fee_per_gas(PRIORITY_FEE_WEI.min(fees.gas_price))
            .gas_limit(fees.gas_limit);

        let pending = provider
            .send_transaction(tx)
            .await
            .map_err(|e| ChainError::Submission(e.to_string()))?;

        let tx_hash = format!("{:?}", pending.tx_hash());
        let explorer_url = format!("{}/tx/{}", self.network.explorer_url, tx_hash);

        Ok(PendingTransfer {
            tx_hash,
            explorer_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::ETH_SEPOLIA;

    #[test]
    fn new_rejects_invalid_rpc_url() {
        let result = EthClient::new(ETH_SEPOLIA, "not a url");
        assert!(matches!(result, Err(ChainError::InvalidRpcUrl(_))));
    }

    #[test]
    fn new_accepts_valid_rpc_url() {
        let client = EthClient::new(ETH_SEPOLIA, "http://localhost:8545").unwrap();
        assert_eq!(client.network().chain_id, 11_155_111);
    }

    #[tokio::test]
    async fn balance_of_rejects_invalid_address() {
        let client = EthClient::new(ETH_SEPOLIA, "http://localhost:8545").unwrap();
        let result = client.balance_of("not-an-address").await;
        assert!(matches!(result, Err(ChainError::InvalidAddress(_))));
    }
}
