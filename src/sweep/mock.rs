// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Mintara Labs

//! In-memory `Chain` double for executor and scheduler tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::U256;
use alloy::signers::local::PrivateKeySigner;
use tokio::sync::Notify;

use crate::blockchain::{
    Chain, ChainError, FeeEstimate, PendingTransfer, TRANSFER_GAS_LIMIT,
};

/// A transfer the mock accepted.
#[derive(Debug, Clone)]
pub struct SubmittedTx {
    pub from: String,
    pub to: String,
    pub amount: U256,
    pub tx_hash: String,
}

/// Test double with per-address balances and scriptable failures.
///
/// A successful submission debits the sender by `amount + max gas cost`
/// (so a planned sweep drains the address to zero) and credits the
/// recipient, which is what makes idempotence observable in tests.
pub struct MockChain {
    gas_price: u128,
    balances: Mutex<HashMap<String, U256>>,
    fail_balance: Mutex<HashSet<String>>,
    reject_submission: AtomicBool,
    fixed_tx_hash: Mutex<Option<String>>,
    next_hash: AtomicU64,
    /// When set, `balance_of` blocks on this gate after signalling
    /// `entered_balance`; used to hold a run open mid-flight.
    balance_gate: Mutex<Option<Arc<Notify>>>,
    pub entered_balance: Notify,
    pub submitted: Mutex<Vec<SubmittedTx>>,
}

impl MockChain {
    pub fn new(gas_price: u128) -> Self {
        Self {
            gas_price,
            balances: Mutex::new(HashMap::new()),
            fail_balance: Mutex::new(HashSet::new()),
            reject_submission: AtomicBool::new(false),
            fixed_tx_hash: Mutex::new(None),
            next_hash: AtomicU64::new(1),
            balance_gate: Mutex::new(None),
            entered_balance: Notify::new(),
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn set_balance(&self, address: &str, balance: U256) {
        self.balances
            .lock()
            .unwrap()
            .insert(address.to_string(), balance);
    }

    pub fn balance(&self, address: &str) -> U256 {
        *self
            .balances
            .lock()
            .unwrap()
            .get(address)
            .unwrap_or(&U256::ZERO)
    }

    pub fn fail_balance_for(&self, address: &str) {
        self.fail_balance
            .lock()
            .unwrap()
            .insert(address.to_string());
    }

    pub fn reject_submissions(&self) {
        self.reject_submission.store(true, Ordering::SeqCst);
    }

    pub fn fix_tx_hash(&self, tx_hash: &str) {
        *self.fixed_tx_hash.lock().unwrap() = Some(tx_hash.to_string());
    }

    pub fn gate_balance_reads(&self, gate: Arc<Notify>) {
        *self.balance_gate.lock().unwrap() = Some(gate);
    }
}

impl Chain for MockChain {
    async fn balance_of(&self, address: &str) -> Result<U256, ChainError> {
        let gate = self.balance_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            self.entered_balance.notify_one();
            gate.notified().await;
        }

        if self.fail_balance.lock().unwrap().contains(address) {
            return Err(ChainError::Network("mock: node timeout".to_string()));
        }

        Ok(self.balance(address))
    }

    async fn fee_estimate(&self) -> Result<FeeEstimate, ChainError> {
        Ok(FeeEstimate {
            gas_price: self.gas_price,
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
        if self.reject_submission.load(Ordering::SeqCst) {
            return Err(ChainError::Submission(
                "mock: insufficient funds for gas".to_string(),
            ));
        }

        let from = format!("{:#x}", signer.address());
        let cost = fees.max_cost_wei();

        {
            let mut balances = self.balances.lock().unwrap();
            let current = *balances.get(&from).unwrap_or(&U256::ZERO);
            let spent = (amount + cost).min(current);
            balances.insert(from.clone(), current - spent);
            let entry = balances.entry(to.to_string()).or_insert(U256::ZERO);
            *entry += amount;
        }

        let tx_hash = self.fixed_tx_hash.lock().unwrap().clone().unwrap_or_else(|| {
            let n = self.next_hash.fetch_add(1, Ordering::SeqCst);
            format!("0x{n:064x}")
        });

        self.submitted.lock().unwrap().push(SubmittedTx {
            from,
            to: to.to_string(),
            amount,
            tx_hash: tx_hash.clone(),
        });

        Ok(PendingTransfer {
            explorer_url: format!("https://explorer.invalid/tx/{tx_hash}"),
            tx_hash,
        })
    }
}
