// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Mintara Labs

//! Typed repositories over the JSON file store.

pub mod sweeps;
pub mod wallets;

pub use sweeps::{SweepRecord, SweepRepository, SweepStatus};
pub use wallets::{UserWallet, WalletRepository, WalletView};
