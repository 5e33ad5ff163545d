// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Mintara Labs

//! Sweep planning: decide whether a deposit balance is worth moving.
//!
//! Pure decision logic, no I/O. There is deliberately no minimum sweep
//! threshold: any balance that can at least cover its own transfer gas is
//! swept, trading more frequent small transactions for maximal
//! consolidation of custodial funds.

use alloy::primitives::U256;
use serde::Serialize;
use utoipa::ToSchema;

use crate::blockchain::FeeEstimate;

/// Why a wallet was skipped this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Nothing to move.
    EmptyBalance,
    /// Balance cannot cover its own transfer gas. Funds stay stranded at
    /// the deposit address until the balance grows or gas drops; the
    /// wallet is re-evaluated every run.
    BelowGasCost,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::EmptyBalance => write!(f, "empty balance"),
            SkipReason::BelowGasCost => write!(f, "balance below gas cost"),
        }
    }
}

/// Outcome of planning one wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepDecision {
    /// Leave the balance where it is.
    Skip(SkipReason),
    /// Transfer `amount` to the treasury, reserving `gas_cost` for gas.
    Sweep { amount: U256, gas_cost: U256 },
}

/// Decide whether `balance` should be swept under the given fees.
///
/// `amount` is exactly `balance - gas_price * gas_limit`; integer wei
/// arithmetic, no rounding.
pub fn plan(balance: U256, fees: FeeEstimate) -> SweepDecision {
    let gas_cost = fees.max_cost_wei();

    if balance.is_zero() {
        return SweepDecision::Skip(SkipReason::EmptyBalance);
    }

    if balance <= gas_cost {
        return SweepDecision::Skip(SkipReason::BelowGasCost);
    }

    SweepDecision::Sweep {
        amount: balance - gas_cost,
        gas_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fees(gas_price: u128, gas_limit: u64) -> FeeEstimate {
        FeeEstimate {
            gas_price,
            gas_limit,
        }
    }

    #[test]
    fn sweeps_balance_above_gas_cost() {
        // balance 1_000_000, cost 20 * 21_000 = 420_000
        let decision = plan(U256::from(1_000_000u64), fees(20, 21_000));
        assert_eq!(
            decision,
            SweepDecision::Sweep {
                amount: U256::from(580_000u64),
                gas_cost: U256::from(420_000u64),
            }
        );
    }

    #[test]
    fn skips_balance_below_gas_cost() {
        // balance 400_000 < cost 420_000
        let decision = plan(U256::from(400_000u64), fees(20, 21_000));
        assert_eq!(decision, SweepDecision::Skip(SkipReason::BelowGasCost));
    }

    #[test]
    fn skips_empty_balance() {
        let decision = plan(U256::ZERO, fees(20, 21_000));
        assert_eq!(decision, SweepDecision::Skip(SkipReason::EmptyBalance));
    }

    #[test]
    fn skips_balance_exactly_at_gas_cost() {
        // balance - cost == 0 is a skip, not a zero-value sweep
        let decision = plan(U256::from(420_000u64), fees(20, 21_000));
        assert_eq!(decision, SweepDecision::Skip(SkipReason::BelowGasCost));
    }

    #[test]
    fn sweeps_one_wei_above_gas_cost() {
        let decision = plan(U256::from(420_001u64), fees(20, 21_000));
        assert_eq!(
            decision,
            SweepDecision::Sweep {
                amount: U256::from(1u64),
                gas_cost: U256::from(420_000u64),
            }
        );
    }

    #[test]
    fn free_gas_sweeps_whole_balance() {
        let decision = plan(U256::from(1_000u64), fees(0, 21_000));
        assert_eq!(
            decision,
            SweepDecision::Sweep {
                amount: U256::from(1_000u64),
                gas_cost: U256::ZERO,
            }
        );
    }

    #[test]
    fn exact_at_wei_scale() {
        // 1 ETH balance, 30 gwei gas price
        let one_eth = U256::from(10u64).pow(U256::from(18u64));
        let decision = plan(one_eth, fees(30_000_000_000, 21_000));

        let cost = U256::from(30_000_000_000u128 * 21_000);
        assert_eq!(
            decision,
            SweepDecision::Sweep {
                amount: one_eth - cost,
                gas_cost: cost,
            }
        );
    }

    #[test]
    fn plan_is_deterministic() {
        let balance = U256::from(987_654_321u64);
        let f = fees(17, 21_000);
        let first = plan(balance, f);
        for _ in 0..10 {
            assert_eq!(plan(balance, f), first);
        }
    }
}
