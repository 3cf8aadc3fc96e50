//! Delegation pool events
//!
//! Every successful operation appends its events to the registry's event
//! log. Amounts are in coins.

use crate::base::{address::Address, olc::ObservedLockupCycle};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DelegationPoolEvent {
    AddStake {
        pool_address: Address,
        delegator_address: Address,
        amount_added: u64,
        add_stake_fee: u64,
    },
    UnlockStake {
        pool_address: Address,
        delegator_address: Address,
        amount_unlocked: u64,
    },
    ReactivateStake {
        pool_address: Address,
        delegator_address: Address,
        amount_reactivated: u64,
    },
    WithdrawStake {
        pool_address: Address,
        delegator_address: Address,
        amount_withdrawn: u64,
    },
    DistributeCommission {
        pool_address: Address,
        operator: Address,
        beneficiary: Address,
        commission_active: u64,
        commission_pending_inactive: u64,
    },
    CommissionPercentageChange {
        pool_address: Address,
        owner: Address,
        commission_percentage_next_lockup_cycle: u64,
    },
    SetBeneficiaryForOperator {
        operator: Address,
        old_beneficiary: Address,
        new_beneficiary: Address,
    },
    OperatorChange {
        pool_address: Address,
        old_operator: Address,
        new_operator: Address,
    },
    DelegatedVoterChange {
        pool_address: Address,
        old_voter: Address,
        new_voter: Address,
    },
    LockupCycleAdvanced {
        pool_address: Address,
        observed_lockup_cycle: ObservedLockupCycle,
        total_coins_inactive: u64,
    },
}

impl DelegationPoolEvent {
    /// `None` for operator level events
    pub fn pool_address(&self) -> Option<Address> {
        use DelegationPoolEvent::*;

        match self {
            AddStake { pool_address, .. }
            | UnlockStake { pool_address, .. }
            | ReactivateStake { pool_address, .. }
            | WithdrawStake { pool_address, .. }
            | DistributeCommission { pool_address, .. }
            | CommissionPercentageChange { pool_address, .. }
            | OperatorChange { pool_address, .. }
            | DelegatedVoterChange { pool_address, .. }
            | LockupCycleAdvanced { pool_address, .. } => Some(*pool_address),
            SetBeneficiaryForOperator { .. } => None,
        }
    }
}
