//! Read-only views
//!
//! Views report balances as they would be right after a synchronization
//! without mutating the pool.

use super::{balance::add_stake_fee, BeneficiaryBook, PoolState};
use crate::{
    base::address::Address,
    constants::NULL_SHAREHOLDER,
    error::Result,
    stake::{RewardRate, StakeLedger},
};
use serde::{Deserialize, Serialize};

/// A delegator's stake in each bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatorStake {
    pub active: u64,
    pub inactive: u64,
    pub pending_inactive: u64,
}

impl PoolState {
    pub fn get_stake<L>(
        &self,
        ledger: &L,
        beneficiaries: &BeneficiaryBook,
        delegator: Address,
    ) -> Result<DelegatorStake>
    where
        L: StakeLedger,
    {
        let stake = ledger.get_stake(self.pool_address)?;
        let drift = self.calculate_stake_pool_drift(&stake)?;

        let mut total_active_shares = self.active_shares.total_shares();
        let mut delegator_active_shares = self.active_shares.shares(&delegator);

        // fee shares are released at the next synchronization
        if stake.pending_active == 0 {
            total_active_shares -= self.active_shares.shares(&NULL_SHAREHOLDER);
            if delegator == NULL_SHAREHOLDER {
                delegator_active_shares = 0;
            }
        }

        let mut active = self.active_shares.shares_to_amount_with_total_stats(
            delegator_active_shares,
            drift.active - drift.commission_active,
            total_active_shares,
        );

        let (withdrawal_inactive, withdrawal_stake) = self.get_pending_withdrawal(ledger, delegator)?;
        let (mut inactive, mut pending_inactive) = if withdrawal_inactive {
            (withdrawal_stake, 0)
        } else {
            (0, withdrawal_stake)
        };

        // commission not yet converted to shares
        let operator = ledger.operator(self.pool_address)?;
        if delegator == beneficiaries.beneficiary_for_operator(operator) {
            active += drift.commission_active;
            if drift.lockup_cycle_ended {
                inactive += drift.commission_pending_inactive;
            } else {
                pending_inactive += drift.commission_pending_inactive;
            }
        }

        Ok(DelegatorStake {
            active,
            inactive,
            pending_inactive,
        })
    }

    /// `(is_inactive, amount)` of `delegator`'s pending withdrawal
    pub fn get_pending_withdrawal<L>(&self, ledger: &L, delegator: Address) -> Result<(bool, u64)>
    where
        L: StakeLedger,
    {
        let Some(olc) = self.pending_withdrawal(&delegator) else {
            return Ok((false, 0));
        };
        let Some(inactive_shares) = self.inactive_shares.get(&olc) else {
            return Ok((false, 0));
        };

        if olc < self.observed_lockup_cycle {
            return Ok((true, inactive_shares.balance(&delegator)));
        }

        // the stake pool may already have inactivated the current cycle
        let drift = self.calculate_stake_pool_drift(&ledger.get_stake(self.pool_address)?)?;
        let amount = inactive_shares.shares_to_amount_with_total_coins(
            inactive_shares.shares(&delegator),
            drift.pending_inactive - drift.commission_pending_inactive,
        );

        Ok((drift.lockup_cycle_ended, amount))
    }

    pub fn can_withdraw_pending_inactive<L>(&self, ledger: &L) -> Result<bool>
    where
        L: StakeLedger,
    {
        Ok(ledger.can_withdraw_pending_inactive(self.pool_address)?)
    }

    /// Coins of the active ledger as of the last synchronization
    pub fn total_active_value(&self) -> u64 {
        self.active_shares.total_coins()
    }

    pub fn shareholders_count_active_pool(&self) -> usize {
        self.active_shares.holder_count()
    }

    /// Fee `add_stake` would charge on `amount` right now
    pub fn get_add_stake_fee<L>(&self, ledger: &L, amount: u64) -> Result<u64>
    where
        L: StakeLedger + RewardRate,
    {
        if !ledger.is_current_epoch_validator(self.pool_address)? {
            return Ok(0);
        }

        Ok(add_stake_fee(
            amount,
            ledger.reward_rate(),
            self.operator_commission_percentage(ledger.now_secs()),
        ))
    }
}
