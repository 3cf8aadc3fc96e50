//! In-memory stake ledger
//!
//! Models the bucket semantics of a validator stake pool, plus the epoch,
//! lockup and reward controls a host chain would drive.

use super::{
    OwnerCapability, RewardRate, StakeLedger, StakeLedgerError, StakeResult, StakeTotals,
    ValidatorState,
};
use crate::{base::address::Address, constants::RECURRING_LOCKUP_DURATION_SECS, utility::math};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalStakeLedger {
    pub now_secs: u64,
    pub recurring_lockup_duration_secs: u64,
    pub rewards_rate: u64,
    pub rewards_rate_denominator: u64,
    pub stake_pools: HashMap<Address, LocalStakePool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalStakePool {
    pub stake: StakeTotals,
    pub operator: Address,
    pub delegated_voter: Address,
    pub locked_until_secs: u64,
    pub validator_state: ValidatorState,

    /// Id of the owner capability handed out for this stake pool
    pub owner_cap_id: u64,

    /// Coins paid out by `withdraw` so far
    pub withdrawn: u64,
}

//////////
// impl //
//////////

impl LocalStakeLedger {
    pub fn new(recurring_lockup_duration_secs: u64) -> Self {
        Self {
            recurring_lockup_duration_secs,
            ..Default::default()
        }
    }

    pub fn with_reward_rate(mut self, rewards_rate: u64, rewards_rate_denominator: u64) -> Self {
        self.rewards_rate = rewards_rate;
        self.rewards_rate_denominator = rewards_rate_denominator;
        self
    }

    pub fn stake_pool(&self, pool_address: Address) -> StakeResult<&LocalStakePool> {
        self.stake_pools
            .get(&pool_address)
            .ok_or(StakeLedgerError::StakePoolNotFound(pool_address))
    }

    fn stake_pool_mut(&mut self, pool_address: Address) -> StakeResult<&mut LocalStakePool> {
        self.stake_pools
            .get_mut(&pool_address)
            .ok_or(StakeLedgerError::StakePoolNotFound(pool_address))
    }

    fn authorized_pool_mut(
        &mut self,
        owner_cap: &OwnerCapability,
    ) -> StakeResult<&mut LocalStakePool> {
        self.authorize(owner_cap)?;
        self.stake_pool_mut(owner_cap.pool_address())
    }

    /// Validator becomes active at the next epoch
    pub fn join_validator_set(&mut self, pool_address: Address) -> StakeResult<()> {
        let pool = self.stake_pool_mut(pool_address)?;
        if pool.validator_state == ValidatorState::Inactive {
            pool.validator_state = ValidatorState::PendingActive;
        }
        Ok(())
    }

    /// Validator becomes inactive at the next epoch
    pub fn leave_validator_set(&mut self, pool_address: Address) -> StakeResult<()> {
        let pool = self.stake_pool_mut(pool_address)?;
        pool.validator_state = match pool.validator_state {
            ValidatorState::Active => ValidatorState::PendingInactive,
            ValidatorState::PendingActive => ValidatorState::Inactive,
            state => state,
        };
        Ok(())
    }

    pub fn advance_time(&mut self, secs: u64) {
        self.now_secs = self.now_secs.saturating_add(secs);
    }

    /// Credit rewards outside of the epoch schedule
    pub fn distribute_rewards(
        &mut self,
        pool_address: Address,
        active_rewards: u64,
        pending_inactive_rewards: u64,
    ) -> StakeResult<()> {
        self.stake_pool_mut(pool_address)?
            .stake
            .reward(active_rewards, pending_inactive_rewards)
            .ok_or(StakeLedgerError::Overflow(pool_address))
    }

    /// Burn stake from the active and pending inactive buckets
    pub fn slash(
        &mut self,
        pool_address: Address,
        active_penalty: u64,
        pending_inactive_penalty: u64,
    ) -> StakeResult<()> {
        let pool = self.stake_pool_mut(pool_address)?;
        pool.stake.active = pool.stake.active.saturating_sub(active_penalty);
        pool.stake.pending_inactive = pool
            .stake
            .pending_inactive
            .saturating_sub(pending_inactive_penalty);
        Ok(())
    }

    /// Epoch transition for every stake pool: current validators earn rewards
    /// on active and pending inactive stake, pending active stake activates,
    /// and pending inactive stake is inactivated once the lockup expired.
    /// Lockups of validators remaining in the set are renewed. Rewards that
    /// would overflow a bucket are not paid.
    pub fn on_new_epoch(&mut self) {
        let now_secs = self.now_secs;
        let recurring_lockup_duration_secs = self.recurring_lockup_duration_secs;
        let (rate, denominator) = (self.rewards_rate, self.rewards_rate_denominator);

        for (pool_address, pool) in self.stake_pools.iter_mut() {
            if pool.validator_state.is_current_epoch_validator() {
                let active_rewards = math::mul_div_u64(pool.stake.active, rate, denominator);
                let pending_inactive_rewards =
                    math::mul_div_u64(pool.stake.pending_inactive, rate, denominator);

                if pool
                    .stake
                    .reward(
                        active_rewards.unwrap_or_default(),
                        pending_inactive_rewards.unwrap_or_default(),
                    )
                    .is_none()
                {
                    warn!("{pool_address}: epoch rewards overflow, skipped");
                }

                if pool.stake.activate_pending().is_none() {
                    warn!("{pool_address}: pending active stake overflows active");
                }

                if now_secs >= pool.locked_until_secs && pool.stake.inactivate_pending().is_none() {
                    warn!("{pool_address}: pending inactive stake overflows inactive");
                }
            }

            pool.validator_state = match pool.validator_state {
                ValidatorState::PendingActive => ValidatorState::Active,
                ValidatorState::PendingInactive => ValidatorState::Inactive,
                state => state,
            };

            if pool.validator_state == ValidatorState::Active && pool.locked_until_secs <= now_secs
            {
                pool.locked_until_secs = now_secs.saturating_add(recurring_lockup_duration_secs);
            }

            trace!("new epoch {pool_address}: {:?}", pool.stake);
        }
    }
}

impl Default for LocalStakeLedger {
    fn default() -> Self {
        Self {
            now_secs: 0,
            recurring_lockup_duration_secs: RECURRING_LOCKUP_DURATION_SECS,
            rewards_rate: 0,
            rewards_rate_denominator: 1,
            stake_pools: HashMap::new(),
        }
    }
}

impl StakeLedger for LocalStakeLedger {
    fn initialize_stake_pool(
        &mut self,
        pool_address: Address,
        operator: Address,
        delegated_voter: Address,
    ) -> StakeResult<OwnerCapability> {
        if self.stake_pools.contains_key(&pool_address) {
            return Err(StakeLedgerError::StakePoolExists(pool_address));
        }

        debug!("initializing stake pool {pool_address}");
        let owner_cap = OwnerCapability::issue(pool_address);
        self.stake_pools.insert(
            pool_address,
            LocalStakePool {
                operator,
                delegated_voter,
                owner_cap_id: owner_cap.id(),
                ..Default::default()
            },
        );

        Ok(owner_cap)
    }

    fn get_stake(&self, pool_address: Address) -> StakeResult<StakeTotals> {
        Ok(self.stake_pool(pool_address)?.stake)
    }

    fn authorize(&self, owner_cap: &OwnerCapability) -> StakeResult<()> {
        let pool_address = owner_cap.pool_address();
        if self.stake_pool(pool_address)?.owner_cap_id == owner_cap.id() {
            Ok(())
        } else {
            Err(StakeLedgerError::CapabilityMismatch(pool_address))
        }
    }

    fn add_stake(&mut self, owner_cap: &OwnerCapability, amount: u64) -> StakeResult<()> {
        let pool = self.authorized_pool_mut(owner_cap)?;
        let is_current_epoch_validator = pool.validator_state.is_current_epoch_validator();
        pool.stake
            .add(amount, is_current_epoch_validator)
            .ok_or(StakeLedgerError::Overflow(owner_cap.pool_address()))
    }

    fn unlock(&mut self, owner_cap: &OwnerCapability, amount: u64) -> StakeResult<()> {
        self.authorized_pool_mut(owner_cap)?
            .stake
            .unlock(amount)
            .ok_or(StakeLedgerError::Overflow(owner_cap.pool_address()))?;
        Ok(())
    }

    fn reactivate_stake(&mut self, owner_cap: &OwnerCapability, amount: u64) -> StakeResult<()> {
        self.authorized_pool_mut(owner_cap)?
            .stake
            .reactivate(amount)
            .ok_or(StakeLedgerError::Overflow(owner_cap.pool_address()))?;
        Ok(())
    }

    fn withdraw(&mut self, owner_cap: &OwnerCapability, amount: u64) -> StakeResult<u64> {
        let pool_address = owner_cap.pool_address();
        let can_withdraw_pending_inactive = self.can_withdraw_pending_inactive(pool_address)?;
        let pool = self.authorized_pool_mut(owner_cap)?;
        let withdrawn = pool
            .stake
            .withdraw(amount, can_withdraw_pending_inactive)
            .ok_or(StakeLedgerError::Overflow(pool_address))?;

        pool.withdrawn = pool.withdrawn.saturating_add(withdrawn);
        Ok(withdrawn)
    }

    fn operator(&self, pool_address: Address) -> StakeResult<Address> {
        Ok(self.stake_pool(pool_address)?.operator)
    }

    fn set_operator(&mut self, owner_cap: &OwnerCapability, operator: Address) -> StakeResult<()> {
        self.authorized_pool_mut(owner_cap)?.operator = operator;
        Ok(())
    }

    fn delegated_voter(&self, pool_address: Address) -> StakeResult<Address> {
        Ok(self.stake_pool(pool_address)?.delegated_voter)
    }

    fn set_delegated_voter(
        &mut self,
        owner_cap: &OwnerCapability,
        voter: Address,
    ) -> StakeResult<()> {
        self.authorized_pool_mut(owner_cap)?.delegated_voter = voter;
        Ok(())
    }

    fn lockup_expiration_secs(&self, pool_address: Address) -> StakeResult<u64> {
        Ok(self.stake_pool(pool_address)?.locked_until_secs)
    }

    fn is_current_epoch_validator(&self, pool_address: Address) -> StakeResult<bool> {
        Ok(self
            .stake_pool(pool_address)?
            .validator_state
            .is_current_epoch_validator())
    }

    fn validator_state(&self, pool_address: Address) -> StakeResult<ValidatorState> {
        Ok(self.stake_pool(pool_address)?.validator_state)
    }

    fn now_secs(&self) -> u64 {
        self.now_secs
    }
}

impl RewardRate for LocalStakeLedger {
    fn reward_rate(&self) -> (u64, u64) {
        (self.rewards_rate, self.rewards_rate_denominator)
    }
}
