//! Operation context
//!
//! Gives pool operations read access to the stake ledger and records the
//! stake ledger mutations they request. Recorded mutations are applied to a
//! local projection of the stake pool totals so later reads within the same
//! operation observe them.

use super::beneficiary::BeneficiaryBook;
use crate::{
    base::address::Address,
    config::PoolConfig,
    error::{DelegationPoolError, Result},
    event::DelegationPoolEvent,
    stake::{instruction::StakeInstruction, RewardRate, StakeLedger, StakeTotals},
};
use log::trace;

pub struct PoolContext<'a, L> {
    pool_address: Address,
    ledger: &'a L,
    config: &'a PoolConfig,
    beneficiaries: &'a BeneficiaryBook,

    /// Stake pool totals with the recorded instructions applied
    stake: Option<StakeTotals>,
    operator: Option<Address>,
    delegated_voter: Option<Address>,

    instructions: Vec<StakeInstruction>,
    events: Vec<DelegationPoolEvent>,
}

/// Everything an operation produced, in order
#[derive(Debug, Default)]
pub struct Effects {
    pub instructions: Vec<StakeInstruction>,
    pub events: Vec<DelegationPoolEvent>,
}

impl<'a, L> PoolContext<'a, L>
where
    L: StakeLedger,
{
    pub fn new(
        pool_address: Address,
        ledger: &'a L,
        config: &'a PoolConfig,
        beneficiaries: &'a BeneficiaryBook,
    ) -> Self {
        Self {
            pool_address,
            ledger,
            config,
            beneficiaries,
            stake: None,
            operator: None,
            delegated_voter: None,
            instructions: vec![],
            events: vec![],
        }
    }

    pub fn config(&self) -> &'a PoolConfig {
        self.config
    }

    pub fn now_secs(&self) -> u64 {
        self.ledger.now_secs()
    }

    /// Projected stake pool totals
    pub fn stake(&mut self) -> Result<StakeTotals> {
        Ok(*self.stake_mut()?)
    }

    fn stake_mut(&mut self) -> Result<&mut StakeTotals> {
        if self.stake.is_none() {
            self.stake = Some(self.ledger.get_stake(self.pool_address)?);
        }

        Ok(self.stake.get_or_insert_with(StakeTotals::default))
    }

    pub fn is_current_epoch_validator(&self) -> Result<bool> {
        Ok(self.ledger.is_current_epoch_validator(self.pool_address)?)
    }

    pub fn can_withdraw_pending_inactive(&self) -> Result<bool> {
        Ok(self.ledger.can_withdraw_pending_inactive(self.pool_address)?)
    }

    pub fn lockup_expiration_secs(&self) -> Result<u64> {
        Ok(self.ledger.lockup_expiration_secs(self.pool_address)?)
    }

    pub fn lockup_remaining_secs(&self) -> Result<u64> {
        Ok(self.ledger.lockup_remaining_secs(self.pool_address)?)
    }

    pub fn operator(&self) -> Result<Address> {
        match self.operator {
            Some(operator) => Ok(operator),
            None => Ok(self.ledger.operator(self.pool_address)?),
        }
    }

    pub fn delegated_voter(&self) -> Result<Address> {
        match self.delegated_voter {
            Some(voter) => Ok(voter),
            None => Ok(self.ledger.delegated_voter(self.pool_address)?),
        }
    }

    /// Account receiving the current operator's commission
    pub fn beneficiary_for_operator(&self) -> Result<Address> {
        Ok(self.beneficiaries.beneficiary_for_operator(self.operator()?))
    }

    ////////////////////////
    // recorded mutations //
    ////////////////////////

    pub fn add_stake(&mut self, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }

        let is_current_epoch_validator = self.is_current_epoch_validator()?;
        self.stake_mut()?
            .add(amount, is_current_epoch_validator)
            .ok_or(DelegationPoolError::Overflow)?;
        self.record(StakeInstruction::AddStake(amount));
        Ok(())
    }

    /// Returns the amount actually moved
    pub fn unlock(&mut self, amount: u64) -> Result<u64> {
        if amount == 0 {
            return Ok(0);
        }

        let unlocked = self
            .stake_mut()?
            .unlock(amount)
            .ok_or(DelegationPoolError::Overflow)?;
        self.record(StakeInstruction::Unlock(amount));
        Ok(unlocked)
    }

    /// Returns the amount actually moved
    pub fn reactivate_stake(&mut self, amount: u64) -> Result<u64> {
        if amount == 0 {
            return Ok(0);
        }

        let reactivated = self
            .stake_mut()?
            .reactivate(amount)
            .ok_or(DelegationPoolError::Overflow)?;
        self.record(StakeInstruction::ReactivateStake(amount));
        Ok(reactivated)
    }

    /// Returns the amount actually withdrawn
    pub fn withdraw(&mut self, amount: u64) -> Result<u64> {
        if amount == 0 {
            return Ok(0);
        }

        let can_withdraw_pending_inactive = self.can_withdraw_pending_inactive()?;
        let withdrawn = self
            .stake_mut()?
            .withdraw(amount, can_withdraw_pending_inactive)
            .ok_or(DelegationPoolError::Overflow)?;
        self.record(StakeInstruction::Withdraw(amount));
        Ok(withdrawn)
    }

    pub fn set_operator(&mut self, operator: Address) {
        self.operator = Some(operator);
        self.record(StakeInstruction::SetOperator(operator));
    }

    pub fn set_delegated_voter(&mut self, voter: Address) {
        self.delegated_voter = Some(voter);
        self.record(StakeInstruction::SetDelegatedVoter(voter));
    }

    pub fn emit(&mut self, event: DelegationPoolEvent) {
        self.events.push(event);
    }

    pub fn into_effects(self) -> Effects {
        Effects {
            instructions: self.instructions,
            events: self.events,
        }
    }

    fn record(&mut self, instruction: StakeInstruction) {
        trace!("{}: {instruction:?}", self.pool_address);
        self.instructions.push(instruction);
    }
}

impl<'a, L> PoolContext<'a, L>
where
    L: StakeLedger + RewardRate,
{
    pub fn reward_rate(&self) -> (u64, u64) {
        self.ledger.reward_rate()
    }
}
