//! Delegation pool registry
//!
//! Host-owned map of delegation pools keyed by stake pool address. Every entry
//! point takes the stake ledger explicitly and runs as one all-or-nothing
//! transaction against a single pool.

use crate::{
    base::{address::Address, olc::ObservedLockupCycle},
    config::PoolConfig,
    constants::MAX_FEE,
    error::{DelegationPoolError, Result},
    event::DelegationPoolEvent,
    pool::{
        views::DelegatorStake, BeneficiaryBook, DelegationPool, PoolContext, PoolState,
    },
    stake::{RewardRate, StakeLedger, StakeTotals},
};
use log::info;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct PoolRegistry {
    config: PoolConfig,
    pools: HashMap<Address, DelegationPool>,

    /// Owner -> pool address
    owners: HashMap<Address, Address>,
    beneficiaries: BeneficiaryBook,
    events: Vec<DelegationPoolEvent>,
}

impl PoolRegistry {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Create the stake pool at `pool_address` owned by the new delegation
    /// pool. The owner starts out as operator and delegated voter.
    pub fn initialize_delegation_pool<L>(
        &mut self,
        ledger: &mut L,
        owner: Address,
        pool_address: Address,
        operator_commission_percentage: u64,
    ) -> Result<()>
    where
        L: StakeLedger,
    {
        if operator_commission_percentage > MAX_FEE {
            return Err(DelegationPoolError::InvalidCommission(
                operator_commission_percentage,
            ));
        }

        if let Some(owned) = self.owners.get(&owner) {
            return Err(DelegationPoolError::PoolAlreadyExists(*owned));
        }

        if self.pools.contains_key(&pool_address) {
            return Err(DelegationPoolError::PoolAlreadyExists(pool_address));
        }

        let owner_cap = ledger.initialize_stake_pool(pool_address, owner, owner)?;
        let pool = DelegationPool::new(owner_cap, operator_commission_percentage, &self.config);

        info!("{owner} created delegation pool {pool_address}");
        self.pools.insert(pool_address, pool);
        self.owners.insert(owner, pool_address);
        Ok(())
    }

    pub fn add_stake<L>(
        &mut self,
        ledger: &mut L,
        pool_address: Address,
        delegator: Address,
        amount: u64,
    ) -> Result<()>
    where
        L: StakeLedger + RewardRate,
    {
        self.transact(ledger, pool_address, |state, ctx| {
            state.add_stake(ctx, delegator, amount)
        })
    }

    pub fn unlock<L>(
        &mut self,
        ledger: &mut L,
        pool_address: Address,
        delegator: Address,
        amount: u64,
    ) -> Result<()>
    where
        L: StakeLedger,
    {
        self.transact(ledger, pool_address, |state, ctx| {
            state.unlock(ctx, delegator, amount)
        })
    }

    pub fn reactivate_stake<L>(
        &mut self,
        ledger: &mut L,
        pool_address: Address,
        delegator: Address,
        amount: u64,
    ) -> Result<()>
    where
        L: StakeLedger + RewardRate,
    {
        self.transact(ledger, pool_address, |state, ctx| {
            state.reactivate_stake(ctx, delegator, amount)
        })
    }

    /// Returns the coins withdrawn
    pub fn withdraw<L>(
        &mut self,
        ledger: &mut L,
        pool_address: Address,
        delegator: Address,
        amount: u64,
    ) -> Result<u64>
    where
        L: StakeLedger,
    {
        self.transact(ledger, pool_address, |state, ctx| {
            state.withdraw(ctx, delegator, amount)
        })
    }

    pub fn synchronize_delegation_pool<L>(&mut self, ledger: &mut L, pool_address: Address) -> Result<()>
    where
        L: StakeLedger,
    {
        self.transact(ledger, pool_address, |state, ctx| state.synchronize(ctx))
    }

    pub fn update_commission_percentage<L>(
        &mut self,
        ledger: &mut L,
        owner: Address,
        new_commission_percentage: u64,
    ) -> Result<()>
    where
        L: StakeLedger,
    {
        let pool_address = self.get_owned_pool_address(owner)?;
        self.transact(ledger, pool_address, |state, ctx| {
            state.update_commission_percentage(ctx, owner, new_commission_percentage)
        })
    }

    pub fn set_operator<L>(&mut self, ledger: &mut L, owner: Address, new_operator: Address) -> Result<()>
    where
        L: StakeLedger,
    {
        let pool_address = self.get_owned_pool_address(owner)?;
        self.transact(ledger, pool_address, |state, ctx| {
            state.set_operator(ctx, new_operator)
        })
    }

    pub fn set_delegated_voter<L>(&mut self, ledger: &mut L, owner: Address, new_voter: Address) -> Result<()>
    where
        L: StakeLedger,
    {
        let pool_address = self.get_owned_pool_address(owner)?;
        self.transact(ledger, pool_address, |state, ctx| {
            state.set_delegated_voter(ctx, new_voter)
        })
    }

    /// Redirect `operator`'s future commission, in every pool it operates,
    /// to `new_beneficiary`
    pub fn set_beneficiary_for_operator(&mut self, operator: Address, new_beneficiary: Address) {
        let old_beneficiary = self.beneficiaries.set(operator, new_beneficiary);

        info!("{operator} beneficiary {old_beneficiary} -> {new_beneficiary}");
        self.events
            .push(DelegationPoolEvent::SetBeneficiaryForOperator {
                operator,
                old_beneficiary,
                new_beneficiary,
            });
    }

    ///////////
    // views //
    ///////////

    pub fn delegation_pool_exists(&self, pool_address: Address) -> bool {
        self.pools.contains_key(&pool_address)
    }

    pub fn pool(&self, pool_address: Address) -> Result<&PoolState> {
        self.pools
            .get(&pool_address)
            .map(DelegationPool::state)
            .ok_or(DelegationPoolError::PoolNotFound(pool_address))
    }

    pub fn pool_addresses(&self) -> impl Iterator<Item = &Address> {
        self.pools.keys()
    }

    pub fn get_owned_pool_address(&self, owner: Address) -> Result<Address> {
        self.owners
            .get(&owner)
            .copied()
            .ok_or(DelegationPoolError::NotOwner(owner))
    }

    pub fn beneficiary_for_operator(&self, operator: Address) -> Address {
        self.beneficiaries.beneficiary_for_operator(operator)
    }

    pub fn get_stake<L>(&self, ledger: &L, pool_address: Address, delegator: Address) -> Result<DelegatorStake>
    where
        L: StakeLedger,
    {
        self.pool(pool_address)?
            .get_stake(ledger, &self.beneficiaries, delegator)
    }

    pub fn get_pending_withdrawal<L>(
        &self,
        ledger: &L,
        pool_address: Address,
        delegator: Address,
    ) -> Result<(bool, u64)>
    where
        L: StakeLedger,
    {
        self.pool(pool_address)?
            .get_pending_withdrawal(ledger, delegator)
    }

    pub fn can_withdraw_pending_inactive<L>(&self, ledger: &L, pool_address: Address) -> Result<bool>
    where
        L: StakeLedger,
    {
        self.pool(pool_address)?
            .can_withdraw_pending_inactive(ledger)
    }

    pub fn get_add_stake_fee<L>(&self, ledger: &L, pool_address: Address, amount: u64) -> Result<u64>
    where
        L: StakeLedger + RewardRate,
    {
        self.pool(pool_address)?.get_add_stake_fee(ledger, amount)
    }

    /// Stake pool totals as reported by the stake ledger
    pub fn get_delegation_pool_stake<L>(&self, ledger: &L, pool_address: Address) -> Result<StakeTotals>
    where
        L: StakeLedger,
    {
        self.pool(pool_address)?;
        Ok(ledger.get_stake(pool_address)?)
    }

    pub fn total_active_value(&self, pool_address: Address) -> Result<u64> {
        Ok(self.pool(pool_address)?.total_active_value())
    }

    pub fn shareholders_count_active_pool(&self, pool_address: Address) -> Result<usize> {
        Ok(self.pool(pool_address)?.shareholders_count_active_pool())
    }

    pub fn observed_lockup_cycle(&self, pool_address: Address) -> Result<ObservedLockupCycle> {
        Ok(self.pool(pool_address)?.observed_lockup_cycle())
    }

    pub fn operator_commission_percentage<L>(&self, ledger: &L, pool_address: Address) -> Result<u64>
    where
        L: StakeLedger,
    {
        Ok(self
            .pool(pool_address)?
            .operator_commission_percentage(ledger.now_secs()))
    }

    pub fn operator_commission_percentage_next_lockup_cycle(&self, pool_address: Address) -> Result<u64> {
        Ok(self
            .pool(pool_address)?
            .operator_commission_percentage_next_lockup_cycle())
    }

    ////////////
    // events //
    ////////////

    pub fn events(&self) -> &[DelegationPoolEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<DelegationPoolEvent> {
        std::mem::take(&mut self.events)
    }

    fn transact<L, T, F>(&mut self, ledger: &mut L, pool_address: Address, f: F) -> Result<T>
    where
        L: StakeLedger,
        F: FnOnce(&mut PoolState, &mut PoolContext<'_, L>) -> Result<T>,
    {
        let pool = self
            .pools
            .get_mut(&pool_address)
            .ok_or(DelegationPoolError::PoolNotFound(pool_address))?;
        let (value, events) = pool.transact(ledger, &self.config, &self.beneficiaries, f)?;

        self.events.extend(events);
        Ok(value)
    }
}
