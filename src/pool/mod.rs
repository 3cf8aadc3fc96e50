//! Delegation pool state
//!
//! A [DelegationPool] pairs the pool's bookkeeping ([PoolState]) with the
//! owner capability of its validator stake pool. Every operation is staged on
//! a copy of the state; stake ledger calls are recorded by the
//! [PoolContext] and only executed, together with the state commit, once the
//! whole operation succeeded.

pub mod balance;
pub mod beneficiary;
pub mod commission;
pub mod context;
pub mod operations;
pub mod sync;
pub mod views;

pub use beneficiary::BeneficiaryBook;
pub use context::PoolContext;

use crate::{
    base::{address::Address, olc::ObservedLockupCycle},
    config::PoolConfig,
    error::Result,
    event::DelegationPoolEvent,
    ledger::SharesLedger,
    stake::{OwnerCapability, StakeLedger},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug)]
pub struct DelegationPool {
    owner_cap: OwnerCapability,
    state: PoolState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    pub(crate) pool_address: Address,

    /// Active and pending active stake
    pub(crate) active_shares: SharesLedger,

    /// One ledger per observed lockup cycle, the current cycle's ledger holds
    /// the pending inactive stake
    pub(crate) inactive_shares: BTreeMap<ObservedLockupCycle, SharesLedger>,

    /// Cycle of each delegator's only inactive ledger
    pub(crate) pending_withdrawals: HashMap<Address, ObservedLockupCycle>,

    pub(crate) observed_lockup_cycle: ObservedLockupCycle,

    /// Inactive stake of the stake pool at the last cycle advance or withdrawal
    pub(crate) total_coins_inactive: u64,

    /// Basis points
    pub(crate) operator_commission_percentage: u64,
    pub(crate) next_commission: Option<NextCommission>,
}

/// Commission rate scheduled for the next lockup cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextCommission {
    pub commission_percentage_next_lockup_cycle: u64,
    pub effective_after_secs: u64,
}

//////////
// impl //
//////////

impl DelegationPool {
    pub fn new(owner_cap: OwnerCapability, operator_commission_percentage: u64, config: &PoolConfig) -> Self {
        let state = PoolState::new(
            owner_cap.pool_address(),
            operator_commission_percentage,
            config,
        );
        Self { owner_cap, state }
    }

    pub fn pool_address(&self) -> Address {
        self.owner_cap.pool_address()
    }

    pub fn state(&self) -> &PoolState {
        &self.state
    }

    /// Run `f` against a staged copy of the pool state. Recorded stake
    /// instructions are executed and the staged state committed only if `f`
    /// succeeds and the stake ledger accepts the pool's capability, otherwise
    /// neither the pool nor the stake ledger change.
    pub fn transact<L, T, F>(
        &mut self,
        ledger: &mut L,
        config: &PoolConfig,
        beneficiaries: &BeneficiaryBook,
        f: F,
    ) -> Result<(T, Vec<DelegationPoolEvent>)>
    where
        L: StakeLedger,
        F: FnOnce(&mut PoolState, &mut PoolContext<'_, L>) -> Result<T>,
    {
        let mut staged = self.state.clone();
        let (value, effects) = {
            let mut ctx = PoolContext::new(self.pool_address(), &*ledger, config, beneficiaries);
            let value = f(&mut staged, &mut ctx)?;
            (value, ctx.into_effects())
        };

        // instructions fit the projected totals, only the capability can be
        // refused
        if !effects.instructions.is_empty() {
            ledger.authorize(&self.owner_cap)?;
        }

        for instruction in effects.instructions {
            instruction.execute(ledger, &self.owner_cap)?;
        }

        self.state = staged;
        Ok((value, effects.events))
    }
}

impl PoolState {
    pub fn new(pool_address: Address, operator_commission_percentage: u64, config: &PoolConfig) -> Self {
        let observed_lockup_cycle = ObservedLockupCycle::default();
        let inactive_shares = BTreeMap::from([(
            observed_lockup_cycle,
            SharesLedger::with_scaling_factor(config.shares_scaling_factor),
        )]);

        Self {
            pool_address,
            active_shares: SharesLedger::with_scaling_factor(config.shares_scaling_factor),
            inactive_shares,
            pending_withdrawals: HashMap::new(),
            observed_lockup_cycle,
            total_coins_inactive: 0,
            operator_commission_percentage,
            next_commission: None,
        }
    }

    pub fn pool_address(&self) -> Address {
        self.pool_address
    }

    pub fn active_shares(&self) -> &SharesLedger {
        &self.active_shares
    }

    pub fn inactive_shares(&self) -> &BTreeMap<ObservedLockupCycle, SharesLedger> {
        &self.inactive_shares
    }

    pub fn inactive_shares_at(&self, olc: ObservedLockupCycle) -> Option<&SharesLedger> {
        self.inactive_shares.get(&olc)
    }

    /// The current cycle's ledger
    pub fn pending_inactive_shares(&self) -> &SharesLedger {
        // every pool is created with a ledger at its current cycle and the
        // current cycle's ledger is never destroyed
        &self.inactive_shares[&self.observed_lockup_cycle]
    }

    pub(crate) fn pending_inactive_shares_mut(&mut self) -> &mut SharesLedger {
        self.inactive_shares
            .entry(self.observed_lockup_cycle)
            .or_default()
    }

    pub fn pending_withdrawal(&self, delegator: &Address) -> Option<ObservedLockupCycle> {
        self.pending_withdrawals.get(delegator).copied()
    }

    pub fn pending_withdrawals(&self) -> &HashMap<Address, ObservedLockupCycle> {
        &self.pending_withdrawals
    }

    pub fn observed_lockup_cycle(&self) -> ObservedLockupCycle {
        self.observed_lockup_cycle
    }

    pub fn total_coins_inactive(&self) -> u64 {
        self.total_coins_inactive
    }

    pub fn next_commission(&self) -> Option<NextCommission> {
        self.next_commission
    }

    /// Coins tracked by the active ledger and every inactive ledger
    pub fn total_tracked_coins(&self) -> u128 {
        self.active_shares.total_coins() as u128
            + self
                .inactive_shares
                .values()
                .map(|ledger| ledger.total_coins() as u128)
                .sum::<u128>()
    }
}
