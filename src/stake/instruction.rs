//! Deferred stake ledger mutations
//!
//! Pool operations record instructions instead of calling the stake ledger
//! directly. They are executed in order only after the whole operation has
//! succeeded.

use super::{OwnerCapability, StakeLedger, StakeResult};
use crate::base::address::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakeInstruction {
    AddStake(u64),
    Unlock(u64),
    ReactivateStake(u64),
    Withdraw(u64),
    SetOperator(Address),
    SetDelegatedVoter(Address),
}

impl StakeInstruction {
    pub fn execute<L>(self, ledger: &mut L, owner_cap: &OwnerCapability) -> StakeResult<()>
    where
        L: StakeLedger,
    {
        use StakeInstruction::*;

        match self {
            AddStake(amount) => ledger.add_stake(owner_cap, amount),
            Unlock(amount) => ledger.unlock(owner_cap, amount),
            ReactivateStake(amount) => ledger.reactivate_stake(owner_cap, amount),
            Withdraw(amount) => ledger.withdraw(owner_cap, amount).map(|_| ()),
            SetOperator(operator) => ledger.set_operator(owner_cap, operator),
            SetDelegatedVoter(voter) => ledger.set_delegated_voter(owner_cap, voter),
        }
    }
}
