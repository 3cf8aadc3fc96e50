//! External validator stake ledger
//!
//! The stake ledger only reports aggregate totals per stake pool. Mutating
//! calls require the pool's [OwnerCapability].

pub mod instruction;
pub mod local;

use crate::base::address::Address;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StakeLedgerError {
    #[error("stake pool {0} not found")]
    StakePoolNotFound(Address),

    #[error("stake pool {0} already exists")]
    StakePoolExists(Address),

    #[error("owner capability for stake pool {0} was not issued by this stake ledger")]
    CapabilityMismatch(Address),

    #[error("stake pool {0} balance overflow")]
    Overflow(Address),
}

pub type StakeResult<T> = std::result::Result<T, StakeLedgerError>;

/// Stake pool buckets as reported by the stake ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StakeTotals {
    pub active: u64,
    pub inactive: u64,
    pub pending_active: u64,
    pub pending_inactive: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorState {
    PendingActive,
    Active,
    PendingInactive,
    #[default]
    Inactive,
}

/// Exclusive authority over one validator stake account.
///
/// Neither `Clone` nor `Copy`, and only minted inside this crate. The stake
/// ledger remembers the id of the capability it handed out and rejects any
/// other.
#[derive(Debug, PartialEq, Eq)]
pub struct OwnerCapability {
    pool_address: Address,
    id: u64,
}

static NEXT_CAPABILITY_ID: AtomicU64 = AtomicU64::new(1);

/// Validator stake ledger collaborator
///
/// Delegation pools stage their mutating calls and execute them in one batch
/// after [StakeLedger::authorize] accepted their capability. Implementations
/// must not fail a mutating call for an authorized capability when the
/// amounts fit the buckets reported by [StakeLedger::get_stake] with the
/// earlier calls of the batch applied, otherwise a batch could be left half
/// executed.
pub trait StakeLedger {
    /// Create the stake pool and hand out its owner capability
    fn initialize_stake_pool(
        &mut self,
        pool_address: Address,
        operator: Address,
        delegated_voter: Address,
    ) -> StakeResult<OwnerCapability>;

    fn get_stake(&self, pool_address: Address) -> StakeResult<StakeTotals>;

    /// Check `owner_cap` is the capability issued for its stake pool
    fn authorize(&self, owner_cap: &OwnerCapability) -> StakeResult<()>;

    fn add_stake(&mut self, owner_cap: &OwnerCapability, amount: u64) -> StakeResult<()>;

    /// Move up to `amount` from active to pending inactive
    fn unlock(&mut self, owner_cap: &OwnerCapability, amount: u64) -> StakeResult<()>;

    /// Move up to `amount` from pending inactive back to active
    fn reactivate_stake(&mut self, owner_cap: &OwnerCapability, amount: u64) -> StakeResult<()>;

    /// Withdraw up to `amount` of inactive stake. Once the validator is
    /// inactive and its lockup expired, all pending inactive stake is
    /// inactivated first.
    fn withdraw(&mut self, owner_cap: &OwnerCapability, amount: u64) -> StakeResult<u64>;

    fn operator(&self, pool_address: Address) -> StakeResult<Address>;

    fn set_operator(&mut self, owner_cap: &OwnerCapability, operator: Address) -> StakeResult<()>;

    fn delegated_voter(&self, pool_address: Address) -> StakeResult<Address>;

    fn set_delegated_voter(
        &mut self,
        owner_cap: &OwnerCapability,
        voter: Address,
    ) -> StakeResult<()>;

    fn lockup_expiration_secs(&self, pool_address: Address) -> StakeResult<u64>;

    fn is_current_epoch_validator(&self, pool_address: Address) -> StakeResult<bool>;

    fn validator_state(&self, pool_address: Address) -> StakeResult<ValidatorState>;

    fn now_secs(&self) -> u64;

    fn lockup_remaining_secs(&self, pool_address: Address) -> StakeResult<u64> {
        Ok(self
            .lockup_expiration_secs(pool_address)?
            .saturating_sub(self.now_secs()))
    }

    /// Whether `withdraw` would inactivate the pending inactive stake
    fn can_withdraw_pending_inactive(&self, pool_address: Address) -> StakeResult<bool> {
        Ok(self.validator_state(pool_address)? == ValidatorState::Inactive
            && self.now_secs() >= self.lockup_expiration_secs(pool_address)?)
    }
}

/// Per-epoch reward rate collaborator
pub trait RewardRate {
    /// `(numerator, denominator)`
    fn reward_rate(&self) -> (u64, u64);
}

//////////
// impl //
//////////

impl OwnerCapability {
    /// Mint a capability with a process-wide unique id
    pub(crate) fn issue(pool_address: Address) -> Self {
        Self {
            pool_address,
            id: NEXT_CAPABILITY_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn pool_address(&self) -> Address {
        self.pool_address
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }
}

impl ValidatorState {
    pub fn is_current_epoch_validator(self) -> bool {
        matches!(self, Self::Active | Self::PendingInactive)
    }
}

impl StakeTotals {
    pub fn total(&self) -> u128 {
        self.active as u128
            + self.inactive as u128
            + self.pending_active as u128
            + self.pending_inactive as u128
    }

    /// Stake added to a current-epoch validator waits in pending active.
    /// `None` on overflow, leaving the buckets unchanged.
    pub fn add(&mut self, amount: u64, is_current_epoch_validator: bool) -> Option<()> {
        let bucket = if is_current_epoch_validator {
            &mut self.pending_active
        } else {
            &mut self.active
        };

        *bucket = bucket.checked_add(amount)?;
        Some(())
    }

    /// Returns the amount moved, capped at active
    pub fn unlock(&mut self, amount: u64) -> Option<u64> {
        let amount = amount.min(self.active);
        self.pending_inactive = self.pending_inactive.checked_add(amount)?;
        self.active -= amount;
        Some(amount)
    }

    /// Returns the amount moved, capped at pending inactive
    pub fn reactivate(&mut self, amount: u64) -> Option<u64> {
        let amount = amount.min(self.pending_inactive);
        self.active = self.active.checked_add(amount)?;
        self.pending_inactive -= amount;
        Some(amount)
    }

    /// Credit rewards to the active and pending inactive buckets
    pub fn reward(&mut self, active: u64, pending_inactive: u64) -> Option<()> {
        let active = self.active.checked_add(active)?;
        let pending_inactive = self.pending_inactive.checked_add(pending_inactive)?;

        self.active = active;
        self.pending_inactive = pending_inactive;
        Some(())
    }

    pub fn activate_pending(&mut self) -> Option<()> {
        self.active = self.active.checked_add(self.pending_active)?;
        self.pending_active = 0;
        Some(())
    }

    pub fn inactivate_pending(&mut self) -> Option<()> {
        self.inactive = self.inactive.checked_add(self.pending_inactive)?;
        self.pending_inactive = 0;
        Some(())
    }

    /// Returns the amount withdrawn, capped at inactive
    pub fn withdraw(&mut self, amount: u64, can_withdraw_pending_inactive: bool) -> Option<u64> {
        if can_withdraw_pending_inactive {
            self.inactivate_pending()?;
        }

        let amount = amount.min(self.inactive);
        self.inactive -= amount;
        Some(amount)
    }
}
