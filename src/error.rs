//! Delegation pool errors

use crate::{
    base::{address::Address, olc::ObservedLockupCycle},
    stake::StakeLedgerError,
};
use thiserror::Error;

/// Every failure is synchronous and leaves the pool untouched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DelegationPoolError {
    #[error("delegation pool {0} not found")]
    PoolNotFound(Address),

    #[error("delegation pool {0} already exists")]
    PoolAlreadyExists(Address),

    #[error("{0} does not own a delegation pool")]
    NotOwner(Address),

    #[error("settled inactive stake shrank from {recorded} to {observed}")]
    CorruptedLedger { recorded: u64, observed: u64 },

    #[error("cannot unlock {requested}, only {available} is active on the stake pool")]
    InsufficientActiveStake { requested: u64, available: u64 },

    #[error("{holder} owns {owned} shares, cannot redeem {requested}")]
    InsufficientShares {
        holder: Address,
        owned: u128,
        requested: u128,
    },

    #[error("{holder} {bucket} balance {balance} is below the minimum {minimum}")]
    BalanceTooLow {
        holder: Address,
        bucket: &'static str,
        balance: u64,
        minimum: u64,
    },

    #[error("{holder} has a pending withdrawal at OLC {pending}, cannot open one at OLC {current}")]
    PendingWithdrawalConflict {
        holder: Address,
        pending: ObservedLockupCycle,
        current: ObservedLockupCycle,
    },

    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("commission of {0} basis points exceeds 100%")]
    InvalidCommission(u64),

    #[error("commission cannot increase from {current} to {requested} basis points (max increase {max_increase})")]
    CommissionIncreaseTooLarge {
        current: u64,
        requested: u64,
        max_increase: u64,
    },

    #[error("commission change needs {required}s of remaining lockup, {remaining}s left")]
    CommissionChangeTooLate { remaining: u64, required: u64 },

    #[error("{0} is reserved for add_stake fees")]
    ReservedAddress(Address),

    #[error("arithmetic overflow")]
    Overflow,

    #[error(transparent)]
    Stake(#[from] StakeLedgerError),
}

/// Result alias using [DelegationPoolError]
pub type Result<T> = std::result::Result<T, DelegationPoolError>;
