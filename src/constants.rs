use crate::base::address::Address;

// version

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// pool constants

/// Commission denominator, 10000 basis points == 100%
pub const MAX_FEE: u64 = 10_000;

/// Largest commission increase (bps) allowed in a single change
pub const MAX_COMMISSION_INCREASE: u64 = 1_000;

/// Minimum coins a delegator may hold in any shares ledger
pub const MIN_COINS_ON_SHARES_POOL: u64 = 1_000_000_000;

/// Shares minted per coin on an empty shares ledger
pub const SHARES_SCALING_FACTOR: u64 = 10_000_000_000_000_000;

pub const RECURRING_LOCKUP_DURATION_SECS: u64 = 30 * 24 * 60 * 60;

/// Temporary owner of the shares bought with `add_stake` fees
pub const NULL_SHAREHOLDER: Address = Address::ZERO;
