//! Observed lockup cycle type

use serde::{Deserialize, Serialize};

/// The pool's own lockup cycle counter. It is advanced only when the stake
/// ledger reports newly inactivated stake and is unrelated to the validator's
/// lockup calendar.
#[derive(
    Debug, PartialEq, Eq, Copy, Clone, Default, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ObservedLockupCycle(pub u64);

impl ObservedLockupCycle {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<u64> for ObservedLockupCycle {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for ObservedLockupCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
