//! Delegation pool configuration

use crate::constants::*;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use std::path::Path;

/// Tunables shared by every pool in a registry. Missing JSON fields take
/// their production defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SmartDefault)]
#[serde(default)]
pub struct PoolConfig {
    /// Minimum coins a delegator may keep in an active or pending inactive
    /// shares ledger
    #[default(MIN_COINS_ON_SHARES_POOL)]
    pub min_coins_on_shares_pool: u64,

    /// Shares minted per coin on an empty shares ledger
    #[default(SHARES_SCALING_FACTOR)]
    pub shares_scaling_factor: u64,

    /// Basis points
    #[default(MAX_COMMISSION_INCREASE)]
    pub max_commission_increase: u64,

    #[default(RECURRING_LOCKUP_DURATION_SECS)]
    pub recurring_lockup_duration_secs: u64,
}

impl PoolConfig {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading pool config {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing pool config {}", path.display()))
    }

    /// Lockup time that must remain for a commission change to be accepted
    pub fn min_remaining_secs_for_commission_change(&self) -> u64 {
        self.recurring_lockup_duration_secs / 4
    }
}
