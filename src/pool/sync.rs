//! Synchronization against the stake ledger
//!
//! The stake pool only reports aggregate bucket totals. Synchronizing
//! distributes the rewards observed since the last synchronization to the
//! shares ledgers, pays the operator commission on them and advances the
//! observed lockup cycle once the stake pool inactivated new stake.

use super::{context::PoolContext, PoolState};
use crate::{
    constants::{MAX_FEE, NULL_SHAREHOLDER},
    error::{DelegationPoolError, Result},
    event::DelegationPoolEvent,
    ledger::SharesLedger,
    stake::{StakeLedger, StakeTotals},
    utility::math::mul_div_u64,
};
use log::{debug, info};

/// Difference between the stake pool totals and the shares ledgers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StakePoolDrift {
    /// The stake pool inactivated stake the pool has not accounted for
    pub lockup_cycle_ended: bool,

    /// Active plus pending active stake
    pub active: u64,

    /// Stake belonging to the current cycle's ledger
    pub pending_inactive: u64,

    pub commission_active: u64,
    pub commission_pending_inactive: u64,
}

impl PoolState {
    pub fn calculate_stake_pool_drift(&self, stake: &StakeTotals) -> Result<StakePoolDrift> {
        // settled inactive stake never shrinks outside of withdrawals
        if stake.inactive < self.total_coins_inactive {
            return Err(DelegationPoolError::CorruptedLedger {
                recorded: self.total_coins_inactive,
                observed: stake.inactive,
            });
        }

        let lockup_cycle_ended = stake.inactive > self.total_coins_inactive;
        let active = stake
            .active
            .checked_add(stake.pending_active)
            .ok_or(DelegationPoolError::Overflow)?;
        let pending_inactive = if lockup_cycle_ended {
            stake.inactive - self.total_coins_inactive
        } else {
            stake.pending_inactive
        };

        Ok(StakePoolDrift {
            lockup_cycle_ended,
            active,
            pending_inactive,
            commission_active: self.commission_on(active, self.active_shares.total_coins()),
            commission_pending_inactive: self.commission_on(
                pending_inactive,
                self.pending_inactive_shares().total_coins(),
            ),
        })
    }

    /// Commission on the rewards `observed - recorded`, none after slashing
    fn commission_on(&self, observed: u64, recorded: u64) -> u64 {
        if observed <= recorded {
            return 0;
        }

        mul_div_u64(
            observed - recorded,
            self.operator_commission_percentage,
            MAX_FEE,
        )
        .unwrap_or_default()
    }

    pub fn synchronize<L>(&mut self, ctx: &mut PoolContext<'_, L>) -> Result<()>
    where
        L: StakeLedger,
    {
        let stake = ctx.stake()?;
        let drift = self.calculate_stake_pool_drift(&stake)?;

        // no stake pending activation, so the epoch which charged the
        // add_stake fees is over and they are released to all active holders
        if stake.pending_active == 0 {
            let fee_shares = self.active_shares.shares(&NULL_SHAREHOLDER);
            self.active_shares.redeem_shares(NULL_SHAREHOLDER, fee_shares)?;
        }

        self.active_shares
            .update_total_coins(drift.active - drift.commission_active);
        self.pending_inactive_shares_mut()
            .update_total_coins(drift.pending_inactive - drift.commission_pending_inactive);

        // commission shares are bought after the rebase so they do not earn
        // any of the rewards they were paid from
        let operator = ctx.operator()?;
        let beneficiary = ctx.beneficiary_for_operator()?;
        self.buy_in_active_shares(beneficiary, drift.commission_active)?;
        self.buy_in_pending_inactive_shares(ctx, beneficiary, drift.commission_pending_inactive)?;

        if drift.commission_active > 0 || drift.commission_pending_inactive > 0 {
            debug!(
                "{}: commission {} active, {} pending inactive to {beneficiary}",
                self.pool_address, drift.commission_active, drift.commission_pending_inactive
            );
            ctx.emit(DelegationPoolEvent::DistributeCommission {
                pool_address: self.pool_address,
                operator,
                beneficiary,
                commission_active: drift.commission_active,
                commission_pending_inactive: drift.commission_pending_inactive,
            });
        }

        if drift.lockup_cycle_ended {
            self.advance_lockup_cycle(ctx)?;
        }

        if self.is_next_commission_percentage_effective(ctx.now_secs()) {
            if let Some(next) = self.next_commission.take() {
                info!(
                    "{}: commission now {} basis points",
                    self.pool_address, next.commission_percentage_next_lockup_cycle
                );
                self.operator_commission_percentage = next.commission_percentage_next_lockup_cycle;
            }
        }

        debug!(
            "{}: synchronized at OLC {}, {} active, {} pending inactive",
            self.pool_address,
            self.observed_lockup_cycle,
            self.active_shares.total_coins(),
            self.pending_inactive_shares().total_coins()
        );
        Ok(())
    }

    /// Freeze the current cycle's ledger and open a new one
    fn advance_lockup_cycle<L>(&mut self, ctx: &mut PoolContext<'_, L>) -> Result<()>
    where
        L: StakeLedger,
    {
        let ended = self.observed_lockup_cycle;

        self.total_coins_inactive = ctx.stake()?.inactive;
        self.observed_lockup_cycle = ended.next();
        self.inactive_shares.insert(
            self.observed_lockup_cycle,
            SharesLedger::with_scaling_factor(ctx.config().shares_scaling_factor),
        );

        if self
            .inactive_shares
            .get(&ended)
            .is_some_and(|ledger| ledger.total_coins() == 0)
        {
            self.destroy_inactive_shares(ended);
        }

        info!(
            "{}: OLC {ended} ended, {} inactive",
            self.pool_address, self.total_coins_inactive
        );
        ctx.emit(DelegationPoolEvent::LockupCycleAdvanced {
            pool_address: self.pool_address,
            observed_lockup_cycle: self.observed_lockup_cycle,
            total_coins_inactive: self.total_coins_inactive,
        });
        Ok(())
    }
}
