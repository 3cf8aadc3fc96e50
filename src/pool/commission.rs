//! Operator commission schedule

use super::{context::PoolContext, NextCommission, PoolState};
use crate::{
    base::address::Address,
    constants::MAX_FEE,
    error::{DelegationPoolError, Result},
    event::DelegationPoolEvent,
    stake::StakeLedger,
};
use log::info;

impl PoolState {
    pub fn is_next_commission_percentage_effective(&self, now_secs: u64) -> bool {
        self.next_commission
            .is_some_and(|next| now_secs >= next.effective_after_secs)
    }

    /// Commission rate in effect at `now_secs`
    pub fn operator_commission_percentage(&self, now_secs: u64) -> u64 {
        match self.next_commission {
            Some(next) if now_secs >= next.effective_after_secs => {
                next.commission_percentage_next_lockup_cycle
            }
            _ => self.operator_commission_percentage,
        }
    }

    pub fn operator_commission_percentage_next_lockup_cycle(&self) -> u64 {
        self.next_commission
            .map(|next| next.commission_percentage_next_lockup_cycle)
            .unwrap_or(self.operator_commission_percentage)
    }

    /// Schedule `new_commission_percentage` from the end of the current
    /// lockup. The commission earned so far is paid at the old rate.
    pub fn update_commission_percentage<L>(
        &mut self,
        ctx: &mut PoolContext<'_, L>,
        owner: Address,
        new_commission_percentage: u64,
    ) -> Result<()>
    where
        L: StakeLedger,
    {
        if new_commission_percentage > MAX_FEE {
            return Err(DelegationPoolError::InvalidCommission(
                new_commission_percentage,
            ));
        }

        let config = ctx.config();
        let current = self.operator_commission_percentage(ctx.now_secs());
        if current.saturating_add(config.max_commission_increase) < new_commission_percentage {
            return Err(DelegationPoolError::CommissionIncreaseTooLarge {
                current,
                requested: new_commission_percentage,
                max_increase: config.max_commission_increase,
            });
        }

        let remaining = ctx.lockup_remaining_secs()?;
        let required = config.min_remaining_secs_for_commission_change();
        if remaining < required {
            return Err(DelegationPoolError::CommissionChangeTooLate {
                remaining,
                required,
            });
        }

        // also applies a previously scheduled change which became effective
        self.synchronize(ctx)?;

        self.next_commission = Some(NextCommission {
            commission_percentage_next_lockup_cycle: new_commission_percentage,
            effective_after_secs: ctx.lockup_expiration_secs()?,
        });

        info!(
            "{}: commission {new_commission_percentage} basis points from the next lockup cycle",
            self.pool_address
        );
        ctx.emit(DelegationPoolEvent::CommissionPercentageChange {
            pool_address: self.pool_address,
            owner,
            commission_percentage_next_lockup_cycle: new_commission_percentage,
        });
        Ok(())
    }
}
