//! Delegator operations
//!
//! Every operation synchronizes first. Amounts moved between ledgers are
//! adjusted so no balance lands between zero and the configured minimum.

use super::{
    balance::{
        add_stake_fee, amount_to_shares_to_redeem, assert_min_balance,
        coins_to_redeem_to_ensure_min_stake, coins_to_transfer_to_ensure_min_stake,
    },
    context::PoolContext,
    PoolState,
};
use crate::{
    base::{address::Address, olc::ObservedLockupCycle},
    constants::NULL_SHAREHOLDER,
    error::{DelegationPoolError, Result},
    event::DelegationPoolEvent,
    stake::{RewardRate, StakeLedger},
};
use log::{debug, info, warn};

impl PoolState {
    /// Stake `amount` for `delegator`, minus the add_stake fee
    pub fn add_stake<L>(
        &mut self,
        ctx: &mut PoolContext<'_, L>,
        delegator: Address,
        amount: u64,
    ) -> Result<()>
    where
        L: StakeLedger + RewardRate,
    {
        if delegator == NULL_SHAREHOLDER {
            return Err(DelegationPoolError::ReservedAddress(delegator));
        }

        if amount == 0 {
            return Ok(());
        }

        self.synchronize(ctx)?;

        let add_stake_fee = self.add_stake_fee(ctx, amount)?;
        ctx.add_stake(amount)?;

        self.buy_in_active_shares(delegator, amount - add_stake_fee)?;
        assert_min_balance(
            &self.active_shares,
            &delegator,
            "active",
            ctx.config().min_coins_on_shares_pool,
        )?;

        // held until the epoch ends so they are not mistaken for rewards
        self.buy_in_active_shares(NULL_SHAREHOLDER, add_stake_fee)?;

        info!(
            "{}: {delegator} added {amount} (fee {add_stake_fee})",
            self.pool_address
        );
        ctx.emit(DelegationPoolEvent::AddStake {
            pool_address: self.pool_address,
            delegator_address: delegator,
            amount_added: amount,
            add_stake_fee,
        });
        Ok(())
    }

    /// Move `amount` of `delegator`'s active stake to pending inactive
    pub fn unlock<L>(
        &mut self,
        ctx: &mut PoolContext<'_, L>,
        delegator: Address,
        amount: u64,
    ) -> Result<()>
    where
        L: StakeLedger,
    {
        if amount == 0 {
            return Ok(());
        }

        self.synchronize(ctx)?;

        let available = ctx.stake()?.active;
        if amount > available {
            return Err(DelegationPoolError::InsufficientActiveStake {
                requested: amount,
                available,
            });
        }

        let min_coins = ctx.config().min_coins_on_shares_pool;
        let amount = coins_to_transfer_to_ensure_min_stake(
            &self.active_shares,
            self.pending_inactive_shares(),
            &delegator,
            amount,
            min_coins,
        )?;
        let amount = self.redeem_active_shares(delegator, amount)?;

        // pending active stake cannot be unlocked before it activates
        if amount > available {
            return Err(DelegationPoolError::InsufficientActiveStake {
                requested: amount,
                available,
            });
        }

        ctx.unlock(amount)?;
        self.buy_in_pending_inactive_shares(ctx, delegator, amount)?;
        assert_min_balance(
            self.pending_inactive_shares(),
            &delegator,
            "pending_inactive",
            min_coins,
        )?;

        info!("{}: {delegator} unlocked {amount}", self.pool_address);
        ctx.emit(DelegationPoolEvent::UnlockStake {
            pool_address: self.pool_address,
            delegator_address: delegator,
            amount_unlocked: amount,
        });
        Ok(())
    }

    /// Move `amount` of `delegator`'s pending withdrawal back to active.
    ///
    /// Pending inactive stake is reactivated on the stake pool, inactive stake
    /// of an ended cycle is withdrawn and staked again like a deposit.
    pub fn reactivate_stake<L>(
        &mut self,
        ctx: &mut PoolContext<'_, L>,
        delegator: Address,
        amount: u64,
    ) -> Result<()>
    where
        L: StakeLedger + RewardRate,
    {
        if amount == 0 {
            return Ok(());
        }

        self.synchronize(ctx)?;

        let Some(olc) = self.pending_withdrawal(&delegator) else {
            debug!("{}: {delegator} has nothing to reactivate", self.pool_address);
            return Ok(());
        };
        let Some(source) = self.inactive_shares.get(&olc) else {
            return Ok(());
        };

        let min_coins = ctx.config().min_coins_on_shares_pool;
        let amount = coins_to_transfer_to_ensure_min_stake(
            source,
            &self.active_shares,
            &delegator,
            amount,
            min_coins,
        )?;
        let amount = self.redeem_inactive_shares(delegator, amount, olc)?;

        if olc == self.observed_lockup_cycle {
            ctx.reactivate_stake(amount)?;
            self.buy_in_active_shares(delegator, amount)?;
        } else {
            self.withdraw_from_stake_pool(ctx, amount, olc)?;

            let add_stake_fee = self.add_stake_fee(ctx, amount)?;
            ctx.add_stake(amount)?;
            self.buy_in_active_shares(delegator, amount - add_stake_fee)?;
            self.buy_in_active_shares(NULL_SHAREHOLDER, add_stake_fee)?;
        }

        assert_min_balance(&self.active_shares, &delegator, "active", min_coins)?;

        info!(
            "{}: {delegator} reactivated {amount} from OLC {olc}",
            self.pool_address
        );
        ctx.emit(DelegationPoolEvent::ReactivateStake {
            pool_address: self.pool_address,
            delegator_address: delegator,
            amount_reactivated: amount,
        });
        Ok(())
    }

    /// Fee charged on stake added to a current epoch validator
    pub(crate) fn add_stake_fee<L>(&self, ctx: &PoolContext<'_, L>, amount: u64) -> Result<u64>
    where
        L: StakeLedger + RewardRate,
    {
        if !ctx.is_current_epoch_validator()? {
            return Ok(0);
        }

        Ok(add_stake_fee(
            amount,
            ctx.reward_rate(),
            self.operator_commission_percentage(ctx.now_secs()),
        ))
    }

    /// Withdraw up to `amount` of `delegator`'s pending withdrawal
    pub fn withdraw<L>(
        &mut self,
        ctx: &mut PoolContext<'_, L>,
        delegator: Address,
        amount: u64,
    ) -> Result<u64>
    where
        L: StakeLedger,
    {
        if amount == 0 {
            return Err(DelegationPoolError::ZeroAmount);
        }

        self.synchronize(ctx)?;
        self.withdraw_internal(ctx, delegator, amount)
    }

    /// Returns the coins withdrawn, 0 when nothing is withdrawable yet
    pub(crate) fn withdraw_internal<L>(
        &mut self,
        ctx: &mut PoolContext<'_, L>,
        delegator: Address,
        amount: u64,
    ) -> Result<u64>
    where
        L: StakeLedger,
    {
        if amount == 0 {
            return Ok(0);
        }

        let Some(olc) = self.pending_withdrawal(&delegator) else {
            warn!("{}: {delegator} has no pending withdrawal", self.pool_address);
            return Ok(0);
        };

        let mut amount = amount;
        if olc == self.observed_lockup_cycle {
            if !ctx.can_withdraw_pending_inactive()? {
                warn!(
                    "{}: {delegator} pending withdrawal is still locked",
                    self.pool_address
                );
                return Ok(0);
            }

            amount = coins_to_redeem_to_ensure_min_stake(
                self.pending_inactive_shares(),
                &delegator,
                amount,
                ctx.config().min_coins_on_shares_pool,
            )?;
        }

        let amount = self.redeem_inactive_shares(delegator, amount, olc)?;
        self.withdraw_from_stake_pool(ctx, amount, olc)?;

        info!(
            "{}: {delegator} withdrew {amount} from OLC {olc}",
            self.pool_address
        );
        ctx.emit(DelegationPoolEvent::WithdrawStake {
            pool_address: self.pool_address,
            delegator_address: delegator,
            amount_withdrawn: amount,
        });
        Ok(amount)
    }

    /// Withdraw `amount` redeemed from the ledger at `olc` out of the stake
    /// pool without inactivating anyone else's pending inactive stake
    fn withdraw_from_stake_pool<L>(
        &mut self,
        ctx: &mut PoolContext<'_, L>,
        amount: u64,
        olc: ObservedLockupCycle,
    ) -> Result<()>
    where
        L: StakeLedger,
    {
        if ctx.can_withdraw_pending_inactive()? {
            // the stake pool inactivates all pending inactive stake on
            // withdraw, so park what is not being withdrawn in active
            let mut excess = ctx.stake()?.pending_inactive;
            if olc == self.observed_lockup_cycle {
                excess = excess.saturating_sub(amount);
            }

            ctx.reactivate_stake(excess)?;
            ctx.withdraw(amount)?;
            ctx.unlock(excess)?;
        } else {
            ctx.withdraw(amount)?;
        }

        // not to be mistaken for slashing at the next synchronization
        self.total_coins_inactive = ctx.stake()?.inactive;
        Ok(())
    }

    /// Withdraw everything `delegator` has in an ended cycle
    pub(crate) fn execute_pending_withdrawal<L>(
        &mut self,
        ctx: &mut PoolContext<'_, L>,
        delegator: Address,
    ) -> Result<()>
    where
        L: StakeLedger,
    {
        if let Some(olc) = self.pending_withdrawal(&delegator) {
            if olc < self.observed_lockup_cycle {
                self.withdraw_internal(ctx, delegator, u64::MAX)?;
            }
        }

        Ok(())
    }

    pub(crate) fn set_operator<L>(
        &mut self,
        ctx: &mut PoolContext<'_, L>,
        new_operator: Address,
    ) -> Result<()>
    where
        L: StakeLedger,
    {
        // the outgoing operator is paid first
        self.synchronize(ctx)?;

        let old_operator = ctx.operator()?;
        ctx.set_operator(new_operator);

        info!("{}: operator {old_operator} -> {new_operator}", self.pool_address);
        ctx.emit(DelegationPoolEvent::OperatorChange {
            pool_address: self.pool_address,
            old_operator,
            new_operator,
        });
        Ok(())
    }

    pub(crate) fn set_delegated_voter<L>(
        &mut self,
        ctx: &mut PoolContext<'_, L>,
        new_voter: Address,
    ) -> Result<()>
    where
        L: StakeLedger,
    {
        self.synchronize(ctx)?;

        let old_voter = ctx.delegated_voter()?;
        ctx.set_delegated_voter(new_voter);

        info!("{}: voter {old_voter} -> {new_voter}", self.pool_address);
        ctx.emit(DelegationPoolEvent::DelegatedVoterChange {
            pool_address: self.pool_address,
            old_voter,
            new_voter,
        });
        Ok(())
    }

    ////////////
    // shares //
    ////////////

    /// Buying zero shares is skipped, the coins are left to the next
    /// synchronization
    pub(crate) fn buy_in_active_shares(&mut self, holder: Address, amount: u64) -> Result<u128> {
        if self.active_shares.amount_to_shares(amount)? == 0 {
            return Ok(0);
        }

        self.active_shares.buy_in(holder, amount)
    }

    /// Buy into the current cycle's ledger and record it as `holder`'s
    /// pending withdrawal, withdrawing any pending withdrawal of an ended cycle
    /// first
    pub(crate) fn buy_in_pending_inactive_shares<L>(
        &mut self,
        ctx: &mut PoolContext<'_, L>,
        holder: Address,
        amount: u64,
    ) -> Result<u128>
    where
        L: StakeLedger,
    {
        if self.pending_inactive_shares().amount_to_shares(amount)? == 0 {
            return Ok(0);
        }

        let new_shares = self.pending_inactive_shares_mut().buy_in(holder, amount)?;
        self.execute_pending_withdrawal(ctx, holder)?;

        let current = self.observed_lockup_cycle;
        let pending = *self.pending_withdrawals.entry(holder).or_insert(current);
        if pending != current {
            return Err(DelegationPoolError::PendingWithdrawalConflict {
                holder,
                pending,
                current,
            });
        }

        Ok(new_shares)
    }

    /// Returns the coins redeemed, at most `holder`'s balance
    pub(crate) fn redeem_active_shares(&mut self, holder: Address, amount: u64) -> Result<u64> {
        let shares = amount_to_shares_to_redeem(&self.active_shares, &holder, amount)?;
        if shares == 0 {
            return Ok(0);
        }

        self.active_shares.redeem_shares(holder, shares)
    }

    /// Redeem from the ledger at `olc`. Releases `holder`'s pending
    /// withdrawal once it holds no shares there and destroys a drained ledger
    /// of an ended cycle.
    pub(crate) fn redeem_inactive_shares(
        &mut self,
        holder: Address,
        amount: u64,
        olc: ObservedLockupCycle,
    ) -> Result<u64> {
        let Some(ledger) = self.inactive_shares.get_mut(&olc) else {
            return Ok(0);
        };

        let shares = amount_to_shares_to_redeem(ledger, &holder, amount)?;
        if shares == 0 {
            return Ok(0);
        }

        let redeemed = ledger.redeem_shares(holder, shares)?;
        if ledger.shares(&holder) == 0 {
            self.pending_withdrawals.remove(&holder);
        }

        let drained = ledger.total_coins() == 0;
        if drained && olc < self.observed_lockup_cycle {
            self.destroy_inactive_shares(olc);
        }

        Ok(redeemed)
    }

    /// Remove the ledger at `olc` together with the pending withdrawals still
    /// pointing at it
    pub(crate) fn destroy_inactive_shares(&mut self, olc: ObservedLockupCycle) {
        if let Some(ledger) = self.inactive_shares.remove(&olc) {
            for (holder, _) in ledger.holders() {
                if self.pending_withdrawals.get(holder) == Some(&olc) {
                    self.pending_withdrawals.remove(holder);
                }
            }

            debug!("{}: destroyed OLC {olc} ledger", self.pool_address);
        }
    }
}
