//! Shares ledger
//!
//! Tracks proportional ownership of a pool of coins. Coins are converted to
//! shares at the current price `total_coins / total_shares`, and every
//! conversion floors so that rounding dust stays in the pool.

use crate::{
    base::address::Address,
    error::{DelegationPoolError, Result},
    utility::math::mul_div_u128,
};
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharesLedger {
    total_coins: u64,
    total_shares: u128,
    shares: HashMap<Address, u128>,

    /// Shares minted per coin on an empty ledger
    scaling_factor: u64,
}

//////////
// impl //
//////////

impl SharesLedger {
    pub fn new() -> Self {
        Self::with_scaling_factor(1)
    }

    pub fn with_scaling_factor(scaling_factor: u64) -> Self {
        Self {
            total_coins: 0,
            total_shares: 0,
            shares: HashMap::new(),
            scaling_factor: scaling_factor.max(1),
        }
    }

    pub fn total_coins(&self) -> u64 {
        self.total_coins
    }

    pub fn total_shares(&self) -> u128 {
        self.total_shares
    }

    pub fn scaling_factor(&self) -> u64 {
        self.scaling_factor
    }

    pub fn holder_count(&self) -> usize {
        self.shares.len()
    }

    pub fn contains(&self, holder: &Address) -> bool {
        self.shares.contains_key(holder)
    }

    /// Shares owned by `holder`, 0 if absent
    pub fn shares(&self, holder: &Address) -> u128 {
        self.shares.get(holder).copied().unwrap_or_default()
    }

    /// Coin value of `holder`'s shares at the current price
    pub fn balance(&self, holder: &Address) -> u64 {
        self.shares_to_amount(self.shares(holder))
    }

    pub fn holders(&self) -> impl Iterator<Item = (&Address, &u128)> {
        self.shares.iter()
    }

    pub fn amount_to_shares(&self, amount: u64) -> Result<u128> {
        self.amount_to_shares_with_total_coins(amount, self.total_coins)
    }

    /// Shares worth `amount` if the pool held `total_coins`
    pub fn amount_to_shares_with_total_coins(&self, amount: u64, total_coins: u64) -> Result<u128> {
        if self.total_coins == 0 || self.total_shares == 0 {
            (amount as u128)
                .checked_mul(self.scaling_factor as u128)
                .ok_or(DelegationPoolError::Overflow)
        } else {
            mul_div_u128(amount as u128, self.total_shares, total_coins as u128)
                .ok_or(DelegationPoolError::Overflow)
        }
    }

    pub fn shares_to_amount(&self, shares: u128) -> u64 {
        self.shares_to_amount_with_total_coins(shares, self.total_coins)
    }

    /// Coin value of `shares` if the pool held `total_coins`
    pub fn shares_to_amount_with_total_coins(&self, shares: u128, total_coins: u64) -> u64 {
        self.shares_to_amount_with_total_stats(shares, total_coins, self.total_shares)
    }

    pub fn shares_to_amount_with_total_stats(
        &self,
        shares: u128,
        total_coins: u64,
        total_shares: u128,
    ) -> u64 {
        if self.total_coins == 0 || total_shares == 0 {
            return 0;
        }

        // shares <= total_shares keeps the quotient below total_coins
        mul_div_u128(shares, total_coins as u128, total_shares)
            .and_then(|amount| u64::try_from(amount).ok())
            .unwrap_or(u64::MAX)
    }

    /// Mint shares for `amount` coins at the current price, returns the
    /// shares minted
    pub fn buy_in(&mut self, holder: Address, amount: u64) -> Result<u128> {
        if amount == 0 {
            return Ok(0);
        }

        let new_shares = self.amount_to_shares(amount)?;
        let total_coins = self
            .total_coins
            .checked_add(amount)
            .ok_or(DelegationPoolError::Overflow)?;
        let total_shares = self
            .total_shares
            .checked_add(new_shares)
            .ok_or(DelegationPoolError::Overflow)?;

        self.total_coins = total_coins;
        self.total_shares = total_shares;

        // a zero share purchase does not create a holder
        if new_shares > 0 || self.contains(&holder) {
            *self.shares.entry(holder).or_default() += new_shares;
        }

        trace!("buy in {holder}: {amount} coins for {new_shares} shares");
        Ok(new_shares)
    }

    /// Burn `shares` of `holder`, returns the coins paid out
    pub fn redeem_shares(&mut self, holder: Address, shares: u128) -> Result<u64> {
        let owned = self.shares(&holder);
        if owned < shares {
            return Err(DelegationPoolError::InsufficientShares {
                holder,
                owned,
                requested: shares,
            });
        }

        if shares == 0 {
            return Ok(0);
        }

        let amount = self.shares_to_amount(shares);
        self.total_coins -= amount;
        self.total_shares -= shares;

        let remaining = owned - shares;
        if remaining == 0 {
            self.shares.remove(&holder);
        } else {
            self.shares.insert(holder, remaining);
        }

        trace!("redeem {holder}: {shares} shares for {amount} coins");
        Ok(amount)
    }

    /// Rebase the pool value, every holder's balance moves pro rata
    pub fn update_total_coins(&mut self, total_coins: u64) {
        self.total_coins = total_coins;
    }
}

impl Default for SharesLedger {
    fn default() -> Self {
        Self::new()
    }
}
