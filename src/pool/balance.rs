//! Minimum balance and fee arithmetic
//!
//! A delegator never keeps less than the configured minimum in the active or
//! pending inactive ledger. Requested amounts are adjusted to drain the source
//! ledger or to land above the minimum on the destination ledger.

use crate::{
    base::address::Address,
    constants::MAX_FEE,
    error::{DelegationPoolError, Result},
    ledger::SharesLedger,
    utility::math::mul_div_u128,
};

/// Shares to redeem for `amount` coins, capped at the holder's shares
pub fn amount_to_shares_to_redeem(
    ledger: &SharesLedger,
    holder: &Address,
    amount: u64,
) -> Result<u128> {
    if amount >= ledger.balance(holder) {
        Ok(ledger.shares(holder))
    } else {
        ledger.amount_to_shares(amount)
    }
}

/// Adjust `amount` moved from `src` to `dst` so neither balance of `holder`
/// lands strictly between zero and `min_coins`
pub fn coins_to_transfer_to_ensure_min_stake(
    src: &SharesLedger,
    dst: &SharesLedger,
    holder: &Address,
    amount: u64,
    min_coins: u64,
) -> Result<u64> {
    let mut amount = coins_to_redeem_to_ensure_min_stake(src, holder, amount, min_coins)?;

    let dst_balance = dst.balance(holder);
    if dst_balance.saturating_add(amount) < min_coins {
        // one extra coin absorbs the rounding of the redeem and buy in
        amount = min_coins - dst_balance + 1;
    }

    Ok(amount)
}

/// Redeem the whole balance of `holder` if the remainder would fall below
/// `min_coins`
pub fn coins_to_redeem_to_ensure_min_stake(
    src: &SharesLedger,
    holder: &Address,
    amount: u64,
    min_coins: u64,
) -> Result<u64> {
    let redeemed = src.shares_to_amount(amount_to_shares_to_redeem(src, holder, amount)?);
    let src_balance = src.balance(holder);

    if src_balance.saturating_sub(redeemed) < min_coins {
        Ok(src_balance)
    } else {
        Ok(amount)
    }
}

pub fn assert_min_balance(
    ledger: &SharesLedger,
    holder: &Address,
    bucket: &'static str,
    min_coins: u64,
) -> Result<()> {
    let balance = ledger.balance(holder);
    if balance < min_coins {
        return Err(DelegationPoolError::BalanceTooLow {
            holder: *holder,
            bucket,
            balance,
            minimum: min_coins,
        });
    }

    Ok(())
}

/// Fee offsetting the rewards `amount` would otherwise collect this epoch
/// without having been staked for it.
///
/// `fee = amount * rate' / (rate' + denominator')` where the rate is net of
/// the operator's commission.
pub fn add_stake_fee(
    amount: u64,
    (rewards_rate, rewards_rate_denominator): (u64, u64),
    commission_percentage: u64,
) -> u64 {
    if rewards_rate_denominator == 0 {
        return 0;
    }

    let rate = rewards_rate as u128 * MAX_FEE.saturating_sub(commission_percentage) as u128;
    let denominator = rewards_rate_denominator as u128 * MAX_FEE as u128;

    // the fee is strictly below `amount`
    mul_div_u128(amount as u128, rate, rate + denominator)
        .and_then(|fee| u64::try_from(fee).ok())
        .unwrap_or_default()
}
