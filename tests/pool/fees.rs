use crate::helpers::*;
use delegation_pool::{
    base::address::Address, constants::NULL_SHAREHOLDER, event::DelegationPoolEvent,
    pool::views::DelegatorStake, stake::StakeLedger,
};
use pretty_assertions::assert_eq;

#[test]
fn deposit_during_epoch_pays_fee() -> anyhow::Result<()> {
    let (mut registry, mut ledger) = setup_pool(0)?;
    ledger.rewards_rate = 1;
    ledger.rewards_rate_denominator = 100;

    // no fee before the pool validates
    assert_eq!(registry.get_add_stake_fee(&ledger, POOL.into(), 1_010)?, 0);
    registry.add_stake(&mut ledger, POOL.into(), A.into(), 1_000)?;
    activate(&mut ledger)?;

    // 1% rewards: 1010 * 1 / 101
    assert_eq!(registry.get_add_stake_fee(&ledger, POOL.into(), 1_010)?, 10);
    registry.add_stake(&mut ledger, POOL.into(), B.into(), 1_010)?;

    let state = registry.pool(POOL.into())?;
    assert_eq!(state.active_shares().balance(&Address::from(B)), 1_000);
    assert_eq!(state.active_shares().balance(&NULL_SHAREHOLDER), 10);
    assert_eq!(ledger.get_stake(POOL.into())?.pending_active, 1_010);
    assert_eq!(
        registry.take_events().last(),
        Some(&DelegationPoolEvent::AddStake {
            pool_address: POOL.into(),
            delegator_address: B.into(),
            amount_added: 1_010,
            add_stake_fee: 10,
        })
    );

    // the epoch rewards A's active stake only, the fee makes B whole
    ledger.on_new_epoch();
    registry.synchronize_delegation_pool(&mut ledger, POOL.into())?;

    let state = registry.pool(POOL.into())?;
    assert!(!state.active_shares().contains(&NULL_SHAREHOLDER));
    assert_eq!(state.active_shares().total_coins(), 2_020);
    assert_eq!(
        registry.get_stake(&ledger, POOL.into(), A.into())?,
        DelegatorStake {
            active: 1_010,
            inactive: 0,
            pending_inactive: 0,
        }
    );
    assert_eq!(
        registry.get_stake(&ledger, POOL.into(), B.into())?,
        DelegatorStake {
            active: 1_010,
            inactive: 0,
            pending_inactive: 0,
        }
    );
    Ok(())
}

#[test]
fn commission_lowers_fee() -> anyhow::Result<()> {
    let (mut registry, mut ledger) = setup_pool(5_000)?;
    ledger.rewards_rate = 1;
    ledger.rewards_rate_denominator = 100;
    activate(&mut ledger)?;

    // delegators keep half the rewards: 2010 * 0.5 / 100.5
    assert_eq!(registry.get_add_stake_fee(&ledger, POOL.into(), 2_010)?, 10);

    registry.add_stake(&mut ledger, POOL.into(), A.into(), 2_010)?;
    assert_eq!(
        registry.get_stake(&ledger, POOL.into(), A.into())?.active,
        2_000
    );
    Ok(())
}

#[test]
fn fee_free_deposit_into_inactive_pool() -> anyhow::Result<()> {
    let (mut registry, mut ledger) = setup_pool(0)?;
    ledger.rewards_rate = 1;
    ledger.rewards_rate_denominator = 100;

    registry.add_stake(&mut ledger, POOL.into(), A.into(), 1_000)?;

    let state = registry.pool(POOL.into())?;
    assert_eq!(state.active_shares().balance(&Address::from(A)), 1_000);
    assert!(!state.active_shares().contains(&NULL_SHAREHOLDER));
    assert_eq!(ledger.get_stake(POOL.into())?.active, 1_000);
    Ok(())
}
