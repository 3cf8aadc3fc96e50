use crate::helpers::*;
use delegation_pool::{
    base::{address::Address, olc::ObservedLockupCycle},
    error::DelegationPoolError,
    event::DelegationPoolEvent,
    pool::views::DelegatorStake,
    stake::StakeLedger,
};
use pretty_assertions::assert_eq;

#[test]
fn deposit_reward_unlock_withdraw() -> anyhow::Result<()> {
    let (mut registry, mut ledger) = setup_pool(0)?;

    registry.add_stake(&mut ledger, POOL.into(), A.into(), 100)?;
    activate(&mut ledger)?;
    assert_eq!(ledger.lockup_expiration_secs(POOL.into())?, LOCKUP_SECS);

    // rewards double the pool
    ledger.distribute_rewards(POOL.into(), 100, 0)?;
    assert_eq!(
        registry.get_stake(&ledger, POOL.into(), A.into())?,
        DelegatorStake {
            active: 200,
            inactive: 0,
            pending_inactive: 0,
        }
    );

    // half of it is unlocked into OLC 0
    registry.unlock(&mut ledger, POOL.into(), A.into(), 100)?;
    let state = registry.pool(POOL.into())?;

    assert_eq!(
        state.pending_withdrawal(&Address::from(A)),
        Some(ObservedLockupCycle(0))
    );
    assert_eq!(state.pending_inactive_shares().balance(&Address::from(A)), 100);
    assert_eq!(
        registry.get_stake(&ledger, POOL.into(), A.into())?,
        DelegatorStake {
            active: 100,
            inactive: 0,
            pending_inactive: 100,
        }
    );
    assert_eq!(
        registry.get_pending_withdrawal(&ledger, POOL.into(), A.into())?,
        (false, 100)
    );

    // the lockup ends and the stake pool inactivates the unlocked stake
    ledger.advance_time(LOCKUP_SECS);
    ledger.on_new_epoch();
    assert_eq!(ledger.get_stake(POOL.into())?.inactive, 100);

    // views see the withdrawal as inactive before the pool synchronizes
    assert_eq!(
        registry.get_pending_withdrawal(&ledger, POOL.into(), A.into())?,
        (true, 100)
    );

    registry.synchronize_delegation_pool(&mut ledger, POOL.into())?;
    let state = registry.pool(POOL.into())?;

    assert_eq!(state.observed_lockup_cycle(), ObservedLockupCycle(1));
    assert_eq!(state.total_coins_inactive(), 100);
    assert_eq!(
        state
            .inactive_shares_at(ObservedLockupCycle(0))
            .map(|ledger| ledger.total_coins()),
        Some(100)
    );
    assert!(state.inactive_shares_at(ObservedLockupCycle(1)).is_some());

    // full withdrawal drains and removes the OLC 0 ledger
    assert_eq!(registry.withdraw(&mut ledger, POOL.into(), A.into(), 100)?, 100);
    let state = registry.pool(POOL.into())?;

    assert!(state.inactive_shares_at(ObservedLockupCycle(0)).is_none());
    assert_eq!(state.pending_withdrawal(&Address::from(A)), None);
    assert_eq!(state.total_coins_inactive(), 0);
    assert_eq!(ledger.stake_pool(POOL.into())?.withdrawn, 100);
    assert_eq!(
        registry.get_stake(&ledger, POOL.into(), A.into())?,
        DelegatorStake {
            active: 100,
            inactive: 0,
            pending_inactive: 0,
        }
    );

    let events = registry.take_events();
    assert!(events.contains(&DelegationPoolEvent::LockupCycleAdvanced {
        pool_address: POOL.into(),
        observed_lockup_cycle: ObservedLockupCycle(1),
        total_coins_inactive: 100,
    }));
    assert_eq!(
        events.last(),
        Some(&DelegationPoolEvent::WithdrawStake {
            pool_address: POOL.into(),
            delegator_address: A.into(),
            amount_withdrawn: 100,
        })
    );
    Ok(())
}

#[test]
fn reactivate_pending_inactive() -> anyhow::Result<()> {
    let (mut registry, mut ledger) = setup_pool(0)?;

    registry.add_stake(&mut ledger, POOL.into(), A.into(), 100)?;
    registry.unlock(&mut ledger, POOL.into(), A.into(), 50)?;
    registry.reactivate_stake(&mut ledger, POOL.into(), A.into(), 30)?;

    assert_eq!(
        registry.get_stake(&ledger, POOL.into(), A.into())?,
        DelegatorStake {
            active: 80,
            inactive: 0,
            pending_inactive: 20,
        }
    );

    let stake = ledger.get_stake(POOL.into())?;
    assert_eq!(stake.active, 80);
    assert_eq!(stake.pending_inactive, 20);

    // reactivating the rest would leave 5 behind, so all 20 move
    registry.reactivate_stake(&mut ledger, POOL.into(), A.into(), 15)?;
    assert_eq!(
        registry.get_stake(&ledger, POOL.into(), A.into())?,
        DelegatorStake {
            active: 100,
            inactive: 0,
            pending_inactive: 0,
        }
    );
    assert_eq!(
        registry.pool(POOL.into())?.pending_withdrawal(&Address::from(A)),
        None
    );
    Ok(())
}

#[test]
fn delegators_share_rewards_pro_rata() -> anyhow::Result<()> {
    let (mut registry, mut ledger) = setup_pool(0)?;

    registry.add_stake(&mut ledger, POOL.into(), A.into(), 300)?;
    registry.add_stake(&mut ledger, POOL.into(), B.into(), 100)?;
    ledger.distribute_rewards(POOL.into(), 40, 0)?;

    // a deposit after the rewards does not earn any of them
    registry.add_stake(&mut ledger, POOL.into(), C.into(), 110)?;

    let active = |delegator: u64| -> anyhow::Result<u64> {
        Ok(registry.get_stake(&ledger, POOL.into(), delegator.into())?.active)
    };
    assert_eq!(active(A)?, 330);
    assert_eq!(active(B)?, 110);
    assert_eq!(active(C)?, 110);
    assert_eq!(registry.total_active_value(POOL.into())?, 550);
    assert_eq!(registry.shareholders_count_active_pool(POOL.into())?, 3);
    Ok(())
}

#[test]
fn oversized_deposit_is_rejected() -> anyhow::Result<()> {
    let (mut registry, mut ledger) = setup_pool(0)?;

    registry.add_stake(&mut ledger, POOL.into(), A.into(), u64::MAX - 15)?;
    let state = registry.pool(POOL.into())?.clone();
    let stake = ledger.get_stake(POOL.into())?;

    assert_eq!(
        registry.add_stake(&mut ledger, POOL.into(), B.into(), 100),
        Err(DelegationPoolError::Overflow)
    );
    assert_eq!(registry.pool(POOL.into())?, &state);
    assert_eq!(ledger.get_stake(POOL.into())?, stake);

    // what still fits is accepted
    registry.add_stake(&mut ledger, POOL.into(), B.into(), 15)?;
    assert_eq!(ledger.get_stake(POOL.into())?.active, u64::MAX);
    Ok(())
}
