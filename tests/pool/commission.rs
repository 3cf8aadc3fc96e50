use crate::helpers::*;
use delegation_pool::{
    base::address::Address, error::DelegationPoolError, event::DelegationPoolEvent,
    pool::views::DelegatorStake,
};
use pretty_assertions::assert_eq;

const BENEFICIARY: u64 = 0xbe;

#[test]
fn commission_paid_to_beneficiary() -> anyhow::Result<()> {
    let (mut registry, mut ledger) = setup_pool(1_000)?;

    registry.add_stake(&mut ledger, POOL.into(), A.into(), 1_000)?;
    registry.set_beneficiary_for_operator(OWNER.into(), BENEFICIARY.into());
    ledger.distribute_rewards(POOL.into(), 100, 0)?;

    // 10% of the rewards, visible before synchronizing
    assert_eq!(
        registry.get_stake(&ledger, POOL.into(), BENEFICIARY.into())?,
        DelegatorStake {
            active: 10,
            inactive: 0,
            pending_inactive: 0,
        }
    );
    assert_eq!(
        registry.get_stake(&ledger, POOL.into(), A.into())?.active,
        1_090
    );

    registry.synchronize_delegation_pool(&mut ledger, POOL.into())?;
    let state = registry.pool(POOL.into())?;

    // commission shares are bought after the rebase and round down
    assert_eq!(state.active_shares().balance(&Address::from(A)), 1_090);
    assert_eq!(state.active_shares().balance(&Address::from(BENEFICIARY)), 9);
    assert!(!state.active_shares().contains(&Address::from(OWNER)));
    assert!(registry.events().contains(&DelegationPoolEvent::DistributeCommission {
        pool_address: POOL.into(),
        operator: OWNER.into(),
        beneficiary: BENEFICIARY.into(),
        commission_active: 10,
        commission_pending_inactive: 0,
    }));
    Ok(())
}

#[test]
fn no_commission_on_slashing() -> anyhow::Result<()> {
    let (mut registry, mut ledger) = setup_pool(1_000)?;

    registry.add_stake(&mut ledger, POOL.into(), A.into(), 1_000)?;
    registry.add_stake(&mut ledger, POOL.into(), B.into(), 1_000)?;
    ledger.slash(POOL.into(), 200, 0)?;
    registry.synchronize_delegation_pool(&mut ledger, POOL.into())?;

    let state = registry.pool(POOL.into())?;
    assert_eq!(state.active_shares().total_coins(), 1_800);
    assert_eq!(state.active_shares().balance(&Address::from(A)), 900);
    assert_eq!(state.active_shares().balance(&Address::from(B)), 900);
    assert!(!state.active_shares().contains(&Address::from(OWNER)));
    Ok(())
}

#[test]
fn commission_change_takes_effect_next_lockup_cycle() -> anyhow::Result<()> {
    let (mut registry, mut ledger) = setup_pool(1_000)?;
    activate(&mut ledger)?;

    registry.update_commission_percentage(&mut ledger, OWNER.into(), 1_500)?;
    assert_eq!(registry.operator_commission_percentage(&ledger, POOL.into())?, 1_000);
    assert_eq!(
        registry.operator_commission_percentage_next_lockup_cycle(POOL.into())?,
        1_500
    );

    // only the owner may change it
    assert_eq!(
        registry.update_commission_percentage(&mut ledger, A.into(), 1_500),
        Err(DelegationPoolError::NotOwner(A.into()))
    );
    assert_eq!(
        registry.update_commission_percentage(&mut ledger, OWNER.into(), 10_001),
        Err(DelegationPoolError::InvalidCommission(10_001))
    );
    assert_eq!(
        registry.update_commission_percentage(&mut ledger, OWNER.into(), 2_100),
        Err(DelegationPoolError::CommissionIncreaseTooLarge {
            current: 1_000,
            requested: 2_100,
            max_increase: 1_000,
        })
    );

    // too close to the end of the lockup
    ledger.advance_time(80);
    assert_eq!(
        registry.update_commission_percentage(&mut ledger, OWNER.into(), 500),
        Err(DelegationPoolError::CommissionChangeTooLate {
            remaining: 20,
            required: 25,
        })
    );

    ledger.advance_time(20);
    assert_eq!(registry.operator_commission_percentage(&ledger, POOL.into())?, 1_500);

    registry.synchronize_delegation_pool(&mut ledger, POOL.into())?;
    let state = registry.pool(POOL.into())?;
    assert_eq!(state.next_commission(), None);
    assert_eq!(state.operator_commission_percentage(0), 1_500);

    let events = registry.take_events();
    assert_eq!(
        events,
        vec![DelegationPoolEvent::CommissionPercentageChange {
            pool_address: POOL.into(),
            owner: OWNER.into(),
            commission_percentage_next_lockup_cycle: 1_500,
        }]
    );
    Ok(())
}

#[test]
fn operator_change_pays_outgoing_operator() -> anyhow::Result<()> {
    const NEW_OPERATOR: u64 = 0x2;
    let (mut registry, mut ledger) = setup_pool(1_000)?;

    registry.add_stake(&mut ledger, POOL.into(), A.into(), 1_000)?;
    ledger.distribute_rewards(POOL.into(), 100, 0)?;
    registry.set_operator(&mut ledger, OWNER.into(), NEW_OPERATOR.into())?;

    let state = registry.pool(POOL.into())?;
    assert_eq!(state.active_shares().balance(&Address::from(OWNER)), 9);
    assert!(!state.active_shares().contains(&Address::from(NEW_OPERATOR)));
    assert_eq!(
        registry.take_events().last(),
        Some(&DelegationPoolEvent::OperatorChange {
            pool_address: POOL.into(),
            old_operator: OWNER.into(),
            new_operator: NEW_OPERATOR.into(),
        })
    );
    Ok(())
}
