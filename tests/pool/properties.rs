use crate::helpers::*;
use delegation_pool::{
    base::{address::Address, olc::ObservedLockupCycle},
    ledger::SharesLedger,
    pool::PoolState,
    scenario::{ScenarioRunner, ScenarioStep},
    stake::{local::LocalStakeLedger, StakeLedger},
};
use quickcheck::{Arbitrary, Gen};

const DELEGATORS: [u64; 3] = [A, B, C];

fn arbitrary_step(g: &mut Gen) -> ScenarioStep {
    let pool = Address::from(POOL);
    let delegator = Address::from(*g.choose(&DELEGATORS).unwrap_or(&A));
    let amount = u64::arbitrary(g) % 500;

    match u8::arbitrary(g) % 12 {
        0 | 1 => ScenarioStep::AddStake {
            pool,
            delegator,
            amount: amount * 4,
        },
        2 | 3 => ScenarioStep::Unlock {
            pool,
            delegator,
            amount,
        },
        4 => ScenarioStep::ReactivateStake {
            pool,
            delegator,
            amount,
        },
        5 | 6 => ScenarioStep::Withdraw {
            pool,
            delegator,
            amount,
        },
        7 => ScenarioStep::DistributeRewards {
            pool,
            active: amount / 10,
            pending_inactive: amount / 20,
        },
        8 => ScenarioStep::Slash {
            pool,
            active: amount / 20,
            pending_inactive: amount / 40,
        },
        9 => ScenarioStep::AdvanceTime {
            secs: amount % (LOCKUP_SECS / 2),
        },
        10 => ScenarioStep::EndEpoch,
        _ => {
            if bool::arbitrary(g) {
                ScenarioStep::JoinValidatorSet { pool }
            } else {
                ScenarioStep::LeaveValidatorSet { pool }
            }
        }
    }
}

fn new_runner(commission_percentage: u64) -> anyhow::Result<ScenarioRunner> {
    let mut runner = ScenarioRunner::new(test_config());
    runner.apply(&ScenarioStep::InitializeDelegationPool {
        owner: OWNER.into(),
        pool: POOL.into(),
        commission_percentage,
    })?;
    Ok(runner)
}

fn snapshot(runner: &ScenarioRunner) -> anyhow::Result<(PoolState, LocalStakeLedger)> {
    Ok((
        runner.registry().pool(POOL.into())?.clone(),
        runner.ledger().clone(),
    ))
}

/// Every holder of inactive shares points at the one ledger it holds shares in
fn assert_single_pending_withdrawal(state: &PoolState) {
    for (olc, ledger) in state.inactive_shares() {
        for (holder, shares) in ledger.holders() {
            if *shares > 0 {
                assert_eq!(
                    state.pending_withdrawal(holder),
                    Some(*olc),
                    "{holder} holds shares at OLC {olc}"
                );
            }
        }
    }
}

/// Coins a ledger may leave untracked: a commission purchase worth less than
/// one share is skipped
fn rounding_allowance(shares_ledger: &SharesLedger) -> u128 {
    (shares_ledger.holder_count() as u128 + 1) * (shares_ledger.shares_to_amount(1) as u128 + 2)
}

/// Right after a synchronization the ledgers account for the stake pool up to
/// rounding, and no ledger owes its holders more than its coins
fn assert_conservation(state: &PoolState, ledger: &LocalStakeLedger) -> anyhow::Result<()> {
    let stake = ledger.get_stake(POOL.into())?;
    let tracked = state.total_tracked_coins();

    assert!(
        state.active_shares().total_coins() as u128
            <= stake.active as u128 + stake.pending_active as u128
    );
    assert!(state.pending_inactive_shares().total_coins() <= stake.pending_inactive);
    assert!(tracked <= stake.total());

    let shares_ledgers =
        || std::iter::once(state.active_shares()).chain(state.inactive_shares().values());
    let allowance: u128 = shares_ledgers().map(rounding_allowance).sum();
    assert!(
        stake.total() - tracked <= allowance,
        "{} untracked, allowance {allowance}",
        stake.total() - tracked
    );

    for shares_ledger in shares_ledgers() {
        let owed: u128 = shares_ledger
            .holders()
            .map(|(holder, _)| shares_ledger.balance(holder) as u128)
            .sum();
        assert!(owed <= shares_ledger.total_coins() as u128);
    }
    Ok(())
}

#[test]
fn random_operations_preserve_invariants() -> anyhow::Result<()> {
    let g = &mut Gen::new(1000);

    for n in 0..50 {
        let mut runner = new_runner(n * 100 % 2_000)?;
        let mut last_olc = ObservedLockupCycle(0);
        let mut last_total_coins_inactive = 0;
        let mut last_withdrawn = 0;

        for _ in 0..60 {
            let step = arbitrary_step(g);
            let before = snapshot(&runner)?;

            if runner.apply(&step).is_err() {
                // failed operations change nothing
                assert_eq!(snapshot(&runner)?, before, "{step:?}");
                continue;
            }

            let state = runner.registry().pool(POOL.into())?;
            assert!(state.observed_lockup_cycle() >= last_olc);
            last_olc = state.observed_lockup_cycle();
            assert_single_pending_withdrawal(state);

            runner.apply(&ScenarioStep::Synchronize { pool: POOL.into() })?;
            let (state, ledger) = snapshot(&runner)?;
            assert_conservation(&state, &ledger)?;

            // settled inactive stake only leaves through withdrawals
            let withdrawn = ledger.stake_pool(POOL.into())?.withdrawn;
            assert!(
                state.total_coins_inactive() + (withdrawn - last_withdrawn)
                    >= last_total_coins_inactive,
                "{step:?}"
            );
            last_total_coins_inactive = state.total_coins_inactive();
            last_withdrawn = withdrawn;
        }
    }

    Ok(())
}
