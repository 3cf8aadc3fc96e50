//! Scenario replay
//!
//! A scenario is a JSON list of pool operations and stake ledger controls
//! applied in order to a [PoolRegistry] backed by a [LocalStakeLedger]. The
//! report lists every pool and the views of every delegator it has seen.

use crate::{
    base::{address::Address, olc::ObservedLockupCycle},
    config::PoolConfig,
    event::DelegationPoolEvent,
    pool::views::DelegatorStake,
    registry::PoolRegistry,
    stake::{local::LocalStakeLedger, StakeLedger, StakeTotals},
};
use anyhow::Context;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, path::Path};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// `(numerator, denominator)` paid per epoch
    #[serde(default)]
    pub reward_rate: Option<(u64, u64)>,
    pub steps: Vec<ScenarioStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScenarioStep {
    InitializeDelegationPool {
        owner: Address,
        pool: Address,
        commission_percentage: u64,
    },
    AddStake {
        pool: Address,
        delegator: Address,
        amount: u64,
    },
    Unlock {
        pool: Address,
        delegator: Address,
        amount: u64,
    },
    ReactivateStake {
        pool: Address,
        delegator: Address,
        amount: u64,
    },
    Withdraw {
        pool: Address,
        delegator: Address,
        amount: u64,
    },
    Synchronize {
        pool: Address,
    },
    UpdateCommissionPercentage {
        owner: Address,
        commission_percentage: u64,
    },
    SetOperator {
        owner: Address,
        operator: Address,
    },
    SetDelegatedVoter {
        owner: Address,
        voter: Address,
    },
    SetBeneficiaryForOperator {
        operator: Address,
        beneficiary: Address,
    },

    // stake ledger controls
    JoinValidatorSet {
        pool: Address,
    },
    LeaveValidatorSet {
        pool: Address,
    },
    DistributeRewards {
        pool: Address,
        #[serde(default)]
        active: u64,
        #[serde(default)]
        pending_inactive: u64,
    },
    Slash {
        pool: Address,
        #[serde(default)]
        active: u64,
        #[serde(default)]
        pending_inactive: u64,
    },
    AdvanceTime {
        secs: u64,
    },
    EndEpoch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub now_secs: u64,
    pub pools: Vec<PoolReport>,
    pub events: Vec<DelegationPoolEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolReport {
    pub pool_address: Address,
    pub observed_lockup_cycle: ObservedLockupCycle,
    pub operator_commission_percentage: u64,
    pub total_active_value: u64,
    pub stake: StakeTotals,
    pub delegators: Vec<DelegatorReport>,

    /// Events emitted by this pool
    pub event_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatorReport {
    pub delegator: Address,
    #[serde(flatten)]
    pub stake: DelegatorStake,
    pub withdrawal_inactive: bool,
    pub withdrawal_amount: u64,
}

pub struct ScenarioRunner {
    registry: PoolRegistry,
    ledger: LocalStakeLedger,

    /// `(pool, delegator)` pairs to report on
    seen: BTreeSet<(Address, Address)>,
    events: Vec<DelegationPoolEvent>,
}

//////////
// impl //
//////////

impl Scenario {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing scenario {}", path.display()))
    }
}

impl ScenarioRunner {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            ledger: LocalStakeLedger::new(config.recurring_lockup_duration_secs),
            registry: PoolRegistry::new(config),
            seen: BTreeSet::new(),
            events: vec![],
        }
    }

    pub fn registry(&self) -> &PoolRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &LocalStakeLedger {
        &self.ledger
    }

    pub fn run(&mut self, scenario: &Scenario) -> anyhow::Result<ScenarioReport> {
        if let Some((rate, denominator)) = scenario.reward_rate {
            self.ledger.rewards_rate = rate;
            self.ledger.rewards_rate_denominator = denominator;
        }

        for (n, step) in scenario.steps.iter().enumerate() {
            self.apply(step)
                .with_context(|| format!("step {n}: {step:?}"))?;
        }

        info!("replayed {} steps", scenario.steps.len());
        self.report()
    }

    pub fn apply(&mut self, step: &ScenarioStep) -> anyhow::Result<()> {
        use ScenarioStep::*;

        debug!("{step:?}");
        let ledger = &mut self.ledger;
        let registry = &mut self.registry;

        match *step {
            InitializeDelegationPool {
                owner,
                pool,
                commission_percentage,
            } => {
                registry.initialize_delegation_pool(ledger, owner, pool, commission_percentage)?;
                self.seen.insert((pool, owner));
            }
            AddStake {
                pool,
                delegator,
                amount,
            } => {
                registry.add_stake(ledger, pool, delegator, amount)?;
                self.seen.insert((pool, delegator));
            }
            Unlock {
                pool,
                delegator,
                amount,
            } => registry.unlock(ledger, pool, delegator, amount)?,
            ReactivateStake {
                pool,
                delegator,
                amount,
            } => registry.reactivate_stake(ledger, pool, delegator, amount)?,
            Withdraw {
                pool,
                delegator,
                amount,
            } => {
                registry.withdraw(ledger, pool, delegator, amount)?;
            }
            Synchronize { pool } => registry.synchronize_delegation_pool(ledger, pool)?,
            UpdateCommissionPercentage {
                owner,
                commission_percentage,
            } => registry.update_commission_percentage(ledger, owner, commission_percentage)?,
            SetOperator { owner, operator } => {
                registry.set_operator(ledger, owner, operator)?;
                let pool = registry.get_owned_pool_address(owner)?;
                self.seen.insert((pool, registry.beneficiary_for_operator(operator)));
            }
            SetDelegatedVoter { owner, voter } => registry.set_delegated_voter(ledger, owner, voter)?,
            SetBeneficiaryForOperator {
                operator,
                beneficiary,
            } => {
                registry.set_beneficiary_for_operator(operator, beneficiary);
                let operated: Vec<Address> = registry
                    .pool_addresses()
                    .copied()
                    .filter(|pool| ledger.operator(*pool).is_ok_and(|op| op == operator))
                    .collect();
                for pool in operated {
                    self.seen.insert((pool, beneficiary));
                }
            }
            JoinValidatorSet { pool } => ledger.join_validator_set(pool)?,
            LeaveValidatorSet { pool } => ledger.leave_validator_set(pool)?,
            DistributeRewards {
                pool,
                active,
                pending_inactive,
            } => ledger.distribute_rewards(pool, active, pending_inactive)?,
            Slash {
                pool,
                active,
                pending_inactive,
            } => ledger.slash(pool, active, pending_inactive)?,
            AdvanceTime { secs } => ledger.advance_time(secs),
            EndEpoch => ledger.on_new_epoch(),
        }

        self.events.extend(self.registry.take_events());
        Ok(())
    }

    pub fn report(&self) -> anyhow::Result<ScenarioReport> {
        let mut pool_addresses: Vec<Address> = self.registry.pool_addresses().copied().collect();
        pool_addresses.sort();

        let mut pools = Vec::with_capacity(pool_addresses.len());
        for pool_address in pool_addresses {
            let state = self.registry.pool(pool_address)?;
            let mut delegators = vec![];

            for (_, delegator) in self.seen.iter().filter(|(pool, _)| *pool == pool_address) {
                let stake = self
                    .registry
                    .get_stake(&self.ledger, pool_address, *delegator)?;
                let (withdrawal_inactive, withdrawal_amount) =
                    self.registry
                        .get_pending_withdrawal(&self.ledger, pool_address, *delegator)?;

                delegators.push(DelegatorReport {
                    delegator: *delegator,
                    stake,
                    withdrawal_inactive,
                    withdrawal_amount,
                });
            }

            pools.push(PoolReport {
                pool_address,
                observed_lockup_cycle: state.observed_lockup_cycle(),
                operator_commission_percentage: self
                    .registry
                    .operator_commission_percentage(&self.ledger, pool_address)?,
                total_active_value: state.total_active_value(),
                stake: self
                    .registry
                    .get_delegation_pool_stake(&self.ledger, pool_address)?,
                delegators,
                event_count: self
                    .events
                    .iter()
                    .filter(|event| event.pool_address() == Some(pool_address))
                    .count(),
            });
        }

        Ok(ScenarioReport {
            now_secs: self.ledger.now_secs,
            pools,
            events: self.events.clone(),
        })
    }
}
