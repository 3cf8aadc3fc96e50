use crate::helpers::*;
use delegation_pool::{
    base::{address::Address, olc::ObservedLockupCycle},
    pool::views::DelegatorStake,
    scenario::{DelegatorReport, Scenario, ScenarioReport, ScenarioRunner},
};
use pretty_assertions::assert_eq;
use std::{path::Path, process::Command};

const SCENARIO: &str = r#"{
    "steps": [
        { "op": "initialize_delegation_pool", "owner": "0x1", "pool": "0x100", "commission_percentage": 1000 },
        { "op": "add_stake", "pool": "0x100", "delegator": "0xa", "amount": 1000 },
        { "op": "join_validator_set", "pool": "0x100" },
        { "op": "end_epoch" },
        { "op": "distribute_rewards", "pool": "0x100", "active": 100 },
        { "op": "unlock", "pool": "0x100", "delegator": "0xa", "amount": 200 },
        { "op": "advance_time", "secs": 100 },
        { "op": "end_epoch" },
        { "op": "withdraw", "pool": "0x100", "delegator": "0xa", "amount": 200 }
    ]
}"#;

fn write_file(dir: &Path, name: &str, contents: &str) -> anyhow::Result<std::path::PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}

fn check_report(report: &ScenarioReport) {
    let pool = &report.pools[0];

    assert_eq!(report.now_secs, 100);
    assert_eq!(pool.pool_address, Address::from(POOL));
    assert_eq!(pool.observed_lockup_cycle, ObservedLockupCycle(1));
    assert_eq!(pool.operator_commission_percentage, 1_000);
    assert_eq!(pool.stake.inactive, 0);
    assert_eq!(pool.stake.active, 901);
    assert_eq!(pool.event_count, 5);

    // the operator's commission on 100 rewards, rounded down on purchase,
    // and A's unlock of 200 rounded down to 199
    assert_eq!(
        pool.delegators,
        vec![
            DelegatorReport {
                delegator: OWNER.into(),
                stake: DelegatorStake {
                    active: 9,
                    inactive: 0,
                    pending_inactive: 0,
                },
                withdrawal_inactive: false,
                withdrawal_amount: 0,
            },
            DelegatorReport {
                delegator: A.into(),
                stake: DelegatorStake {
                    active: 891,
                    inactive: 0,
                    pending_inactive: 0,
                },
                withdrawal_inactive: false,
                withdrawal_amount: 0,
            },
        ]
    );
}

#[test]
fn replay_from_file() -> anyhow::Result<()> {
    let dir = setup_new_scenario_dir("scenario")?;
    let scenario_path = write_file(dir.path(), "scenario.json", SCENARIO)?;

    let scenario = Scenario::from_path(&scenario_path)?;
    assert_eq!(scenario.steps.len(), 9);

    let report = ScenarioRunner::new(test_config()).run(&scenario)?;
    check_report(&report);
    Ok(())
}

#[test]
fn missing_scenario() {
    let err = Scenario::from_path(Path::new("./does/not/exist.json")).unwrap_err();
    assert!(err.to_string().starts_with("reading scenario"));
}

#[test]
fn cli_prints_report() -> anyhow::Result<()> {
    let dir = setup_new_scenario_dir("scenario-cli")?;
    let scenario_path = write_file(dir.path(), "scenario.json", SCENARIO)?;
    let config_path = write_file(
        dir.path(),
        "config.json",
        r#"{ "shares_scaling_factor": 1, "recurring_lockup_duration_secs": 100 }"#,
    )?;

    let output = Command::new(env!("CARGO_BIN_EXE_delegation-pool"))
        .arg(&scenario_path)
        .arg("--config")
        .arg(&config_path)
        .args(["--min-coins-on-shares-pool", "10", "--pretty"])
        .output()?;
    assert!(output.status.success(), "{output:?}");

    let report: ScenarioReport = serde_json::from_slice(&output.stdout)?;
    check_report(&report);
    assert_eq!(report.events.len(), 5);
    Ok(())
}

#[test]
fn cli_reports_failing_step() -> anyhow::Result<()> {
    let dir = setup_new_scenario_dir("scenario-cli")?;
    let scenario_path = write_file(
        dir.path(),
        "scenario.json",
        r#"{ "steps": [ { "op": "synchronize", "pool": "0x100" } ] }"#,
    )?;

    let output = Command::new(env!("CARGO_BIN_EXE_delegation-pool"))
        .arg(&scenario_path)
        .output()?;
    assert!(!output.status.success());
    assert!(String::from_utf8(output.stderr)?.contains("step 0"));
    Ok(())
}
