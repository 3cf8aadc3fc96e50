use anyhow::Context;
use clap::Parser;
use delegation_pool::{
    cli::ScenarioArgs,
    config::PoolConfig,
    scenario::{Scenario, ScenarioRunner},
};
use log::{debug, info};
use stderrlog::{ColorChoice, Timestamp};

fn main() -> anyhow::Result<()> {
    let args = ScenarioArgs::parse();

    stderrlog::new()
        .module(module_path!())
        .color(ColorChoice::Never)
        .timestamp(Timestamp::Microsecond)
        .verbosity(args.log_level.0)
        .init()
        .context("initializing logger")?;

    let mut config = match &args.config {
        Some(path) => PoolConfig::from_path(path)?,
        None => PoolConfig::default(),
    };
    if let Some(min_coins_on_shares_pool) = args.min_coins_on_shares_pool {
        config.min_coins_on_shares_pool = min_coins_on_shares_pool;
    }
    debug!("{config:?}");

    let scenario = Scenario::from_path(&args.scenario)?;
    info!(
        "replaying {} ({} steps)",
        args.scenario.display(),
        scenario.steps.len()
    );

    let report = ScenarioRunner::new(config).run(&scenario)?;
    let output = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };

    println!("{output}");
    Ok(())
}
