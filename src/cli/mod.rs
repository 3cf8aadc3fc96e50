//! Command line arguments

use crate::constants::VERSION;
use log::LevelFilter;
use std::path::PathBuf;

/// Replay a delegation pool scenario against an in-memory stake ledger
#[derive(clap::Parser, Debug, Clone)]
#[command(name = "delegation-pool", author, version = VERSION, about, long_about = None)]
pub struct ScenarioArgs {
    /// Path to the scenario (JSON)
    #[arg(value_name = "FILE")]
    pub scenario: PathBuf,

    /// Path to the pool configuration (JSON), production defaults otherwise
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the configured minimum delegator balance
    #[arg(long)]
    pub min_coins_on_shares_pool: Option<u64>,

    /// Max stderr log level
    #[arg(long, default_value_t = LogLevelFilter::default())]
    pub log_level: LogLevelFilter,

    /// Pretty print the report
    #[arg(long)]
    pub pretty: bool,
}

/// Parsed `--log-level`, `warn` unless given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevelFilter(pub LevelFilter);

impl std::str::FromStr for LogLevelFilter {
    type Err = <LevelFilter as std::str::FromStr>::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LevelFilter::from_str(s).map(Self)
    }
}

impl Default for LogLevelFilter {
    fn default() -> Self {
        Self(LevelFilter::Warn)
    }
}

impl std::fmt::Display for LogLevelFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
