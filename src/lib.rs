pub mod base;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ledger;
pub mod pool;
pub mod registry;
pub mod scenario;
pub mod stake;
pub mod utility;

pub use error::{DelegationPoolError, Result};
