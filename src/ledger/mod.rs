//! Proportional ownership ledgers

pub mod shares;

pub use shares::SharesLedger;
