//! Delegation pool base types

pub mod address;
pub mod olc;
