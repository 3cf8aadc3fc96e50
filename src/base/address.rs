//! Account address type

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 32-byte account address, written as `0x`-prefixed hex with leading zeros
/// trimmed (e.g. `0x1`)
#[derive(PartialEq, Eq, Copy, Clone, Default, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; Address::LEN]);

//////////
// impl //
//////////

impl Address {
    pub const LEN: usize = 32;
    pub const ZERO: Self = Self([0; Self::LEN]);

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        self.0
    }
}

///////////
// serde //
///////////

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        crate::utility::serde::to_str(self, serializer)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        crate::utility::serde::from_str(deserializer)
    }
}

/////////////////
// conversions //
/////////////////

impl FromStr for Address {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() || digits.len() > 2 * Self::LEN {
            bail!("Invalid address: {s}")
        }

        let padded = format!("{digits:0>width$}", width = 2 * Self::LEN);
        let bytes = hex::decode(padded).with_context(|| format!("Invalid address: {s}"))?;

        let mut address = [0; Self::LEN];
        address.copy_from_slice(&bytes);
        Ok(Self(address))
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        let mut address = [0; Self::LEN];
        address[Self::LEN - 8..].copy_from_slice(&value.to_be_bytes());
        Self(address)
    }
}

impl From<[u8; Address::LEN]> for Address {
    fn from(value: [u8; Address::LEN]) -> Self {
        Self(value)
    }
}

/////////////
// display //
/////////////

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let encoded = hex::encode(self.0);
        let trimmed = encoded.trim_start_matches('0');

        if trimmed.is_empty() {
            write!(f, "0x0")
        } else {
            write!(f, "0x{trimmed}")
        }
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({self})")
    }
}

#[cfg(test)]
impl quickcheck::Arbitrary for Address {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        Self(std::array::from_fn(|_| u8::arbitrary(g)))
    }
}
