//! Widened multiply-then-divide helpers
//!
//! All helpers floor, so the side performing the division keeps the
//! remainder.

use num::{BigUint, ToPrimitive};

/// `floor(x * y / z)` over a 256-bit wide intermediate.
///
/// Returns `None` on a zero divisor or when the quotient does not fit.
pub fn mul_div_u128(x: u128, y: u128, z: u128) -> Option<u128> {
    if z == 0 {
        return None;
    }

    match x.checked_mul(y) {
        Some(product) => Some(product / z),
        None => (BigUint::from(x) * BigUint::from(y) / BigUint::from(z)).to_u128(),
    }
}

/// `floor(x * y / z)` over a 128-bit intermediate
pub fn mul_div_u64(x: u64, y: u64, z: u64) -> Option<u64> {
    if z == 0 {
        return None;
    }

    u64::try_from(x as u128 * y as u128 / z as u128).ok()
}
