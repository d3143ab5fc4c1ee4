use anchor_lang::prelude::*;

use crate::{
    constants::NICR_PRECISION,
    errors::MathError,
};

pub fn safe_add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or(MathError::Overflow.into())
}

pub fn safe_sub(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b).ok_or(MathError::Overflow.into())
}

pub fn safe_add_u128(a: u128, b: u128) -> Result<u128> {
    a.checked_add(b).ok_or(MathError::Overflow.into())
}

pub fn safe_sub_u128(a: u128, b: u128) -> Result<u128> {
    a.checked_sub(b).ok_or(MathError::Overflow.into())
}

/// `x * y / z` with a u128 intermediate, rounded down.
pub fn mul_div(x: u64, y: u64, z: u64) -> Result<u64> {
    require!(z > 0, MathError::DivideByZero);
    let res = (x as u128)
        .checked_mul(y.into())
        .ok_or(MathError::Overflow)?
        / (z as u128);
    u64::try_from(res).map_err(|_| MathError::Overflow.into())
}

pub fn to_u64(value: u128) -> Result<u64> {
    u64::try_from(value).map_err(|_| MathError::Overflow.into())
}

pub fn compute_cr(coll: u64, debt: u64, price: u64) -> Option<u64> {
    if debt > 0 {
        return u64::try_from(
            (coll as u128)
                .checked_mul(price.into())?
                .checked_div(debt.into())?,
        )
        .ok()
        .or(Some(u64::MAX));
    }
    Some(u64::MAX)
}

pub fn compute_nominal_cr(coll: u64, debt: u64) -> Option<u64> {
    if debt > 0 {
        return u64::try_from(
            (coll as u128)
                .checked_mul(NICR_PRECISION.into())?
                .checked_div(debt.into())?,
        )
        .ok()
        .or(Some(u64::MAX));
    }
    Some(u64::MAX)
}
