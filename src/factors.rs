//! Closed forms for the geometric series behind a constant-payment annuity.
//!
//! With `v = (1 + i)^-1`, the value at period 0 of `n` unit payments made at
//! the end of each period is
//!
//! ```text
//! pv = v + v^2 + ... + v^n = (1 - (1 + i)^-n) / i
//! ```
//!
//! and the value of the same payments at period `n` is
//!
//! ```text
//! fv = 1 + (1 + i) + ... + (1 + i)^(n - 1) = ((1 + i)^n - 1) / i
//! ```
//!
//! Both series degenerate to `n` when the rate is zero.

use rust_decimal::{Decimal, MathematicalOps};

use crate::error::{AnnuityError, AnnuityResult};

pub(crate) fn compounding_base(periodic_interest: Decimal) -> AnnuityResult<Decimal> {
    let base = Decimal::ONE + periodic_interest;
    if base <= Decimal::ZERO {
        return Err(AnnuityError::Computation(format!(
            "periodic interest must be greater than -100%, got {periodic_interest}"
        )));
    }
    Ok(base)
}

/// `(1 + i)^n`: what one unit grows to after `n` periods.
pub fn growth_factor(periodic_interest: Decimal, num_periods: u32) -> AnnuityResult<Decimal> {
    compounding_base(periodic_interest)?
        .checked_powu(u64::from(num_periods))
        .ok_or_else(|| AnnuityError::overflow("growth factor"))
}

/// `(1 + i)^-n`: the value today of one unit paid after `n` periods.
///
/// Values below the decimal range underflow to zero.
pub fn discount_factor(periodic_interest: Decimal, num_periods: u32) -> AnnuityResult<Decimal> {
    let v = Decimal::ONE / compounding_base(periodic_interest)?;
    match v.checked_powu(u64::from(num_periods)) {
        Some(discount) => Ok(discount),
        // v <= 1 cannot overflow, so the only failure left is underflow
        None if v <= Decimal::ONE => Ok(Decimal::ZERO),
        None => Err(AnnuityError::overflow("discount factor")),
    }
}

/// Present-value factor of `n` unit payments at periodic rate `i`.
///
/// Multiply by the payment to get the principal the payments repay.
pub fn pv_factor(periodic_interest: Decimal, num_periods: u32) -> AnnuityResult<Decimal> {
    if periodic_interest.is_zero() {
        return Ok(Decimal::from(num_periods));
    }

    let discount = discount_factor(periodic_interest, num_periods)?;
    if discount == Decimal::ONE && num_periods > 0 {
        // rate below decimal precision
        return Ok(Decimal::from(num_periods));
    }

    Ok((Decimal::ONE - discount) / periodic_interest)
}

/// Future-value factor of `n` unit payments, each made at the end of its
/// period and compounded through period `n`.
pub fn fv_factor(periodic_interest: Decimal, num_periods: u32) -> AnnuityResult<Decimal> {
    if periodic_interest.is_zero() {
        return Ok(Decimal::from(num_periods));
    }

    let growth = growth_factor(periodic_interest, num_periods)?;
    Ok(fv_factor_from_growth(periodic_interest, num_periods, growth))
}

/// `fv_factor` for a caller that already holds `(1 + i)^n`.
pub(crate) fn fv_factor_from_growth(periodic_interest: Decimal, num_periods: u32, growth: Decimal) -> Decimal {
    if periodic_interest.is_zero() || (growth == Decimal::ONE && num_periods > 0) {
        return Decimal::from(num_periods);
    }
    (growth - Decimal::ONE) / periodic_interest
}
