//! Outstanding balance of an annuity after a number of periods.
//!
//! Each period the remaining balance accrues interest and is reduced by that
//! period's payment:
//!
//! ```text
//! ((...(p*(1 + i) - a)*(1 + i) - a)...)*(1 + i) - a = balance
//! ```
//!
//! Unrolled, this is the future value of the principal minus the future value
//! of the payments made so far, which is what [`balance`] computes in closed
//! form. [`balance_iterative`] walks the recurrence instead and accepts a
//! different payment for every period.

use rust_decimal::Decimal;

use crate::error::{AnnuityError, AnnuityResult};
use crate::factors::{compounding_base, fv_factor, fv_factor_from_growth, growth_factor};

/// Balance remaining after `num_periods` regular payments plus prepayments.
///
/// `prepayments[k - 1]` is the extra amount paid in period `k`; entries past
/// `num_periods` are ignored and a short list means no further prepayments.
pub fn balance(
    principal: Decimal,
    periodic_interest: Decimal,
    payment: Decimal,
    num_periods: u32,
    prepayments: &[Decimal],
) -> AnnuityResult<Decimal> {
    let fv_principal = principal
        .checked_mul(growth_factor(periodic_interest, num_periods)?)
        .ok_or_else(|| AnnuityError::overflow("future value of principal"))?;
    let fv_payments = payment
        .checked_mul(fv_factor(periodic_interest, num_periods)?)
        .ok_or_else(|| AnnuityError::overflow("future value of payments"))?;
    let fv_prepaid = fv_prepayments(periodic_interest, num_periods, prepayments)?;

    Ok(fv_principal - fv_payments - fv_prepaid)
}

/// Future value at period `num_periods` of the prepayments made up to then.
///
/// A prepayment made in period `k` compounds for `num_periods - k` periods.
pub fn fv_prepayments(
    periodic_interest: Decimal,
    num_periods: u32,
    prepayments: &[Decimal],
) -> AnnuityResult<Decimal> {
    let base = compounding_base(periodic_interest)?;
    let applied = prepayments.len().min(num_periods as usize);

    let mut value = Decimal::ZERO;
    for prepayment in &prepayments[..applied] {
        value = value
            .checked_mul(base)
            .and_then(|v| v.checked_add(*prepayment))
            .ok_or_else(|| AnnuityError::overflow("future value of prepayments"))?;
    }

    // compound the last applied prepayment through the remaining periods
    let remaining = num_periods - applied as u32;
    value
        .checked_mul(growth_factor(periodic_interest, remaining)?)
        .ok_or_else(|| AnnuityError::overflow("future value of prepayments"))
}

/// Balance after `num_periods` periods with an explicit payment per period.
///
/// `payments[k - 1]` is the full amount paid in period `k`.
pub fn balance_iterative(
    principal: Decimal,
    periodic_interest: Decimal,
    payments: &[Decimal],
    num_periods: u32,
) -> AnnuityResult<Decimal> {
    if payments.len() < num_periods as usize {
        return Err(AnnuityError::Computation(format!(
            "balance over {num_periods} periods needs at least {num_periods} payments, got {}",
            payments.len()
        )));
    }

    let base = compounding_base(periodic_interest)?;
    payments[..num_periods as usize]
        .iter()
        .try_fold(principal, |balance, payment| {
            balance
                .checked_mul(base)
                .map(|accrued| accrued - payment)
                .ok_or_else(|| AnnuityError::overflow("iterative balance"))
        })
}

/// Closed-form balances for consecutive periods.
///
/// Carries `(1 + i)^p` and the future value of the prepayments forward, so each
/// step costs the same regardless of how far into the schedule it is. The value
/// at period `p` matches [`balance`] over the same prepayments.
#[derive(Debug, Clone)]
pub struct BalanceProgression {
    principal: Decimal,
    periodic_interest: Decimal,
    payment: Decimal,
    base: Decimal,
    growth: Decimal,
    fv_prepaid: Decimal,
    period: u32,
}

impl BalanceProgression {
    /// Starts at period 0, where the balance is the principal.
    pub fn new(principal: Decimal, periodic_interest: Decimal, payment: Decimal) -> AnnuityResult<Self> {
        Ok(Self {
            principal,
            periodic_interest,
            payment,
            base: compounding_base(periodic_interest)?,
            growth: Decimal::ONE,
            fv_prepaid: Decimal::ZERO,
            period: 0,
        })
    }

    /// The last period accounted for.
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Balance after the current period.
    pub fn balance(&self) -> AnnuityResult<Decimal> {
        let fv_principal = self
            .principal
            .checked_mul(self.growth)
            .ok_or_else(|| AnnuityError::overflow("future value of principal"))?;
        let fv_payments = self
            .payment
            .checked_mul(fv_factor_from_growth(self.periodic_interest, self.period, self.growth))
            .ok_or_else(|| AnnuityError::overflow("future value of payments"))?;

        Ok(fv_principal - fv_payments - self.fv_prepaid)
    }

    /// Moves to the next period, applying `prepayment` in it, and returns the
    /// balance after that period.
    pub fn advance(&mut self, prepayment: Decimal) -> AnnuityResult<Decimal> {
        self.growth = self
            .growth
            .checked_mul(self.base)
            .ok_or_else(|| AnnuityError::overflow("growth factor"))?;
        self.fv_prepaid = self
            .fv_prepaid
            .checked_mul(self.base)
            .and_then(|v| v.checked_add(prepayment))
            .ok_or_else(|| AnnuityError::overflow("future value of prepayments"))?;
        self.period += 1;

        self.balance()
    }
}
