//! Annuity parameters and the resolution of the one left unspecified.
//!
//! A loan of principal `p` repaid by `n` constant payments `a` at periodic
//! rate `i` satisfies
//!
//! ```text
//! p = a*((1 + i)^-1 + (1 + i)^-2 + ... + (1 + i)^-n) = a * pv_factor(i, n)
//! ```
//!
//! so any two of `p`, `a` and `i` (with `n`) determine the third.

use std::fmt;

use once_cell::sync::OnceCell;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AnnuityError, AnnuityResult};
use crate::factors::pv_factor;
use crate::rounding::round_half_even;
use crate::solver::{SolverConfig, solve_periodic_interest};

/// Payment that repays `principal` over `num_periods` periods, rounded half
/// to even to the smallest currency unit.
///
/// Over zero periods nothing accrues and the payment is the principal.
pub fn annuity_payment(principal: Decimal, periodic_interest: Decimal, num_periods: u32) -> AnnuityResult<Decimal> {
    if num_periods == 0 {
        return Ok(principal);
    }
    annuity_payment_unrounded(principal, periodic_interest, num_periods).map(round_half_even)
}

/// [`annuity_payment`] at full precision.
///
/// Smooth and monotone in the rate, which is what the rate search needs.
pub fn annuity_payment_unrounded(
    principal: Decimal,
    periodic_interest: Decimal,
    num_periods: u32,
) -> AnnuityResult<Decimal> {
    if num_periods == 0 {
        return Ok(principal);
    }
    let factor = pv_factor(periodic_interest, num_periods)?;
    principal.checked_div(factor).ok_or_else(|| {
        AnnuityError::Computation(format!(
            "cannot divide principal {principal} by present-value factor {factor}"
        ))
    })
}

/// Principal repaid by `num_periods` payments of `payment`.
pub fn annuity_principal(payment: Decimal, periodic_interest: Decimal, num_periods: u32) -> AnnuityResult<Decimal> {
    if num_periods == 0 {
        return Ok(payment);
    }
    payment
        .checked_mul(pv_factor(periodic_interest, num_periods)?)
        .ok_or_else(|| AnnuityError::overflow("annuity principal"))
}

/// The optional parameters of an annuity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnuityField {
    Principal,
    Payment,
    PeriodicInterest,
}

impl AnnuityField {
    /// Field name as it appears in inputs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnnuityField::Principal => "principal",
            AnnuityField::Payment => "payment",
            AnnuityField::PeriodicInterest => "periodic_interest",
        }
    }
}

impl fmt::Display for AnnuityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input parameters for an annuity, as read from a file or a command line.
///
/// Exactly two of `principal`, `payment` and `periodic_interest` must be set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnuityInput {
    /// Number of payment periods.
    pub num_periods: i64,
    /// Amount borrowed, in the smallest currency unit.
    #[serde(default)]
    pub principal: Option<Decimal>,
    /// Constant payment per period, in the smallest currency unit.
    #[serde(default)]
    pub payment: Option<Decimal>,
    /// Interest rate per period as a fraction (0.005 for 0.5%).
    #[serde(default)]
    pub periodic_interest: Option<Decimal>,
    /// Settings for recovering the rate when it is not given.
    #[serde(default)]
    pub solver: SolverConfig,
}

/// A constant-payment annuity with all four parameters resolvable.
///
/// A missing principal or payment is derived when the annuity is built. A
/// missing rate is searched for on the first call to
/// [`Annuity::periodic_interest`] and kept; concurrent first calls resolve it
/// once. A failed search is not kept and fails the same way on every call.
#[derive(Debug, Clone)]
pub struct Annuity {
    num_periods: u32,
    principal: Decimal,
    payment: Decimal,
    periodic_interest: OnceCell<Decimal>,
    derived: AnnuityField,
    solver: SolverConfig,
}

impl Annuity {
    /// Builds an annuity from `num_periods` and exactly two of the optional
    /// parameters.
    ///
    /// # Errors
    ///
    /// Returns [`AnnuityError::Validation`] when `num_periods` is negative,
    /// when not exactly two parameters are given, when the rate lies outside
    /// `[0, 1]`, when an amount is not a positive whole number of units, or
    /// when a derived payment rounds to zero.
    pub fn new(
        num_periods: i64,
        principal: Option<Decimal>,
        payment: Option<Decimal>,
        periodic_interest: Option<Decimal>,
    ) -> AnnuityResult<Self> {
        let num_periods = u32::try_from(num_periods).map_err(|_| {
            AnnuityError::validation(
                "num_periods",
                format!("must be a non-negative integer no larger than {}, got {num_periods}", u32::MAX),
            )
        })?;

        if let Some(principal) = principal {
            validate_amount(AnnuityField::Principal, principal)?;
        }
        if let Some(payment) = payment {
            validate_amount(AnnuityField::Payment, payment)?;
        }
        if let Some(rate) = periodic_interest {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(AnnuityError::validation(
                    AnnuityField::PeriodicInterest.as_str(),
                    format!("must be in range [0, 1], got {rate}"),
                ));
            }
        }

        let annuity = match (principal, payment, periodic_interest) {
            (Some(principal), Some(payment), None) => Self {
                num_periods,
                principal,
                payment,
                periodic_interest: OnceCell::new(),
                derived: AnnuityField::PeriodicInterest,
                solver: SolverConfig::default(),
            },
            (Some(principal), None, Some(rate)) => Self {
                num_periods,
                principal,
                payment: derive_payment(principal, rate, num_periods)?,
                periodic_interest: OnceCell::with_value(rate),
                derived: AnnuityField::Payment,
                solver: SolverConfig::default(),
            },
            (None, Some(payment), Some(rate)) => Self {
                num_periods,
                principal: annuity_principal(payment, rate, num_periods)?,
                payment,
                periodic_interest: OnceCell::with_value(rate),
                derived: AnnuityField::Principal,
                solver: SolverConfig::default(),
            },
            _ => {
                let given: Vec<&str> = [
                    (AnnuityField::Principal, principal.is_some()),
                    (AnnuityField::Payment, payment.is_some()),
                    (AnnuityField::PeriodicInterest, periodic_interest.is_some()),
                ]
                .iter()
                .filter(|(_, present)| *present)
                .map(|(field, _)| field.as_str())
                .collect();
                return Err(AnnuityError::validation(
                    "annuity",
                    format!(
                        "exactly 2 of [principal, payment, periodic_interest] are required, got [{}]",
                        given.join(", ")
                    ),
                ));
            }
        };

        tracing::debug!(
            num_periods,
            derived = %annuity.derived,
            principal = %annuity.principal,
            payment = %annuity.payment,
            "annuity constructed"
        );
        Ok(annuity)
    }

    /// Replaces the settings used to search for a missing rate.
    #[must_use]
    pub fn with_solver_config(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Number of payment periods.
    pub fn num_periods(&self) -> u32 {
        self.num_periods
    }

    /// Amount borrowed, given or derived from the payment and rate.
    pub fn principal(&self) -> Decimal {
        self.principal
    }

    /// Constant payment per period, rounded to the unit when derived.
    pub fn payment(&self) -> Decimal {
        self.payment
    }

    /// The rate per period, searched for on first use when not given.
    ///
    /// # Errors
    ///
    /// Returns [`AnnuityError::InvalidParameters`] when no rate reproduces the
    /// payment, or [`AnnuityError::ConvergenceFailed`] when the search budget
    /// runs out.
    pub fn periodic_interest(&self) -> AnnuityResult<Decimal> {
        self.periodic_interest
            .get_or_try_init(|| {
                let result = solve_periodic_interest(
                    self.principal,
                    self.payment,
                    self.num_periods,
                    annuity_payment_unrounded,
                    &self.solver,
                )?;
                tracing::debug!(
                    rate = %result.rate,
                    iterations = result.iterations,
                    "periodic interest resolved"
                );
                Ok(result.rate)
            })
            .copied()
    }

    /// Which parameter was not given and had to be derived.
    pub fn derived_field(&self) -> AnnuityField {
        self.derived
    }

    /// Whether [`Annuity::periodic_interest`] is already known.
    pub fn is_resolved(&self) -> bool {
        self.periodic_interest.get().is_some()
    }
}

impl TryFrom<AnnuityInput> for Annuity {
    type Error = AnnuityError;

    fn try_from(input: AnnuityInput) -> AnnuityResult<Self> {
        Ok(Annuity::new(input.num_periods, input.principal, input.payment, input.periodic_interest)?
            .with_solver_config(input.solver))
    }
}

/// The rounded payment must still repay something every period.
fn derive_payment(principal: Decimal, periodic_interest: Decimal, num_periods: u32) -> AnnuityResult<Decimal> {
    let payment = annuity_payment(principal, periodic_interest, num_periods)?;
    if payment <= Decimal::ZERO {
        return Err(AnnuityError::validation(
            AnnuityField::Payment.as_str(),
            format!(
                "principal {principal} over {num_periods} periods at rate {periodic_interest} rounds to a payment of {payment}"
            ),
        ));
    }
    Ok(payment)
}

fn validate_amount(field: AnnuityField, amount: Decimal) -> AnnuityResult<()> {
    if amount <= Decimal::ZERO || !amount.fract().is_zero() {
        return Err(AnnuityError::validation(
            field.as_str(),
            format!("must be a positive whole number of currency units, got {amount}"),
        ));
    }
    Ok(())
}
