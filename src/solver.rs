//! Recovers the periodic interest rate of an annuity by bisection.
//!
//! For a fixed principal and number of periods, the payment needed to repay
//! the principal never decreases as the rate rises: a higher rate shrinks the
//! present-value factor, so a larger payment is required to fund the same
//! principal. That makes the payment formula a monotone function of the rate
//! on `[0, 1]`, and halving the interval converges on the rate that
//! reproduces a target payment.
//!
//! The payment formula is passed in explicitly, so callers choose between the
//! unrounded formula (smooth, the default for [`crate::Annuity`]) and any
//! other variant.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{AnnuityError, AnnuityResult};

/// Default tolerance on the reproduced payment.
pub const DEFAULT_TOLERANCE: Decimal = dec!(0.0000000000000001);

/// Default bound on bisection steps.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Smallest tolerance, relative to the target payment, that decimal
/// arithmetic can still resolve.
pub const RELATIVE_PRECISION: Decimal = dec!(0.00000000000000000001);

/// Configuration for the interest rate search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Largest accepted gap between the target and the computed payment.
    pub tolerance: Decimal,
    /// Maximum number of bisection steps.
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl SolverConfig {
    /// Builds a configuration from a tolerance and a step budget.
    #[must_use]
    pub fn new(tolerance: Decimal, max_iterations: u32) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    /// Replaces the tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Replaces the step budget.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Tolerance applied when searching for `payment`.
    ///
    /// Never tighter than [`RELATIVE_PRECISION`] times the payment, so large
    /// payments converge at the precision decimal arithmetic carries.
    pub fn effective_tolerance(&self, payment: Decimal) -> Decimal {
        let floor = payment.abs() * RELATIVE_PRECISION;
        self.tolerance.max(floor)
    }
}

/// Outcome of a successful rate search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverResult {
    /// The periodic interest rate found.
    pub rate: Decimal,
    /// Bisection steps taken.
    pub iterations: u32,
    /// Target payment minus the payment computed at `rate`.
    pub residual: Decimal,
}

/// Finds the periodic rate in `[0, 1]` at which `formula` turns `principal`
/// over `num_periods` periods into `payment`.
///
/// `formula(principal, rate, num_periods)` must be non-decreasing in `rate`.
/// The search stops once the reproduced payment is within
/// [`SolverConfig::effective_tolerance`] of `payment`.
///
/// # Errors
///
/// * [`AnnuityError::InvalidParameters`] unless `0 < payment < principal`, or
///   when no rate in `[0, 1]` reproduces `payment`.
/// * [`AnnuityError::ConvergenceFailed`] when the tolerance is not reached
///   within `config.max_iterations` steps or at decimal precision.
/// * Any error returned by `formula`.
pub fn solve_periodic_interest<F>(
    principal: Decimal,
    payment: Decimal,
    num_periods: u32,
    formula: F,
    config: &SolverConfig,
) -> AnnuityResult<SolverResult>
where
    F: Fn(Decimal, Decimal, u32) -> AnnuityResult<Decimal>,
{
    let invalid = |reason: String| AnnuityError::InvalidParameters {
        principal,
        payment,
        num_periods,
        reason,
    };

    if principal <= Decimal::ZERO || payment <= Decimal::ZERO || payment >= principal {
        return Err(invalid("requires 0 < payment < principal".into()));
    }
    let tolerance = config.effective_tolerance(payment);

    let at_zero = formula(principal, Decimal::ZERO, num_periods)?;
    if (payment - at_zero).abs() <= tolerance {
        return Ok(SolverResult {
            rate: Decimal::ZERO,
            iterations: 0,
            residual: payment - at_zero,
        });
    }
    let at_one = formula(principal, Decimal::ONE, num_periods)?;
    if payment < at_zero || payment > at_one {
        return Err(invalid(format!(
            "no rate in [0, 1] yields this payment, which must lie between {at_zero} and {at_one}"
        )));
    }

    let mut lo = Decimal::ZERO;
    let mut hi = Decimal::ONE;
    let mut residual = payment - at_one;
    let mut iterations = 0;

    while iterations < config.max_iterations {
        iterations += 1;
        let mid = (lo + hi) / Decimal::TWO;
        let computed = formula(principal, mid, num_periods)?;
        residual = payment - computed;

        tracing::trace!(iteration = iterations, rate = %mid, residual = %residual, "bisection step");

        if residual.abs() <= tolerance {
            tracing::debug!(
                rate = %mid,
                iterations,
                residual = %residual,
                "periodic interest converged"
            );
            return Ok(SolverResult {
                rate: mid,
                iterations,
                residual,
            });
        }

        // the interval can no longer be split at decimal precision
        if mid == lo || mid == hi {
            break;
        }

        if computed > payment {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    tracing::warn!(
        %principal,
        %payment,
        num_periods,
        iterations,
        residual = %residual,
        "periodic interest search did not converge"
    );
    Err(AnnuityError::ConvergenceFailed { iterations, residual })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annuity::{annuity_payment, annuity_payment_unrounded};
    use rstest::rstest;

    #[test]
    fn test_mortgage_rate_reproduces_payment() {
        let config = SolverConfig::default();
        let result =
            solve_periodic_interest(dec!(800000), dec!(4000), 360, annuity_payment_unrounded, &config).unwrap();

        let recomputed = annuity_payment_unrounded(dec!(800000), result.rate, 360).unwrap();
        assert!((recomputed - dec!(4000)).abs() <= config.tolerance);
        assert!(result.iterations <= config.max_iterations);

        // a plausible mortgage rate, between 4% and 5% a year
        let annual = result.rate * dec!(12);
        assert!(annual > dec!(0.04) && annual < dec!(0.05), "annual rate {annual}");
    }

    #[test]
    fn test_large_payments_converge_at_decimal_precision() {
        let config = SolverConfig::default();
        let principal = dec!(100_000_000_000_000);
        let payment = dec!(500_000_000_000);
        let result = solve_periodic_interest(principal, payment, 360, annuity_payment_unrounded, &config).unwrap();

        let recomputed = annuity_payment_unrounded(principal, result.rate, 360).unwrap();
        assert!((recomputed - payment).abs() <= config.effective_tolerance(payment));
        assert!(result.iterations <= config.max_iterations);
    }

    #[test]
    fn test_effective_tolerance() {
        let config = SolverConfig::default();
        assert_eq!(config.effective_tolerance(dec!(4000)), DEFAULT_TOLERANCE);
        assert_eq!(config.effective_tolerance(dec!(500_000_000_000)), dec!(0.000000005));
        assert_eq!(
            config.with_tolerance(dec!(0.01)).effective_tolerance(dec!(500_000_000_000)),
            dec!(0.01)
        );
    }

    #[test]
    fn test_formula_is_a_strategy() {
        let linear = |principal: Decimal, rate: Decimal, _: u32| -> AnnuityResult<Decimal> { Ok(principal * rate) };
        let result = solve_periodic_interest(dec!(1000), dec!(250), 1, linear, &SolverConfig::default()).unwrap();

        assert_eq!(result.rate, dec!(0.25));
        assert_eq!(result.iterations, 2);
        assert_eq!(result.residual, Decimal::ZERO);
    }

    #[test]
    fn test_zero_rate_endpoint() {
        let result =
            solve_periodic_interest(dec!(1200), dec!(100), 12, annuity_payment_unrounded, &SolverConfig::default())
                .unwrap();
        assert_eq!(result.rate, Decimal::ZERO);
        assert_eq!(result.iterations, 0);
    }

    #[rstest]
    #[case(dec!(1000), dec!(1000), 12)]
    #[case(dec!(1000), dec!(1200), 12)]
    #[case(dec!(1000), dec!(0), 12)]
    #[case(dec!(1000), dec!(-5), 12)]
    #[case(dec!(0), dec!(10), 12)]
    // no interest can accrue over zero periods
    #[case(dec!(1000), dec!(900), 0)]
    // below principal / n, the rate would have to be negative
    #[case(dec!(1000), dec!(10), 12)]
    fn test_invalid_parameters(#[case] principal: Decimal, #[case] payment: Decimal, #[case] num_periods: u32) {
        let result = solve_periodic_interest(
            principal,
            payment,
            num_periods,
            annuity_payment_unrounded,
            &SolverConfig::default(),
        );
        match result {
            Err(AnnuityError::InvalidParameters {
                principal: p,
                payment: a,
                num_periods: n,
                ..
            }) => {
                assert_eq!((p, a, n), (principal, payment, num_periods));
            }
            other => panic!("expected InvalidParameters, got {other:?}"),
        }
    }

    #[test]
    fn test_unreachable_target_exhausts_budget() {
        // the rounded formula only produces whole units
        let config = SolverConfig::default().with_max_iterations(30);
        let result = solve_periodic_interest(dec!(800000), dec!(4000.5), 360, annuity_payment, &config);

        assert!(matches!(
            result,
            Err(AnnuityError::ConvergenceFailed { iterations: 30, .. })
        ));
    }

    #[test]
    fn test_formula_errors_propagate() {
        let failing = |_: Decimal, _: Decimal, _: u32| -> AnnuityResult<Decimal> {
            Err(AnnuityError::Computation("boom".into()))
        };
        let result = solve_periodic_interest(dec!(1000), dec!(100), 12, failing, &SolverConfig::default());
        assert_eq!(result, Err(AnnuityError::Computation("boom".into())));
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: SolverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SolverConfig::default());

        let config: SolverConfig = serde_json::from_str(r#"{"max_iterations": 40}"#).unwrap();
        assert_eq!(config.max_iterations, 40);
        assert_eq!(config.tolerance, DEFAULT_TOLERANCE);
    }
}
