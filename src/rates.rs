//! Conversions between annual and periodic interest rates.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::error::{AnnuityError, AnnuityResult};

/// Converts an annual rate percentage into the periodic rate that compounds to
/// it over `periods_per_year` periods.
///
/// 12% a year over 12 periods is `1.12^(1/12) - 1`, about 0.9489% per period.
pub fn effective_periodic_rate(annual_percent: Decimal, periods_per_year: u32) -> AnnuityResult<Decimal> {
    if periods_per_year == 0 {
        return Err(AnnuityError::validation("periods_per_year", "must be at least 1"));
    }
    let base = Decimal::ONE + annual_percent / dec!(100);
    if base <= Decimal::ZERO {
        return Err(AnnuityError::validation(
            "annual_percent",
            format!("must be greater than -100, got {annual_percent}"),
        ));
    }

    let exponent = Decimal::ONE / Decimal::from(periods_per_year);
    let compounded = base
        .checked_powd(exponent)
        .ok_or_else(|| AnnuityError::overflow("periodic rate"))?;

    Ok(compounded - Decimal::ONE)
}

/// Nominal annual rate of a periodic rate, as a fraction (`i * m`).
pub fn nominal_annual_rate(periodic_interest: Decimal, periods_per_year: u32) -> Decimal {
    periodic_interest * Decimal::from(periods_per_year)
}
