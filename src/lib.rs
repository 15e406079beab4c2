//! `annuity_finance` is a Rust library for resolving annuity parameters and
//! computing amortization schedules.
//!
//! An annuity here is a loan repaid by a fixed number of constant payments at a
//! constant periodic rate. Given the number of periods and any two of
//! - **principal**: the amount borrowed,
//! - **payment**: the constant amount paid each period,
//! - **periodic interest**: the rate charged per period,
//!
//! it derives the third, and from the resolved annuity it splits every
//! payment into interest and principal, optionally with extra prepayments in
//! chosen periods.
//!
//! Amounts are [`rust_decimal::Decimal`] values in the smallest currency unit
//! (cents, for example). Rates are fractions: `0.005` is 0.5% per period.
//!
//! ## Usage
//!
//! Add `annuity_finance` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! annuity_finance = "0.1.0"
//! rust_decimal = "1.39.0"
//! rust_decimal_macros = "1.39.0"
//! ```
//!
//! Then build an [`Annuity`] and pass it to [`schedule`]:
//!
//! ```rust
//! use annuity_finance::{schedule, Annuity, Prepayments};
//! use rust_decimal_macros::dec;
//!
//! fn main() {
//!     // 800,000.00 borrowed, 4,000.00 paid monthly for 30 years
//!     let annuity = Annuity::new(360, Some(dec!(80_000_000)), Some(dec!(400_000)), None).unwrap();
//!     let prepayments = Prepayments::from_json_str(r#"[{"period": 22, "payment": 300000}]"#).unwrap();
//!
//!     match schedule(&annuity, &prepayments) {
//!         Ok(result) => {
//!             println!("Monthly rate:   {}", result.periodic_interest.round_dp(8));
//!             println!("First interest: {}", result.records[0].interest);
//!             println!("Total interest: {}", result.total_interest());
//!         }
//!         Err(e) => {
//!             eprintln!("Error computing schedule: {}", e);
//!         }
//!     }
//! }
//! ```

pub mod annuity;
pub mod balance;
pub mod error;
pub mod factors;
pub mod prepayment;
pub mod rates;
pub mod rounding;
pub mod schedule;
pub mod solver;

pub use annuity::{
    Annuity, AnnuityField, AnnuityInput, annuity_payment, annuity_payment_unrounded, annuity_principal,
};
pub use balance::{BalanceProgression, balance, balance_iterative, fv_prepayments};
pub use error::{AnnuityError, AnnuityResult};
pub use factors::{discount_factor, fv_factor, growth_factor, pv_factor};
pub use prepayment::{PrepaymentEntry, Prepayments};
pub use rates::{effective_periodic_rate, nominal_annual_rate};
pub use rounding::round_half_even;
pub use schedule::{
    MAX_SCHEDULE_PERIODS, Posting, PostingAccount, Schedule, ScheduleRecord, period_interest_amount, schedule,
};
pub use solver::{RELATIVE_PRECISION, SolverConfig, SolverResult, solve_periodic_interest};
