//! Period-by-period split of each payment into interest and principal.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::annuity::Annuity;
use crate::balance::BalanceProgression;
use crate::error::{AnnuityError, AnnuityResult};
use crate::prepayment::Prepayments;
use crate::rounding::round_half_even;

/// Largest number of periods [`schedule`] lays out record by record.
///
/// Longer annuities are still valid; their balances are available through
/// [`crate::balance`] without materializing every period.
pub const MAX_SCHEDULE_PERIODS: u32 = 1_000_000;

/// Represents the payment details for a single period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    /// 1-based period number.
    pub period: u32,
    /// The portion of the payment that covers interest, in whole units.
    pub interest: Decimal,
    /// The portion of the payment that reduces the principal.
    pub principal: Decimal,
    /// The remaining balance after the payment and any prepayment.
    pub balance: Decimal,
}

/// Ledger account a posting is booked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingAccount {
    /// Interest charged for the period.
    Interest,
    /// Repayment of the amount borrowed.
    Principal,
}

/// One side of a payment, as a ledger writer books it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    /// 1-based period the posting belongs to.
    pub period: u32,
    /// Account the amount is booked against.
    pub account: PostingAccount,
    /// Amount booked, in the smallest currency unit.
    pub amount: Decimal,
}

impl ScheduleRecord {
    /// Splits the record into its interest and principal postings.
    pub fn postings(&self) -> [Posting; 2] {
        [
            Posting {
                period: self.period,
                account: PostingAccount::Interest,
                amount: self.interest,
            },
            Posting {
                period: self.period,
                account: PostingAccount::Principal,
                amount: self.principal,
            },
        ]
    }
}

/// Contains the amortization schedule of a resolved annuity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    /// The amount initially owed.
    pub principal: Decimal,
    /// The fixed payment per period.
    pub payment: Decimal,
    /// The rate applied each period.
    pub periodic_interest: Decimal,
    /// Sum of all prepayments.
    pub total_prepaid: Decimal,
    /// One record per period, in period order.
    pub records: Vec<ScheduleRecord>,
}

impl Schedule {
    /// Number of records, one per period.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the annuity has no periods.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in period order.
    pub fn iter(&self) -> std::slice::Iter<'_, ScheduleRecord> {
        self.records.iter()
    }

    /// Sum of the interest portions.
    pub fn total_interest(&self) -> Decimal {
        self.records.iter().map(|record| record.interest).sum()
    }

    /// Sum of the principal portions of the regular payments.
    pub fn total_principal(&self) -> Decimal {
        self.records.iter().map(|record| record.principal).sum()
    }

    /// Regular payments plus prepayments.
    pub fn total_paid(&self) -> Decimal {
        self.payment * Decimal::from(self.records.len()) + self.total_prepaid
    }

    /// Balance after the last period; the principal when there are none.
    pub fn final_balance(&self) -> Decimal {
        self.records.last().map_or(self.principal, |record| record.balance)
    }

    /// Interest and principal postings for every period, in period order.
    pub fn postings(&self) -> impl Iterator<Item = Posting> + '_ {
        self.records.iter().flat_map(ScheduleRecord::postings)
    }
}

impl<'a> IntoIterator for &'a Schedule {
    type Item = &'a ScheduleRecord;
    type IntoIter = std::slice::Iter<'a, ScheduleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Interest accrued on `balance` over one period, rounded half to even to the
/// smallest currency unit.
pub fn period_interest_amount(balance: Decimal, periodic_interest: Decimal) -> Decimal {
    round_half_even(balance * periodic_interest)
}

/// Computes the amortization schedule of `annuity` with `prepayments`.
///
/// For each period the interest is charged on the balance left after the
/// previous period, the rest of the regular payment reduces the principal, and
/// the balance after the period is the closed-form balance including every
/// prepayment made so far. Balances are kept at full precision; only the
/// interest portion is rounded.
///
/// # Errors
///
/// Fails when the annuity has more than [`MAX_SCHEDULE_PERIODS`] periods, when
/// a prepayment falls past the last period, when the annuity's rate cannot be
/// resolved, or on decimal overflow.
pub fn schedule(annuity: &Annuity, prepayments: &Prepayments) -> AnnuityResult<Schedule> {
    let num_periods = annuity.num_periods();
    if num_periods > MAX_SCHEDULE_PERIODS {
        return Err(AnnuityError::validation(
            "num_periods",
            format!("a schedule covers at most {MAX_SCHEDULE_PERIODS} periods, got {num_periods}"),
        ));
    }
    prepayments.validate_within(num_periods)?;

    let principal = annuity.principal();
    let payment = annuity.payment();
    let periodic_interest = annuity.periodic_interest()?;

    let mut progression = BalanceProgression::new(principal, periodic_interest, payment)?;
    let mut balance_before = progression.balance()?;
    let mut records = Vec::with_capacity(num_periods as usize);

    for period in 1..=num_periods {
        let interest = period_interest_amount(balance_before, periodic_interest);
        let balance_after = progression.advance(prepayments.get(period))?;

        records.push(ScheduleRecord {
            period,
            interest,
            principal: payment - interest,
            balance: balance_after,
        });
        balance_before = balance_after;
    }

    tracing::debug!(
        num_periods,
        %payment,
        periodic_interest = %periodic_interest,
        prepayments = prepayments.len(),
        final_balance = %balance_before,
        "amortization schedule computed"
    );

    Ok(Schedule {
        principal,
        payment,
        periodic_interest,
        total_prepaid: prepayments.total(),
        records,
    })
}
