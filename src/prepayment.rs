//! Extra amounts paid toward principal in specific periods.
//!
//! Prepayments usually arrive as a JSON list of `{period, payment}` entries:
//!
//! ```json
//! [
//!   {"period": 22, "payment": 3000},
//!   {"period": 30, "payment": 2000}
//! ]
//! ```

use std::collections::BTreeMap;
use std::io::Read;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AnnuityError, AnnuityResult};

/// One prepayment as it appears in an input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepaymentEntry {
    /// 1-based period the prepayment is made in.
    pub period: u32,
    /// Amount paid on top of the regular payment.
    pub payment: Decimal,
}

/// Sparse mapping from period to prepaid amount; absent periods prepay zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prepayments {
    by_period: BTreeMap<u32, Decimal>,
}

impl Prepayments {
    /// An empty mapping: no period prepays anything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `amount` for `period`, replacing an earlier amount for the same
    /// period.
    pub fn insert(&mut self, period: u32, amount: Decimal) -> AnnuityResult<()> {
        if period == 0 {
            return Err(AnnuityError::validation("prepayments", "periods start at 1"));
        }
        if amount < Decimal::ZERO {
            return Err(AnnuityError::validation(
                "prepayments",
                format!("amount for period {period} must not be negative, got {amount}"),
            ));
        }

        if let Some(previous) = self.by_period.insert(period, amount) {
            tracing::warn!(period, %previous, %amount, "prepayment period repeated, keeping the later amount");
        }
        Ok(())
    }

    /// Builds the mapping from entries in any order; a later entry for the
    /// same period replaces an earlier one.
    pub fn from_entries<I>(entries: I) -> AnnuityResult<Self>
    where
        I: IntoIterator<Item = PrepaymentEntry>,
    {
        let mut prepayments = Self::new();
        for entry in entries {
            prepayments.insert(entry.period, entry.payment)?;
        }
        Ok(prepayments)
    }

    /// Parses a JSON list of `{period, payment}` entries.
    pub fn from_json_str(json: &str) -> AnnuityResult<Self> {
        let entries: Vec<PrepaymentEntry> = serde_json::from_str(json)?;
        Self::from_entries(entries)
    }

    /// Reads a JSON list of `{period, payment}` entries, e.g. from a file.
    pub fn from_json_reader<R: Read>(reader: R) -> AnnuityResult<Self> {
        let entries: Vec<PrepaymentEntry> = serde_json::from_reader(reader)?;
        Self::from_entries(entries)
    }

    /// Amount prepaid in `period`, zero when none.
    pub fn get(&self, period: u32) -> Decimal {
        self.by_period.get(&period).copied().unwrap_or(Decimal::ZERO)
    }

    /// Whether no period prepays anything.
    pub fn is_empty(&self) -> bool {
        self.by_period.is_empty()
    }

    /// Number of periods with a prepayment.
    pub fn len(&self) -> usize {
        self.by_period.len()
    }

    /// Latest period with a prepayment.
    pub fn last_period(&self) -> Option<u32> {
        self.by_period.keys().next_back().copied()
    }

    /// Sum of all prepaid amounts.
    pub fn total(&self) -> Decimal {
        self.by_period.values().sum()
    }

    /// Fails when a prepayment falls after the last of `num_periods` periods.
    pub fn validate_within(&self, num_periods: u32) -> AnnuityResult<()> {
        match self.last_period() {
            Some(last) if last > num_periods => Err(AnnuityError::validation(
                "prepayments",
                format!("period {last} is past the last period {num_periods}"),
            )),
            _ => Ok(()),
        }
    }

    /// One amount per period for periods `1..=num_periods`, index 0 holding
    /// period 1.
    pub fn to_dense(&self, num_periods: u32) -> Vec<Decimal> {
        (1..=num_periods).map(|period| self.get(period)).collect()
    }

    /// Entries in period order.
    pub fn iter(&self) -> impl Iterator<Item = PrepaymentEntry> + '_ {
        self.by_period.iter().map(|(&period, &payment)| PrepaymentEntry { period, payment })
    }
}
