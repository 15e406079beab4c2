//! Error types for annuity resolution and schedule computation.

use rust_decimal::Decimal;
use thiserror::Error;

/// A specialized Result type for annuity computations.
pub type AnnuityResult<T> = Result<T, AnnuityError>;

/// Errors raised while validating, resolving or scheduling an annuity.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnnuityError {
    /// Malformed or insufficient input, rejected before any computation.
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// The rate cannot be recovered from the given principal and payment.
    #[error(
        "Invalid parameters: principal {principal}, payment {payment}, num_periods {num_periods} ({reason})"
    )]
    InvalidParameters {
        principal: Decimal,
        payment: Decimal,
        num_periods: u32,
        reason: String,
    },

    /// Arithmetic that cannot be carried out for the given arguments.
    #[error("Computation error: {0}")]
    Computation(String),

    /// The bisection budget ran out before reaching the tolerance.
    #[error("Convergence failed after {iterations} iterations (residual: {residual})")]
    ConvergenceFailed { iterations: u32, residual: Decimal },

    /// Structured input could not be parsed.
    #[error("Malformed input: {0}")]
    Serialization(String),
}

impl AnnuityError {
    pub(crate) fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AnnuityError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn overflow(context: &str) -> Self {
        AnnuityError::Computation(format!("decimal overflow in {context}"))
    }
}

impl From<serde_json::Error> for AnnuityError {
    fn from(e: serde_json::Error) -> Self {
        AnnuityError::Serialization(e.to_string())
    }
}
