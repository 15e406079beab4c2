use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds an amount to the smallest currency unit, ties to even.
///
/// Ties-to-even keeps repeated per-period rounding from drifting the totals
/// of a long schedule in one direction.
pub fn round_half_even(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
}
