//! Pricing
//!
//! Minor-unit totalling and the single end-of-pipeline rounding step.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use thiserror::Error;

use crate::items::LineItem;

/// Errors that can occur while totalling prices or rounding amounts.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// Minor-unit arithmetic overflowed.
    #[error("price arithmetic overflowed minor units")]
    Overflow,
}

/// Calculates the minor-unit total of a single line (`unit_price × quantity`).
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the multiplication overflows `i64`.
pub fn line_total_minor(item: &LineItem<'_>) -> Result<i64, PricingError> {
    item.unit_price()
        .to_minor_units()
        .checked_mul(i64::from(item.quantity()))
        .ok_or(PricingError::Overflow)
}

/// Calculates the minor-unit total of a list of line items.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if any line total or the running sum
/// overflows `i64`.
pub fn items_total_minor<'i, 'a: 'i>(
    items: impl IntoIterator<Item = &'i LineItem<'a>>,
) -> Result<i64, PricingError> {
    items.into_iter().try_fold(0i64, |acc, item| {
        acc.checked_add(line_total_minor(item)?)
            .ok_or(PricingError::Overflow)
    })
}

/// Rounds a fractional minor-unit amount half-up to whole minor units.
///
/// The pipeline keeps intermediate discount amounts fractional and calls this
/// exactly once, on the final figure, to avoid compounding rounding drift.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the rounded amount does not fit in
/// `i64`.
pub fn round_minor(amount: Decimal) -> Result<i64, PricingError> {
    amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::Overflow)
}
