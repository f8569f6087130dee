//! Discount Calculation
//!
//! One pure computation per discount variant, dispatched once. All amounts
//! stay in fractional minor-unit [`Decimal`]s; the engine rounds a single
//! time at the end of the pipeline.

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::{
    items::LineItem,
    pricing::{self, PricingError},
};

/// Errors specific to discount calculations.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// No eligible items were provided; callers are expected to reject the
    /// promotion as inapplicable before computing a discount.
    #[error("no eligible items; cannot compute a discount")]
    NoItems,

    /// A percentage or minor-unit conversion could not be safely represented.
    #[error("discount conversion overflowed or was not finite")]
    Conversion,

    /// Errors bubbled up from line totalling.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Raw discount type tag as stored on a promotion record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscountKind {
    /// Percentage off the eligible subtotal.
    Percentage,

    /// Fixed currency amount off the eligible subtotal.
    FixedAmount,

    /// Buy X units, get up to Y further units at a percentage off.
    BuyXGetY,

    /// Waive the shipping cost.
    FreeShipping,
}

/// Typed discount variant, narrowed once from a raw promotion record.
///
/// Record fields belonging to other variants are ignored during narrowing,
/// never validated as "unexpectedly present".
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum DiscountSpec<'a> {
    /// Percentage off the eligible subtotal (e.g. "25% off").
    Percentage(Percentage),

    /// Fixed amount off, never exceeding the eligible subtotal.
    FixedAmount(Money<'a, Currency>),

    /// Buy `buy` units at full price, then `get` further units at
    /// `percent_off` off their unit price.
    BuyXGetY {
        /// Units that must be bought at full price.
        buy: u32,
        /// Maximum number of discounted units.
        get: u32,
        /// Fraction off each discounted unit's price.
        percent_off: Percentage,
    },

    /// Waive the caller-supplied shipping cost.
    FreeShipping,
}

/// Raw (pre-cap) discount amount for a spec over the eligible items, in
/// fractional minor units.
///
/// Operates on the eligible subset and its own subtotal, not the full cart.
/// `shipping_cost` is only consulted by [`DiscountSpec::FreeShipping`]; when
/// it is absent the discount resolves to zero with a soft warning rather
/// than blocking checkout.
///
/// # Errors
///
/// Returns [`DiscountError::NoItems`] when `eligible` is empty and
/// [`DiscountError::Conversion`] when the arithmetic cannot be safely
/// represented.
pub fn raw_discount(
    spec: &DiscountSpec<'_>,
    eligible: &[&LineItem<'_>],
    shipping_cost: Option<Money<'_, Currency>>,
) -> Result<Decimal, DiscountError> {
    if eligible.is_empty() {
        return Err(DiscountError::NoItems);
    }

    match spec {
        DiscountSpec::Percentage(percent) => {
            let subtotal = eligible_subtotal(eligible)?;

            percent_of(percent, subtotal)
        }
        DiscountSpec::FixedAmount(amount) => {
            let subtotal = eligible_subtotal(eligible)?;
            let amount = Decimal::from(amount.to_minor_units().max(0));

            Ok(amount.min(subtotal))
        }
        DiscountSpec::BuyXGetY {
            buy,
            get,
            percent_off,
        } => bxgy_discount(eligible, *buy, *get, percent_off),
        DiscountSpec::FreeShipping => match shipping_cost {
            Some(cost) => Ok(Decimal::from(cost.to_minor_units().max(0))),
            None => {
                warn!("no shipping cost available; free-shipping discount resolves to zero");

                Ok(Decimal::ZERO)
            }
        },
    }
}

/// Eligible-item subtotal as a decimal of minor units.
fn eligible_subtotal(eligible: &[&LineItem<'_>]) -> Result<Decimal, DiscountError> {
    let minor = pricing::items_total_minor(eligible.iter().copied())?;

    Decimal::from_i64(minor).ok_or(DiscountError::Conversion)
}

/// Fractional percentage of a decimal amount, left unrounded.
fn percent_of(percent: &Percentage, amount: Decimal) -> Result<Decimal, DiscountError> {
    ((*percent) * Decimal::ONE)
        .checked_mul(amount)
        .ok_or(DiscountError::Conversion)
}

/// Deterministic greedy buy-X-get-Y walk.
///
/// Lines are taken as (unit price, quantity) lots sorted by descending unit
/// price with stable ties (cart order), so the discount favours the customer
/// by discounting the priciest qualifying units first. The first `buy` units
/// count as bought; subsequent whole units, up to `get` of them, are
/// discounted. Buy-then-discount, not interleaved per item: alternate
/// orderings change the discount value. Quantities are consumed as counts;
/// units are never materialized individually.
fn bxgy_discount(
    eligible: &[&LineItem<'_>],
    buy: u32,
    get: u32,
    percent_off: &Percentage,
) -> Result<Decimal, DiscountError> {
    let mut lots: Vec<(i64, u32)> = eligible
        .iter()
        .map(|item| (item.unit_price().to_minor_units(), item.quantity()))
        .collect();

    // Stable sort: equal prices keep their cart order.
    lots.sort_by(|a, b| b.0.cmp(&a.0));

    let mut to_buy = buy;
    let mut to_discount = get;
    let mut total = Decimal::ZERO;

    for (unit_price, quantity) in lots {
        if to_discount == 0 {
            break;
        }

        let bought = quantity.min(to_buy);
        to_buy -= bought;

        let discounted = (quantity - bought).min(to_discount);

        if discounted == 0 {
            continue;
        }

        to_discount -= discounted;

        let lot_base = Decimal::from(unit_price)
            .checked_mul(Decimal::from(discounted))
            .ok_or(DiscountError::Conversion)?;

        total = total
            .checked_add(percent_of(percent_off, lot_base)?)
            .ok_or(DiscountError::Conversion)?;
    }

    Ok(total)
}
