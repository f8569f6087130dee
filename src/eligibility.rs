//! Eligibility Gate
//!
//! Ordered pre-checks a promotion must pass before any discount is computed.
//! The first failing check wins; later checks are not evaluated, so the
//! customer always sees the earliest applicable reason.

use jiff::Timestamp;

use crate::{
    cart::Cart,
    customers::{Customer, CustomerSegment},
    promotions::Promotion,
    rejections::Rejection,
};

/// Read-only view of the usage ledger for one promotion and one customer,
/// captured before validation starts.
///
/// The snapshot is deliberately not re-read during the pipeline: the
/// check-then-act gap between this read and the eventual redemption write is
/// closed at the transactional boundary, not here.
#[derive(Clone, Copy, Debug, Default)]
pub struct UsageSnapshot {
    /// Total redemptions across all customers.
    pub global: u64,

    /// Redemptions by the requesting customer.
    pub by_customer: u64,
}

/// Run the ordered eligibility checks for one promotion against one cart and
/// customer.
///
/// Check order: active flag, validity window, global usage limit, minimum
/// cart subtotal, customer eligibility, per-customer usage limit.
///
/// # Errors
///
/// Returns the [`Rejection`] for the first check that fails.
pub fn check(
    promotion: &Promotion<'_>,
    cart: &Cart<'_>,
    customer: &Customer,
    usage: UsageSnapshot,
    has_prior_paid_order: bool,
    now: Timestamp,
) -> Result<(), Rejection> {
    // An inactive promotion is indistinguishable from an unknown code.
    if !promotion.is_active {
        return Err(Rejection::NotFound);
    }

    if promotion.valid_from.is_some_and(|from| now < from) {
        return Err(Rejection::NotYetValid);
    }

    if promotion.valid_until.is_some_and(|until| now > until) {
        return Err(Rejection::Expired);
    }

    if promotion
        .limits
        .global
        .is_some_and(|limit| usage.global >= u64::from(limit))
    {
        return Err(Rejection::GloballyExhausted);
    }

    if let Some(minimum) = promotion.minimum_cart
        && cart.subtotal_minor() < minimum.to_minor_units()
    {
        return Err(Rejection::BelowMinimum {
            minimum: minimum.to_string(),
        });
    }

    customer_eligible(promotion, customer, has_prior_paid_order)?;

    if promotion
        .limits
        .per_customer
        .is_some_and(|limit| usage.by_customer >= u64::from(limit))
    {
        return Err(Rejection::PerCustomerExhausted);
    }

    Ok(())
}

/// Customer eligibility: an explicit email allow-list, when present, is the
/// whole decision; otherwise the segment requirement applies.
fn customer_eligible(
    promotion: &Promotion<'_>,
    customer: &Customer,
    has_prior_paid_order: bool,
) -> Result<(), Rejection> {
    if let Some(allowed) = &promotion.allowed_emails {
        let listed = customer
            .email_key()
            .is_some_and(|email| allowed.contains(&email));

        return if listed { Ok(()) } else { Err(Rejection::NotEligible) };
    }

    match promotion.segment {
        CustomerSegment::All => Ok(()),
        CustomerSegment::NewCustomers if !has_prior_paid_order => Ok(()),
        CustomerSegment::ReturningCustomers if has_prior_paid_order => Ok(()),
        // VIP membership is only expressible through an allow-list, so a
        // VIP-segment promotion without one fails closed.
        _ => Err(Rejection::NotEligible),
    }
}
