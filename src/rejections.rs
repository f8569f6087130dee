//! Rejection Reasons
//!
//! Rejections are values, not errors crossing the engine boundary: the
//! engine always returns a result, and every rejection is definitive for the
//! given inputs. The `Display` strings are what the storefront shows to the
//! customer.

use thiserror::Error;

/// Terminal, user-displayable reasons a coupon fails validation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    /// The code matched no active promotion.
    #[error("This coupon code is not valid")]
    NotFound,

    /// The promotion's validity window has not started yet.
    #[error("This coupon is not active yet")]
    NotYetValid,

    /// The promotion's validity window has ended.
    #[error("This coupon has expired")]
    Expired,

    /// The promotion's global usage limit has been reached.
    #[error("This coupon has reached its redemption limit")]
    GloballyExhausted,

    /// The requesting customer has exhausted their per-customer limit.
    #[error("You have already used this coupon the maximum number of times")]
    PerCustomerExhausted,

    /// The cart subtotal is below the promotion's minimum.
    #[error("This coupon requires a minimum order of {minimum}")]
    BelowMinimum {
        /// Formatted minimum cart amount (e.g. "$50.00").
        minimum: String,
    },

    /// The customer fails the segment or email allow-list requirements.
    #[error("This coupon is not available for your account")]
    NotEligible,

    /// Scope resolution left no eligible items in the cart.
    #[error("This coupon does not apply to any item in your cart")]
    NotApplicable,

    /// Stacking rules rejected the candidate against the cart's other
    /// discounts (requires-bundle, exclusion list, stack-disabled).
    #[error("This coupon cannot be combined with the discounts in your cart")]
    IncompatibleWithCart,

    /// The promotion record is malformed for its declared discount type.
    /// Defensive: indicates upstream data corruption, and the engine fails
    /// closed rather than silently discounting zero.
    #[error("This coupon is misconfigured; please contact support")]
    InvalidPromotionType,
}
