//! Promotions
//!
//! The promotion record is a superset covering customer-entered coupons and
//! automatically-applied bundle discounts. Records arrive loosely populated
//! from the admin CRUD upstream: fields belonging to inactive discount types
//! are inert and ignored, never rejected as "unexpectedly present".

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use rusty_money::{Money, iso::Currency};

use crate::{
    customers::CustomerSegment,
    discounts::{DiscountKind, DiscountSpec},
    ids::{BundleId, PromotionId},
    rejections::Rejection,
    scope::Scope,
    stacking::Stacking,
};

/// Where a promotion candidate came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromotionSource {
    /// A customer-entered coupon code.
    Coupon,

    /// An automatically-applied bundle discount.
    Bundle(BundleId),
}

/// Redemption limits for a promotion. Counters live in the usage ledger;
/// these are the caps they are compared against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UsageLimits {
    /// Global redemption cap across all customers.
    pub global: Option<u32>,

    /// Redemption cap per customer identity.
    pub per_customer: Option<u32>,
}

/// A promotion record, read-only input to the engine.
#[derive(Clone, Debug)]
pub struct Promotion<'a> {
    /// Stable identifier; the usage ledger key.
    pub id: PromotionId,

    /// Case-insensitive match key. Absent for automatic promotions.
    pub code: Option<String>,

    /// Candidate source (coupon or bundle).
    pub source: PromotionSource,

    /// Inactive promotions behave as if the code did not exist.
    pub is_active: bool,

    /// Active discount type tag; exactly one type governs computation.
    pub discount_kind: DiscountKind,

    /// Percent points (0–100) for [`DiscountKind::Percentage`].
    pub discount_value: Option<Decimal>,

    /// Currency amount for [`DiscountKind::FixedAmount`].
    pub discount_amount: Option<Money<'a, Currency>>,

    /// Buy-X-get-Y: units that must be bought at full price.
    pub buy_quantity: Option<u32>,

    /// Buy-X-get-Y: maximum number of discounted units.
    pub get_quantity: Option<u32>,

    /// Buy-X-get-Y: percent points (0–100) off each discounted unit.
    pub get_discount_percentage: Option<Decimal>,

    /// Item-level scope.
    pub scope: Scope,

    /// Customer segment requirement.
    pub segment: CustomerSegment,

    /// Optional explicit allow-list of customer emails (lower-cased). When
    /// present it is the whole eligibility decision, regardless of segment.
    pub allowed_emails: Option<FxHashSet<String>>,

    /// Redemption limits.
    pub limits: UsageLimits,

    /// Minimum cart subtotal for the promotion to apply.
    pub minimum_cart: Option<Money<'a, Currency>>,

    /// Per-promotion cap on the discount amount.
    pub maximum_discount: Option<Money<'a, Currency>>,

    /// Validity window start; absent means no lower bound.
    pub valid_from: Option<Timestamp>,

    /// Validity window end; absent means open-ended.
    pub valid_until: Option<Timestamp>,

    /// Stacking behaviour against other coupons and bundles.
    pub stacking: Stacking,
}

impl<'a> Promotion<'a> {
    /// Create a coupon promotion with inert defaults for every optional
    /// field.
    pub fn coupon(id: PromotionId, code: impl Into<String>, kind: DiscountKind) -> Self {
        Self::bare(id, Some(code.into()), PromotionSource::Coupon, kind)
    }

    /// Create an automatic bundle promotion with inert defaults.
    #[must_use]
    pub fn bundle(id: PromotionId, bundle: BundleId, kind: DiscountKind) -> Self {
        Self::bare(id, None, PromotionSource::Bundle(bundle), kind)
    }

    fn bare(
        id: PromotionId,
        code: Option<String>,
        source: PromotionSource,
        kind: DiscountKind,
    ) -> Self {
        Self {
            id,
            code,
            source,
            is_active: true,
            discount_kind: kind,
            discount_value: None,
            discount_amount: None,
            buy_quantity: None,
            get_quantity: None,
            get_discount_percentage: None,
            scope: Scope::all(),
            segment: CustomerSegment::All,
            allowed_emails: None,
            limits: UsageLimits::default(),
            minimum_cart: None,
            maximum_discount: None,
            valid_from: None,
            valid_until: None,
            stacking: Stacking::default(),
        }
    }

    /// Whether every money field on the record is denominated in `currency`.
    ///
    /// Amounts in another currency cannot be compared against the cart by
    /// minor units alone, so such a record is malformed for that cart.
    #[must_use]
    pub fn denominated_in(&self, currency: &Currency) -> bool {
        [self.discount_amount, self.minimum_cart, self.maximum_discount]
            .into_iter()
            .flatten()
            .all(|amount| amount.currency() == currency)
    }

    /// Whether the promotion's code matches the requested code,
    /// case-insensitively.
    pub fn matches_code(&self, code: &str) -> bool {
        self.code
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(code.trim()))
    }

    /// Narrow the raw record to its active typed variant.
    ///
    /// Fields belonging to other variants are ignored. Missing or
    /// out-of-range fields for the active variant fail closed.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::InvalidPromotionType`] when the fields required
    /// by the active [`DiscountKind`] are absent or out of range.
    pub fn discount_spec(&self) -> Result<DiscountSpec<'a>, Rejection> {
        match self.discount_kind {
            DiscountKind::Percentage => {
                let points = self
                    .discount_value
                    .ok_or(Rejection::InvalidPromotionType)?;

                Ok(DiscountSpec::Percentage(percent_points(points)?))
            }
            DiscountKind::FixedAmount => {
                let amount = self
                    .discount_amount
                    .ok_or(Rejection::InvalidPromotionType)?;

                if amount.to_minor_units() < 0 {
                    return Err(Rejection::InvalidPromotionType);
                }

                Ok(DiscountSpec::FixedAmount(amount))
            }
            DiscountKind::BuyXGetY => {
                let buy = self.buy_quantity.ok_or(Rejection::InvalidPromotionType)?;
                let get = self.get_quantity.ok_or(Rejection::InvalidPromotionType)?;
                let points = self
                    .get_discount_percentage
                    .ok_or(Rejection::InvalidPromotionType)?;

                if buy == 0 || get == 0 {
                    return Err(Rejection::InvalidPromotionType);
                }

                Ok(DiscountSpec::BuyXGetY {
                    buy,
                    get,
                    percent_off: percent_points(points)?,
                })
            }
            DiscountKind::FreeShipping => Ok(DiscountSpec::FreeShipping),
        }
    }
}

/// Convert percent points (0–100) to a fractional percentage, failing closed
/// on out-of-range values.
fn percent_points(points: Decimal) -> Result<Percentage, Rejection> {
    if points < Decimal::ZERO || points > Decimal::ONE_HUNDRED {
        return Err(Rejection::InvalidPromotionType);
    }

    Ok(Percentage::from(points / Decimal::ONE_HUNDRED))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;

    use super::*;

    #[test]
    fn code_match_is_case_insensitive_and_trimmed() {
        let promotion = Promotion::coupon(
            PromotionId::from("p1"),
            "Save10",
            DiscountKind::FreeShipping,
        );

        assert!(promotion.matches_code("SAVE10"));
        assert!(promotion.matches_code("  save10 "));
        assert!(!promotion.matches_code("SAVE20"));
    }

    #[test]
    fn bundle_promotions_have_no_code() {
        let promotion = Promotion::bundle(
            PromotionId::from("p1"),
            BundleId::from("b1"),
            DiscountKind::FixedAmount,
        );

        assert!(!promotion.matches_code("anything"));
        assert_eq!(
            promotion.source,
            PromotionSource::Bundle(BundleId::from("b1"))
        );
    }

    #[test]
    fn percentage_spec_requires_a_value_in_range() {
        let mut promotion =
            Promotion::coupon(PromotionId::from("p1"), "X", DiscountKind::Percentage);

        assert_eq!(
            promotion.discount_spec(),
            Err(Rejection::InvalidPromotionType)
        );

        promotion.discount_value = Some(Decimal::from(150));
        assert_eq!(
            promotion.discount_spec(),
            Err(Rejection::InvalidPromotionType)
        );

        promotion.discount_value = Some(Decimal::from(25));
        assert!(matches!(
            promotion.discount_spec(),
            Ok(DiscountSpec::Percentage(_))
        ));
    }

    #[test]
    fn inert_fields_of_other_variants_are_ignored() {
        let mut promotion =
            Promotion::coupon(PromotionId::from("p1"), "X", DiscountKind::Percentage);
        promotion.discount_value = Some(Decimal::from(10));
        // Fields for other discount types may be present but play no part.
        promotion.buy_quantity = Some(3);
        promotion.discount_amount = Some(Money::from_minor(500, USD));

        assert!(matches!(
            promotion.discount_spec(),
            Ok(DiscountSpec::Percentage(_))
        ));
    }

    #[test]
    fn bxgy_spec_requires_all_three_fields_nonzero() {
        let mut promotion =
            Promotion::coupon(PromotionId::from("p1"), "X", DiscountKind::BuyXGetY);
        promotion.buy_quantity = Some(2);
        promotion.get_quantity = Some(0);
        promotion.get_discount_percentage = Some(Decimal::from(50));

        assert_eq!(
            promotion.discount_spec(),
            Err(Rejection::InvalidPromotionType)
        );

        promotion.get_quantity = Some(1);
        assert!(matches!(
            promotion.discount_spec(),
            Ok(DiscountSpec::BuyXGetY { buy: 2, get: 1, .. })
        ));
    }

    #[test]
    fn denomination_checks_every_money_field() {
        use rusty_money::iso::GBP;

        let mut promotion =
            Promotion::coupon(PromotionId::from("p1"), "X", DiscountKind::Percentage);
        promotion.discount_value = Some(Decimal::from(10));

        // No money fields at all: trivially denominated in anything.
        assert!(promotion.denominated_in(USD));
        assert!(promotion.denominated_in(GBP));

        promotion.minimum_cart = Some(Money::from_minor(5000, USD));
        promotion.maximum_discount = Some(Money::from_minor(500, GBP));

        assert!(!promotion.denominated_in(USD));
        assert!(!promotion.denominated_in(GBP));

        promotion.maximum_discount = Some(Money::from_minor(500, USD));
        assert!(promotion.denominated_in(USD));
    }

    #[test]
    fn negative_fixed_amount_fails_closed() {
        let mut promotion =
            Promotion::coupon(PromotionId::from("p1"), "X", DiscountKind::FixedAmount);
        promotion.discount_amount = Some(Money::from_minor(-100, USD));

        assert_eq!(
            promotion.discount_spec(),
            Err(Rejection::InvalidPromotionType)
        );
    }
}
