//! Stacking Coordination
//!
//! Orders multiple candidate promotions (the requested coupon plus any
//! bundle discounts already resolved upstream), applies the mutual-exclusion
//! rules between them, and enforces the aggregate discount caps.

use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    discounts::DiscountError,
    ids::{BundleId, ProductId, PromotionId},
    promotions::{Promotion, PromotionSource},
    rejections::Rejection,
};

/// Bundle compatibility mode declared by a promotion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BundleCompatibility {
    /// Compatible with any bundle.
    #[default]
    All,

    /// Compatible with no bundle.
    None,

    /// Compatible only with bundles in the allow-list and absent from the
    /// deny-list.
    Specific,
}

/// Phase in which a candidate's discount is applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationPhase {
    /// Applied before bundle discounts.
    #[default]
    BeforeBundles,

    /// Applied after bundle discounts.
    AfterBundles,
}

/// Stacking attributes carried by every promotion record.
#[derive(Clone, Debug)]
pub struct Stacking {
    /// Whether this promotion can coexist with bundle discounts.
    pub with_bundles: bool,

    /// Whether this promotion can coexist with other coupons.
    pub with_coupons: bool,

    /// Aggregate cap over the whole accepted set, in percent points
    /// (0–100) of the cart subtotal. The tightest cap among accepted
    /// candidates wins.
    pub max_total_percent: Option<Decimal>,

    /// Bundle compatibility mode.
    pub bundle_compatibility: BundleCompatibility,

    /// Allow-list consulted in [`BundleCompatibility::Specific`] mode.
    pub compatible_bundles: FxHashSet<BundleId>,

    /// Deny-list consulted in [`BundleCompatibility::Specific`] mode.
    pub excluded_bundles: FxHashSet<BundleId>,

    /// Application precedence: 1 is applied first, 10 last.
    pub priority: u8,

    /// Before/after bundle application phase.
    pub phase: ApplicationPhase,

    /// Reject the coupon outright when no bundle discount is among the
    /// candidates.
    pub requires_bundle: bool,
}

impl Default for Stacking {
    fn default() -> Self {
        Self {
            with_bundles: true,
            with_coupons: true,
            max_total_percent: None,
            bundle_compatibility: BundleCompatibility::All,
            compatible_bundles: FxHashSet::default(),
            excluded_bundles: FxHashSet::default(),
            priority: 5,
            phase: ApplicationPhase::BeforeBundles,
            requires_bundle: false,
        }
    }
}

/// A promotion that passed eligibility and scope, paired with its raw
/// (pre-cap) amount in fractional minor units and the products it would
/// discount.
#[derive(Clone, Debug)]
pub struct Candidate<'a> {
    /// The candidate promotion.
    pub promotion: &'a Promotion<'a>,

    /// Raw discount amount before caps, in fractional minor units.
    pub raw_amount: Decimal,

    /// Products the discount applies to.
    pub applied_products: FxHashSet<ProductId>,
}

/// A candidate accepted by the coordinator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedCandidate {
    /// Promotion identifier.
    pub promotion: PromotionId,

    /// Raw amount before the per-candidate cap, fractional minor units.
    pub raw_amount: Decimal,

    /// Amount actually contributed to the running total, after the
    /// candidate's own maximum-discount cap.
    pub capped_amount: Decimal,
}

/// A candidate dropped by the coordinator, retained for diagnostics and
/// telemetry rather than surfaced as a hard error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DroppedCandidate {
    /// Promotion identifier.
    pub promotion: PromotionId,

    /// Why the candidate was dropped.
    pub reason: Rejection,
}

/// Outcome of combining the candidate set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StackOutcome {
    /// Total discount in fractional minor units, after every cap.
    pub total: Decimal,

    /// Accepted candidates in application order.
    pub applied: Vec<AppliedCandidate>,

    /// Products discounted by the accepted candidates.
    pub applied_products: FxHashSet<ProductId>,

    /// Dropped candidates with their reasons.
    pub dropped: Vec<DroppedCandidate>,
}

impl StackOutcome {
    /// Returns the dropped-candidate entry for a promotion, if any.
    pub fn dropped_reason(&self, promotion: &PromotionId) -> Option<&Rejection> {
        self.dropped
            .iter()
            .find(|dropped| &dropped.promotion == promotion)
            .map(|dropped| &dropped.reason)
    }
}

/// Combine candidates into a single capped discount.
///
/// Candidates are partitioned by application phase (`BeforeBundles` fully
/// processed, then `AfterBundles`), ordered within each partition by
/// ascending priority (stable on input order), and walked with the
/// mutual-exclusion rules. The earlier accepted candidate wins every
/// conflict. Each accepted amount is capped by the candidate's own maximum
/// discount before summing; the tightest aggregate percentage cap among
/// accepted candidates then applies, and finally the total can never exceed
/// the cart subtotal.
///
/// # Errors
///
/// Returns [`DiscountError::Conversion`] if the decimal arithmetic
/// overflows.
pub fn combine(
    candidates: &[Candidate<'_>],
    subtotal_minor: i64,
) -> Result<StackOutcome, DiscountError> {
    let mut ordered: Vec<&Candidate<'_>> = candidates
        .iter()
        .filter(|c| c.promotion.stacking.phase == ApplicationPhase::BeforeBundles)
        .collect();
    let mut after: Vec<&Candidate<'_>> = candidates
        .iter()
        .filter(|c| c.promotion.stacking.phase == ApplicationPhase::AfterBundles)
        .collect();

    // Stable sorts keep input order for equal priorities.
    ordered.sort_by_key(|c| c.promotion.stacking.priority);
    after.sort_by_key(|c| c.promotion.stacking.priority);
    ordered.extend(after);

    let bundle_present = candidates
        .iter()
        .any(|c| matches!(c.promotion.source, PromotionSource::Bundle(_)));

    let mut outcome = StackOutcome::default();
    let mut accepted: Vec<&Candidate<'_>> = Vec::new();
    let mut total = Decimal::ZERO;

    for candidate in ordered {
        if let Some(reason) = exclusion_reason(candidate, &accepted, bundle_present) {
            debug!(
                promotion = %candidate.promotion.id,
                %reason,
                "dropped stacking candidate"
            );

            outcome.dropped.push(DroppedCandidate {
                promotion: candidate.promotion.id.clone(),
                reason,
            });

            continue;
        }

        let raw = candidate.raw_amount.max(Decimal::ZERO);
        let capped = match candidate.promotion.maximum_discount {
            Some(cap) => raw.min(Decimal::from(cap.to_minor_units().max(0))),
            None => raw,
        };

        total = total.checked_add(capped).ok_or(DiscountError::Conversion)?;

        outcome.applied.push(AppliedCandidate {
            promotion: candidate.promotion.id.clone(),
            raw_amount: candidate.raw_amount,
            capped_amount: capped,
        });
        outcome
            .applied_products
            .extend(candidate.applied_products.iter().cloned());
        accepted.push(candidate);
    }

    let subtotal = Decimal::from(subtotal_minor);

    // Tightest aggregate percentage cap among the accepted candidates.
    let tightest = accepted
        .iter()
        .filter_map(|c| c.promotion.stacking.max_total_percent)
        .min();

    if let Some(points) = tightest {
        let ceiling = subtotal
            .checked_mul(points / Decimal::ONE_HUNDRED)
            .ok_or(DiscountError::Conversion)?;

        total = total.min(ceiling);
    }

    // Floor-safety invariant: a cart's total discount can never exceed its
    // subtotal, and never goes negative.
    outcome.total = total.min(subtotal).max(Decimal::ZERO);

    Ok(outcome)
}

/// Reason the candidate cannot join the already-accepted set, if any.
fn exclusion_reason(
    candidate: &Candidate<'_>,
    accepted: &[&Candidate<'_>],
    bundle_present: bool,
) -> Option<Rejection> {
    let stacking = &candidate.promotion.stacking;

    if candidate.promotion.source == PromotionSource::Coupon
        && stacking.requires_bundle
        && !bundle_present
    {
        return Some(Rejection::IncompatibleWithCart);
    }

    for prior in accepted {
        if !pair_compatible(prior.promotion, candidate.promotion) {
            return Some(Rejection::IncompatibleWithCart);
        }
    }

    None
}

/// Whether two promotions may coexist in the accepted set.
fn pair_compatible(a: &Promotion<'_>, b: &Promotion<'_>) -> bool {
    match (&a.source, &b.source) {
        (PromotionSource::Coupon, PromotionSource::Coupon) => {
            a.stacking.with_coupons && b.stacking.with_coupons
        }
        (PromotionSource::Coupon, PromotionSource::Bundle(bundle)) => {
            coupon_accepts_bundle(a, bundle) && b.stacking.with_coupons
        }
        (PromotionSource::Bundle(bundle), PromotionSource::Coupon) => {
            coupon_accepts_bundle(b, bundle) && a.stacking.with_coupons
        }
        (PromotionSource::Bundle(_), PromotionSource::Bundle(_)) => {
            a.stacking.with_bundles && b.stacking.with_bundles
        }
    }
}

/// Whether a coupon's stacking attributes admit the given bundle.
fn coupon_accepts_bundle(coupon: &Promotion<'_>, bundle: &BundleId) -> bool {
    if !coupon.stacking.with_bundles {
        return false;
    }

    match coupon.stacking.bundle_compatibility {
        BundleCompatibility::All => true,
        BundleCompatibility::None => false,
        BundleCompatibility::Specific => {
            coupon.stacking.compatible_bundles.contains(bundle)
                && !coupon.stacking.excluded_bundles.contains(bundle)
        }
    }
}
