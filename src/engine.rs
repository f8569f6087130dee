//! Validation Engine
//!
//! The synchronous pipeline behind coupon validation: look the code up,
//! check its denomination, snapshot usage, run the eligibility gate, resolve
//! scope, compute the raw discount, stack it against any bundle discounts,
//! and round once.

use jiff::Timestamp;
use rust_decimal::Decimal;
use rustc_hash::FxHashSet;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    cart::Cart,
    customers::{Customer, CustomerSegment},
    discounts::{self, DiscountError, DiscountKind},
    eligibility::{self, UsageSnapshot},
    ids::ProductId,
    ledger::{
        CollaboratorError, CustomerHistory, NoShipping, PromotionRepository,
        ShippingCostProvider, UsageLedger,
    },
    pricing::{self, PricingError},
    promotions::Promotion,
    rejections::Rejection,
    stacking::{self, Candidate, StackOutcome},
};

/// Failures that are not rejections: the caller may retry transient ones,
/// and the rest indicate bugs rather than ineligible coupons.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A collaborator failed; retryable.
    #[error(transparent)]
    Transient(#[from] CollaboratorError),

    /// Discount arithmetic failed.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Rounding or totalling failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Outcome of validating a coupon code against a cart.
///
/// Every rejection is definitive for the given inputs; only
/// [`EngineError::Transient`] failures are worth retrying.
#[derive(Clone, Debug, PartialEq)]
pub enum ValidationResult {
    /// The coupon applies. The discount is rounded to whole minor units,
    /// exactly once, at the end of the pipeline.
    Accepted {
        /// Final discount amount.
        discount: Money<'static, Currency>,

        /// Stacking diagnostics: applied and dropped candidates.
        outcome: StackOutcome,
    },

    /// The coupon does not apply, with the user-displayable reason.
    Rejected(Rejection),
}

impl ValidationResult {
    /// Whether the coupon was accepted.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// The final discount amount, when accepted.
    #[must_use]
    pub fn discount_amount(&self) -> Option<Money<'static, Currency>> {
        match self {
            Self::Accepted { discount, .. } => Some(*discount),
            Self::Rejected(_) => None,
        }
    }

    /// Products the accepted discounts apply to.
    #[must_use]
    pub fn applied_products(&self) -> Option<&FxHashSet<ProductId>> {
        match self {
            Self::Accepted { outcome, .. } => Some(&outcome.applied_products),
            Self::Rejected(_) => None,
        }
    }

    /// The rejection reason, when rejected.
    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Accepted { .. } => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }
}

/// The validation engine, generic over its collaborator ports.
#[derive(Debug)]
pub struct Engine<R, U, H, S = NoShipping> {
    repository: R,
    usage: U,
    history: H,
    shipping: S,
}

impl<R, U, H> Engine<R, U, H, NoShipping>
where
    R: PromotionRepository,
    U: UsageLedger,
    H: CustomerHistory,
{
    /// Create an engine without a shipping integration; free-shipping
    /// promotions will validate but discount zero.
    pub fn new(repository: R, usage: U, history: H) -> Self {
        Self {
            repository,
            usage,
            history,
            shipping: NoShipping,
        }
    }
}

impl<R, U, H, S> Engine<R, U, H, S>
where
    R: PromotionRepository,
    U: UsageLedger,
    H: CustomerHistory,
    S: ShippingCostProvider,
{
    /// Create an engine with a shipping cost provider.
    pub fn with_shipping(repository: R, usage: U, history: H, shipping: S) -> Self {
        Self {
            repository,
            usage,
            history,
            shipping,
        }
    }

    /// Validate a coupon code against a cart with no bundle discounts in
    /// play.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] for collaborator or arithmetic failures;
    /// ineligible coupons come back as [`ValidationResult::Rejected`], not
    /// errors.
    pub fn validate(
        &self,
        cart: &Cart<'_>,
        code: &str,
        customer: &Customer,
        now: Timestamp,
    ) -> Result<ValidationResult, EngineError> {
        self.validate_with_bundles(cart, code, customer, &[], now)
    }

    /// Validate a coupon code against a cart alongside the bundle discounts
    /// already resolved for it.
    ///
    /// The requested coupon runs the full gate; bundles are trusted inputs
    /// that only participate in scope, amount, and stacking. A bundle that
    /// resolves to no eligible items simply drops out.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] for collaborator or arithmetic failures.
    pub fn validate_with_bundles(
        &self,
        cart: &Cart<'_>,
        code: &str,
        customer: &Customer,
        bundles: &[Promotion<'static>],
        now: Timestamp,
    ) -> Result<ValidationResult, EngineError> {
        let Some(promotion) = self.repository.find_by_code(code)? else {
            debug!(code, "no promotion matches the requested code");

            return Ok(ValidationResult::Rejected(Rejection::NotFound));
        };

        // Money fields in another currency cannot be compared against the
        // cart by minor units; the record is malformed for this storefront.
        if !promotion.denominated_in(cart.currency()) {
            warn!(promotion = %promotion.id, "promotion money fields do not match the cart currency");

            return Ok(ValidationResult::Rejected(Rejection::InvalidPromotionType));
        }

        let usage = UsageSnapshot {
            global: self.usage.global_count(&promotion.id)?,
            by_customer: self.usage.customer_count(&promotion.id, customer)?,
        };

        // Order history is only consulted when the segment needs it.
        let has_prior_paid_order = match promotion.segment {
            CustomerSegment::NewCustomers | CustomerSegment::ReturningCustomers => {
                self.history.has_prior_paid_order(customer)?
            }
            CustomerSegment::All | CustomerSegment::VipCustomers => false,
        };

        if let Err(rejection) =
            eligibility::check(&promotion, cart, customer, usage, has_prior_paid_order, now)
        {
            debug!(promotion = %promotion.id, %rejection, "eligibility gate rejected the coupon");

            return Ok(ValidationResult::Rejected(rejection));
        }

        let eligible = promotion.scope.resolve(cart.items());

        if eligible.is_empty() {
            return Ok(ValidationResult::Rejected(Rejection::NotApplicable));
        }

        let spec = match promotion.discount_spec() {
            Ok(spec) => spec,
            Err(rejection) => {
                warn!(promotion = %promotion.id, "promotion record is malformed for its discount type");

                return Ok(ValidationResult::Rejected(rejection));
            }
        };

        let shipping_cost = if promotion.discount_kind == DiscountKind::FreeShipping {
            self.shipping.shipping_cost(cart)?
        } else {
            None
        };

        let raw = discounts::raw_discount(&spec, &eligible, shipping_cost)?;
        let applied_products: FxHashSet<ProductId> =
            eligible.iter().map(|item| item.product().clone()).collect();

        let mut candidates = vec![Candidate {
            promotion: &promotion,
            raw_amount: raw,
            applied_products,
        }];
        candidates.extend(bundle_candidates(cart, bundles)?);

        let outcome = stacking::combine(&candidates, cart.subtotal_minor())?;

        if let Some(reason) = outcome.dropped_reason(&promotion.id) {
            return Ok(ValidationResult::Rejected(reason.clone()));
        }

        // The single rounding step of the pipeline.
        let minor = pricing::round_minor(outcome.total)?;
        let discount = Money::from_minor(minor, cart.currency());

        debug!(
            promotion = %promotion.id,
            discount = %discount,
            applied = outcome.applied.len(),
            "coupon accepted"
        );

        Ok(ValidationResult::Accepted { discount, outcome })
    }
}

/// Resolve each bundle promotion into a stacking candidate, skipping those
/// with no eligible items or a malformed record.
fn bundle_candidates<'p>(
    cart: &Cart<'_>,
    bundles: &'p [Promotion<'static>],
) -> Result<Vec<Candidate<'p>>, EngineError> {
    let mut candidates = Vec::with_capacity(bundles.len());

    for bundle in bundles {
        if !bundle.denominated_in(cart.currency()) {
            warn!(promotion = %bundle.id, "skipping bundle denominated in another currency");

            continue;
        }

        let eligible = bundle.scope.resolve(cart.items());

        if eligible.is_empty() {
            continue;
        }

        let Ok(spec) = bundle.discount_spec() else {
            warn!(promotion = %bundle.id, "skipping malformed bundle promotion");

            continue;
        };

        // Bundles never consume a shipping quote.
        let raw: Decimal = discounts::raw_discount(&spec, &eligible, None)?;

        candidates.push(Candidate {
            promotion: bundle,
            raw_amount: raw,
            applied_products: eligible.iter().map(|item| item.product().clone()).collect(),
        });
    }

    Ok(candidates)
}
