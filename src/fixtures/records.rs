//! Fixture Records
//!
//! Serde shapes for the YAML fixture files. Promotion records are
//! deliberately loosely typed: fields belonging to inactive discount types
//! may be present and are simply ignored, matching how the records behave at
//! validation time.

use jiff::Timestamp;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::Deserialize;

use crate::{
    customers::CustomerSegment,
    discounts::DiscountKind,
    ids::{BundleId, CategoryId, ProductId, PromotionId},
    items::LineItem,
    promotions::{Promotion, PromotionSource, UsageLimits},
    scope::Scope,
    stacking::{ApplicationPhase, BundleCompatibility, Stacking},
};

use super::FixtureError;

/// Top-level shape of a fixture set file.
#[derive(Debug, Deserialize)]
pub struct FixtureFile {
    /// The cart under test.
    pub cart: CartRecord,

    /// Map of promotion key -> promotion record.
    #[serde(default)]
    pub promotions: FxHashMap<String, PromotionRecord>,
}

/// Cart record from YAML.
#[derive(Debug, Deserialize)]
pub struct CartRecord {
    /// Cart line items in order.
    pub items: Vec<ItemRecord>,
}

/// Line item record from YAML.
#[derive(Debug, Deserialize)]
pub struct ItemRecord {
    /// Product identifier.
    pub product: String,

    /// Optional category identifier.
    pub category: Option<String>,

    /// Quantity.
    pub quantity: u32,

    /// Unit price string (e.g. "2.50 USD").
    pub price: String,
}

impl ItemRecord {
    /// Build the line item, returning it with its currency.
    pub(super) fn try_into_item(
        self,
    ) -> Result<(LineItem<'static>, &'static Currency), FixtureError> {
        let (minor_units, currency) = parse_price(&self.price)?;
        let price = Money::from_minor(minor_units, currency);

        let item = match self.category {
            Some(category) => LineItem::with_category(
                ProductId::from(self.product),
                CategoryId::from(category),
                self.quantity,
                price,
            ),
            None => LineItem::new(ProductId::from(self.product), self.quantity, price),
        };

        Ok((item, currency))
    }
}

/// Promotion record from YAML, mirroring the loosely-typed upstream data
/// model: one `type` tag, every other field optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PromotionRecord {
    /// Coupon code; absent for automatic promotions.
    pub code: Option<String>,

    /// Bundle identifier; presence marks the record as a bundle discount.
    pub bundle: Option<String>,

    /// Active flag.
    #[serde(default = "default_true")]
    pub active: bool,

    /// Discount type tag.
    #[serde(rename = "type")]
    pub kind: DiscountKind,

    /// Percent points for percentage discounts.
    pub value: Option<Decimal>,

    /// Amount string for fixed-amount discounts (e.g. "10.00 USD").
    pub amount: Option<String>,

    /// Buy-X-get-Y fields.
    pub buy_quantity: Option<u32>,
    /// Units discounted per deal.
    pub get_quantity: Option<u32>,
    /// Percent points off each discounted unit.
    pub get_discount_percentage: Option<Decimal>,

    /// Scope lists.
    #[serde(default)]
    pub included_products: Vec<String>,
    /// Categories the promotion is restricted to.
    #[serde(default)]
    pub included_categories: Vec<String>,
    /// Products carved out of the scope.
    #[serde(default)]
    pub excluded_products: Vec<String>,

    /// Customer segment.
    #[serde(default)]
    pub segment: CustomerSegment,

    /// Explicit email allow-list.
    pub allowed_emails: Option<Vec<String>>,

    /// Global redemption cap.
    pub global_limit: Option<u32>,

    /// Per-customer redemption cap.
    pub per_customer_limit: Option<u32>,

    /// Minimum cart subtotal string.
    pub minimum_cart: Option<String>,

    /// Per-promotion discount cap string.
    pub maximum_discount: Option<String>,

    /// Validity window bounds.
    pub valid_from: Option<Timestamp>,
    /// End of the validity window.
    pub valid_until: Option<Timestamp>,

    /// Stacking attributes.
    #[serde(default = "default_true")]
    pub with_coupons: bool,
    /// Whether the promotion coexists with bundles.
    #[serde(default = "default_true")]
    pub with_bundles: bool,
    /// Aggregate cap in percent points of the subtotal.
    pub max_total_percent: Option<Decimal>,
    /// Bundle compatibility mode.
    #[serde(default)]
    pub bundle_compatibility: BundleCompatibility,
    /// Allow-list for the specific compatibility mode.
    #[serde(default)]
    pub compatible_bundles: Vec<String>,
    /// Deny-list for the specific compatibility mode.
    #[serde(default)]
    pub excluded_bundles: Vec<String>,
    /// Application precedence, 1 first.
    #[serde(default = "default_priority")]
    pub priority: u8,
    /// Application phase.
    #[serde(default)]
    pub phase: ApplicationPhase,
    /// Reject when no bundle discount is in play.
    #[serde(default)]
    pub requires_bundle: bool,
}

fn default_true() -> bool {
    true
}

fn default_priority() -> u8 {
    5
}

impl PromotionRecord {
    /// Convert the record into a promotion keyed by its fixture name.
    ///
    /// # Errors
    ///
    /// Returns an error if a money field cannot be parsed.
    pub(super) fn try_into_promotion(
        self,
        key: &str,
    ) -> Result<Promotion<'static>, FixtureError> {
        let source = match &self.bundle {
            Some(bundle) => PromotionSource::Bundle(BundleId::from(bundle.clone())),
            None => PromotionSource::Coupon,
        };

        let scope = Scope::new(
            self.included_products.into_iter().map(ProductId::from).collect(),
            self.included_categories
                .into_iter()
                .map(CategoryId::from)
                .collect(),
            self.excluded_products.into_iter().map(ProductId::from).collect(),
        );

        let stacking = Stacking {
            with_bundles: self.with_bundles,
            with_coupons: self.with_coupons,
            max_total_percent: self.max_total_percent,
            bundle_compatibility: self.bundle_compatibility,
            compatible_bundles: self.compatible_bundles.into_iter().map(BundleId::from).collect(),
            excluded_bundles: self.excluded_bundles.into_iter().map(BundleId::from).collect(),
            priority: self.priority,
            phase: self.phase,
            requires_bundle: self.requires_bundle,
        };

        Ok(Promotion {
            id: PromotionId::from(key),
            code: self.code,
            source,
            is_active: self.active,
            discount_kind: self.kind,
            discount_value: self.value,
            discount_amount: parse_optional_money(self.amount.as_deref())?,
            buy_quantity: self.buy_quantity,
            get_quantity: self.get_quantity,
            get_discount_percentage: self.get_discount_percentage,
            scope,
            segment: self.segment,
            allowed_emails: self.allowed_emails.map(|emails| {
                emails
                    .into_iter()
                    .map(|email| email.trim().to_lowercase())
                    .collect()
            }),
            limits: UsageLimits {
                global: self.global_limit,
                per_customer: self.per_customer_limit,
            },
            minimum_cart: parse_optional_money(self.minimum_cart.as_deref())?,
            maximum_discount: parse_optional_money(self.maximum_discount.as_deref())?,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            stacking,
        })
    }
}

fn parse_optional_money(
    value: Option<&str>,
) -> Result<Option<Money<'static, Currency>>, FixtureError> {
    value
        .map(|s| {
            let (minor_units, currency) = parse_price(s)?;

            Ok(Money::from_minor(minor_units, currency))
        })
        .transpose()
}

/// Parse a price string ("AMOUNT CODE", e.g. "2.50 USD") into minor units
/// and its currency, scaling by the currency's exponent.
///
/// # Errors
///
/// Returns an error for malformed strings or unknown currency codes.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    if parts.len() != 2 {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    }

    let amount = parts
        .first()
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let currency_code = parts
        .get(1)
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    let currency =
        iso::find(currency_code).ok_or_else(|| FixtureError::UnknownCurrency((*currency_code).to_string()))?;

    let scale = Decimal::from(10_i64.pow(currency.exponent));
    let scaled = amount
        .checked_mul(scale)
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    // Sub-minor-unit precision is a typo in the fixture, not a rounding job.
    if scaled.fract() != Decimal::ZERO {
        return Err(FixtureError::InvalidPrice(s.to_string()));
    }

    let minor_units = scaled
        .to_i64()
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, USD};

    use super::*;

    #[test]
    fn parse_price_scales_by_the_currency_exponent() -> Result<(), FixtureError> {
        let (minor, currency) = parse_price("2.99 GBP")?;

        assert_eq!(minor, 299);
        assert_eq!(currency, GBP);

        // JPY has no minor unit.
        let (minor, _currency) = parse_price("500 JPY")?;
        assert_eq!(minor, 500);

        Ok(())
    }

    #[test]
    fn parse_price_rejects_invalid_format() {
        assert!(matches!(
            parse_price("2.99GBP"),
            Err(FixtureError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_price("two quid GBP extra"),
            Err(FixtureError::InvalidPrice(_))
        ));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        assert!(matches!(
            parse_price("2.99 ZZZ"),
            Err(FixtureError::UnknownCurrency(code)) if code == "ZZZ"
        ));
    }

    #[test]
    fn parse_price_rejects_sub_minor_precision() {
        assert!(matches!(
            parse_price("2.999 USD"),
            Err(FixtureError::InvalidPrice(_))
        ));
    }

    #[test]
    fn promotion_record_defaults_match_the_data_model() -> Result<(), FixtureError> {
        let yaml = "
type: percentage
code: SAVE10
value: 10
";
        let record: PromotionRecord =
            serde_norway::from_str(yaml).map_err(FixtureError::Yaml)?;
        let promotion = record.try_into_promotion("save10")?;

        assert!(promotion.is_active);
        assert_eq!(promotion.source, PromotionSource::Coupon);
        assert_eq!(promotion.stacking.priority, 5);
        assert!(promotion.stacking.with_coupons);
        assert!(promotion.stacking.with_bundles);
        assert_eq!(promotion.segment, CustomerSegment::All);

        Ok(())
    }

    #[test]
    fn bundle_records_become_bundle_promotions() -> Result<(), FixtureError> {
        let yaml = "
type: fixed-amount
bundle: b-home
amount: 2.00 USD
";
        let record: PromotionRecord =
            serde_norway::from_str(yaml).map_err(FixtureError::Yaml)?;
        let promotion = record.try_into_promotion("b-home-deal")?;

        assert_eq!(
            promotion.source,
            PromotionSource::Bundle(BundleId::from("b-home"))
        );
        assert_eq!(
            promotion.discount_amount,
            Some(Money::from_minor(200, USD))
        );

        Ok(())
    }

    #[test]
    fn allow_list_emails_are_normalised_on_load() -> Result<(), FixtureError> {
        let yaml = "
type: percentage
code: VIPONLY
value: 10
segment: vip-customers
allowed-emails:
  - ' VIP@Example.com '
";
        let record: PromotionRecord =
            serde_norway::from_str(yaml).map_err(FixtureError::Yaml)?;
        let promotion = record.try_into_promotion("vip")?;

        let allowed = promotion.allowed_emails.unwrap_or_default();
        assert!(allowed.contains("vip@example.com"));

        Ok(())
    }
}
