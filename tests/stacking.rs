//! Coupon-plus-bundle stacking against the summer fixture set.
//!
//! The fixture cart totals $80.00 (8000 minor units). Two bundle discounts
//! ride along when requested: b-home-deal ($2.00 off home items) and
//! b-denied-deal ($3.00 off, unscoped).

use jiff::Timestamp;
use rusty_money::{Money, iso::USD};
use testresult::TestResult;

use vouch::{
    customers::Customer,
    engine::{Engine, ValidationResult},
    fixtures::Fixture,
    ids::PromotionId,
    promotions::Promotion,
    rejections::Rejection,
};

mod common;

use common::{FixedLedger, History, mid_season};

struct Stage {
    engine: Engine<Fixture, FixedLedger, History>,
    cart: vouch::cart::Cart<'static>,
    bundles: Vec<Promotion<'static>>,
}

fn stage() -> Result<Stage, Box<dyn std::error::Error>> {
    let fixture = Fixture::from_set("summer")?;
    let cart = fixture.cart()?;
    let bundles = fixture.bundles();
    let engine = Engine::new(fixture, FixedLedger::default(), History(false));

    Ok(Stage {
        engine,
        cart,
        bundles,
    })
}

fn validate(stage: &Stage, code: &str, now: Timestamp) -> Result<ValidationResult, Box<dyn std::error::Error>> {
    Ok(stage.engine.validate_with_bundles(
        &stage.cart,
        code,
        &Customer::anonymous(),
        &stage.bundles,
        now,
    )?)
}

#[test]
fn compatible_coupon_and_bundles_all_stack() -> TestResult {
    // 10% of 8000 plus the 200 and 300 bundle discounts.
    let stage = stage()?;

    let result = validate(&stage, "SAVE10", mid_season()?)?;

    assert_eq!(result.discount_amount(), Some(Money::from_minor(1_300, USD)));

    Ok(())
}

#[test]
fn specific_compatibility_admits_only_listed_bundles() -> TestResult {
    // PICKY allows b-home and excludes b-denied: 800 + 200.
    let stage = stage()?;

    let result = validate(&stage, "PICKY", mid_season()?)?;

    assert_eq!(result.discount_amount(), Some(Money::from_minor(1_000, USD)));

    let ValidationResult::Accepted { outcome, .. } = result else {
        panic!("expected an accepted result");
    };

    assert_eq!(
        outcome.dropped_reason(&PromotionId::from("b-denied-deal")),
        Some(&Rejection::IncompatibleWithCart)
    );

    Ok(())
}

#[test]
fn bundle_averse_coupon_displaces_the_bundles() -> TestResult {
    // SOLO (priority 1) is walked before the bundles and wins the conflict.
    let stage = stage()?;

    let result = validate(&stage, "SOLO", mid_season()?)?;

    assert_eq!(result.discount_amount(), Some(Money::from_minor(800, USD)));

    let ValidationResult::Accepted { outcome, .. } = result else {
        panic!("expected an accepted result");
    };

    assert_eq!(outcome.dropped.len(), 2);

    Ok(())
}

#[test]
fn after_bundles_phase_loses_conflicts_to_the_bundles() -> TestResult {
    // LATE sits in the after-bundles phase and cannot stack with bundles, so
    // the bundles win and the requested coupon comes back rejected.
    let stage = stage()?;

    let result = validate(&stage, "LATE", mid_season()?)?;

    assert_eq!(result.rejection(), Some(&Rejection::IncompatibleWithCart));

    Ok(())
}

#[test]
fn requires_bundle_is_satisfied_only_by_present_bundles() -> TestResult {
    let stage = stage()?;

    let alone = stage.engine.validate(
        &stage.cart,
        "PAIRME",
        &Customer::anonymous(),
        mid_season()?,
    )?;
    let paired = validate(&stage, "PAIRME", mid_season()?)?;

    assert_eq!(alone.rejection(), Some(&Rejection::IncompatibleWithCart));
    assert_eq!(paired.discount_amount(), Some(Money::from_minor(1_300, USD)));

    Ok(())
}

#[test]
fn per_promotion_cap_limits_a_generous_coupon() -> TestResult {
    // CAPPED is 50% off (4000) with a $5.00 maximum.
    let stage = stage()?;

    let result = stage.engine.validate(
        &stage.cart,
        "CAPPED",
        &Customer::anonymous(),
        mid_season()?,
    )?;

    assert_eq!(result.discount_amount(), Some(Money::from_minor(500, USD)));

    Ok(())
}

#[test]
fn aggregate_percentage_cap_holds_across_the_stack() -> TestResult {
    // AGG20 is 50% off with a 20% aggregate cap: exactly 1600 of 8000, with
    // or without the bundles on top.
    let stage = stage()?;

    let alone = stage.engine.validate(
        &stage.cart,
        "AGG20",
        &Customer::anonymous(),
        mid_season()?,
    )?;
    let stacked = validate(&stage, "AGG20", mid_season()?)?;

    assert_eq!(alone.discount_amount(), Some(Money::from_minor(1_600, USD)));
    assert_eq!(stacked.discount_amount(), Some(Money::from_minor(1_600, USD)));

    Ok(())
}

#[test]
fn disjoint_scopes_stack_their_applied_products() -> TestResult {
    // B2G1 discounts apparel; b-home-deal discounts the mug; b-denied-deal
    // covers the whole cart: 1000 + 200 + 300.
    let stage = stage()?;

    let result = validate(&stage, "B2G1", mid_season()?)?;

    assert_eq!(result.discount_amount(), Some(Money::from_minor(1_500, USD)));
    assert_eq!(result.applied_products().map(rustc_hash::FxHashSet::len), Some(3));

    Ok(())
}
