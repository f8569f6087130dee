//! Shared test support: in-memory collaborators for driving the engine from
//! fixture sets.

use jiff::Timestamp;
use rusty_money::{
    Money,
    iso::{self, Currency},
};

use vouch::{
    cart::Cart,
    customers::Customer,
    engine::Engine,
    fixtures::Fixture,
    ids::PromotionId,
    ledger::{CollaboratorError, CustomerHistory, ShippingCostProvider, UsageLedger},
};

/// Usage ledger answering with fixed counts.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedLedger {
    /// Global redemption count returned for every promotion.
    pub global: u64,

    /// Per-customer redemption count returned for every promotion.
    pub by_customer: u64,
}

impl UsageLedger for FixedLedger {
    fn global_count(&self, _promotion: &PromotionId) -> Result<u64, CollaboratorError> {
        Ok(self.global)
    }

    fn customer_count(
        &self,
        _promotion: &PromotionId,
        _customer: &Customer,
    ) -> Result<u64, CollaboratorError> {
        Ok(self.by_customer)
    }
}

/// Order history answering the same for every customer.
#[derive(Clone, Copy, Debug)]
pub struct History(pub bool);

impl CustomerHistory for History {
    fn has_prior_paid_order(&self, _customer: &Customer) -> Result<bool, CollaboratorError> {
        Ok(self.0)
    }
}

/// Shipping provider quoting a flat USD cost.
#[derive(Clone, Copy, Debug)]
pub struct FlatShipping(pub i64);

impl ShippingCostProvider for FlatShipping {
    fn shipping_cost<'a>(
        &self,
        _cart: &Cart<'a>,
    ) -> Result<Option<Money<'static, Currency>>, CollaboratorError> {
        Ok(Some(Money::from_minor(self.0, iso::USD)))
    }
}

/// Engine over the summer fixture set with quiet collaborators.
pub fn summer_engine() -> Result<
    (Engine<Fixture, FixedLedger, History>, Cart<'static>),
    Box<dyn std::error::Error>,
> {
    let fixture = Fixture::from_set("summer")?;
    let cart = fixture.cart()?;
    let engine = Engine::new(fixture, FixedLedger::default(), History(false));

    Ok((engine, cart))
}

/// A timestamp inside every validity window of the summer set.
pub fn mid_season() -> Result<Timestamp, jiff::Error> {
    "2026-08-15T12:00:00Z".parse()
}
