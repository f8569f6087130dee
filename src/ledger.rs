//! Collaborator Ports
//!
//! Traits the engine consumes for promotion lookup, usage counts, customer
//! history, and shipping quotes. The engine only ever reads through these
//! ports; the redemption write happens elsewhere, after checkout commits.
//!
//! Usage counts are read once as a snapshot. Between that read and the
//! redemption write there is a window in which a concurrent checkout can
//! consume the last redemption, so a limit can be oversold by the number of
//! in-flight validations. Closing the window requires an atomic
//! increment-with-guard at the transactional boundary owned by the ledger
//! implementation, not by this engine.

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{cart::Cart, customers::Customer, ids::PromotionId, promotions::Promotion};

/// Failure of a collaborator the caller may retry.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    /// The backing store could not be reached or answered abnormally.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

/// Lookup of promotion records by coupon code.
#[cfg_attr(test, mockall::automock)]
pub trait PromotionRepository {
    /// Find the promotion matching `code`, case-insensitively.
    ///
    /// Inactive promotions are returned too; the eligibility gate is what
    /// decides they read as unknown codes.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] when the lookup itself fails.
    fn find_by_code(&self, code: &str) -> Result<Option<Promotion<'static>>, CollaboratorError>;
}

/// Read-only redemption counters.
#[cfg_attr(test, mockall::automock)]
pub trait UsageLedger {
    /// Total redemptions of the promotion across all customers.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] when the count cannot be read.
    fn global_count(&self, promotion: &PromotionId) -> Result<u64, CollaboratorError>;

    /// Redemptions of the promotion by the given customer. Anonymous
    /// customers count as zero.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] when the count cannot be read.
    fn customer_count(
        &self,
        promotion: &PromotionId,
        customer: &Customer,
    ) -> Result<u64, CollaboratorError>;
}

/// Order history lookups needed by segment checks.
#[cfg_attr(test, mockall::automock)]
pub trait CustomerHistory {
    /// Whether the customer has at least one prior paid order.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] when the history cannot be read.
    fn has_prior_paid_order(&self, customer: &Customer) -> Result<bool, CollaboratorError>;
}

/// Shipping quote for a cart, consumed only by free-shipping promotions.
#[cfg_attr(test, mockall::automock)]
pub trait ShippingCostProvider {
    /// The shipping cost for the cart, or `None` when no quote is available
    /// at validation time.
    ///
    /// # Errors
    ///
    /// Returns a [`CollaboratorError`] when the provider itself fails.
    fn shipping_cost<'a>(
        &self,
        cart: &Cart<'a>,
    ) -> Result<Option<Money<'static, Currency>>, CollaboratorError>;
}

/// Provider used when no shipping integration is wired up: free-shipping
/// promotions validate but discount zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoShipping;

impl ShippingCostProvider for NoShipping {
    fn shipping_cost<'a>(
        &self,
        _cart: &Cart<'a>,
    ) -> Result<Option<Money<'static, Currency>>, CollaboratorError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use crate::{ids::ProductId, items::LineItem};

    use super::*;

    fn cart() -> Result<Cart<'static>, crate::cart::CartError> {
        let items = [LineItem::new(
            ProductId::from("sku-1"),
            1,
            Money::from_minor(1000, USD),
        )];

        Cart::new(items, Money::from_minor(1000, USD), USD)
    }

    #[test]
    fn mocked_shipping_provider_quotes_through_the_port() -> TestResult {
        let mut provider = MockShippingCostProvider::new();
        provider
            .expect_shipping_cost()
            .returning(|_| Ok(Some(Money::from_minor(495, USD))));

        assert_eq!(
            provider.shipping_cost(&cart()?)?,
            Some(Money::from_minor(495, USD))
        );

        Ok(())
    }

    #[test]
    fn no_shipping_never_quotes() -> TestResult {
        assert_eq!(NoShipping.shipping_cost(&cart()?)?, None);

        Ok(())
    }
}
