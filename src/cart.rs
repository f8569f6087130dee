//! Cart Snapshots

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    items::LineItem,
    pricing::{self, PricingError},
};

/// Errors related to cart snapshot construction.
#[derive(Debug, Error)]
pub enum CartError {
    /// An item's currency differs from the cart currency (index, item currency, cart currency).
    #[error("Item {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),

    /// An item has a zero quantity (index).
    #[error("Item {0} has a zero quantity")]
    ZeroQuantity(usize),

    /// An item has a zero or negative unit price (index).
    #[error("Item {0} has a non-positive unit price")]
    NonPositiveUnitPrice(usize),

    /// The declared subtotal disagrees with the sum of the line totals.
    ///
    /// The engine treats this as a caller error rather than recomputing the
    /// subtotal, so upstream pricing bugs surface instead of being masked.
    #[error("Declared subtotal of {declared} minor units does not match computed {computed}")]
    SubtotalMismatch {
        /// Subtotal the caller declared, in minor units.
        declared: i64,
        /// Subtotal computed from the line items, in minor units.
        computed: i64,
    },

    /// Errors bubbled up from line totalling.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// An ordered, immutable snapshot of cart line items plus the caller-declared
/// subtotal, all in a single currency.
#[derive(Debug)]
pub struct Cart<'a> {
    items: Vec<LineItem<'a>>,
    subtotal: Money<'a, Currency>,
    currency: &'static Currency,
}

impl<'a> Cart<'a> {
    /// Create a cart snapshot, validating every line and the declared subtotal.
    ///
    /// # Errors
    ///
    /// Returns a `CartError` if any item has a mismatched currency, a zero
    /// quantity, or a non-positive unit price, or if `declared_subtotal` does
    /// not equal the sum of `unit_price × quantity` over all items.
    pub fn new(
        items: impl Into<Vec<LineItem<'a>>>,
        declared_subtotal: Money<'a, Currency>,
        currency: &'static Currency,
    ) -> Result<Self, CartError> {
        let items = items.into();

        items.iter().enumerate().try_for_each(|(i, item)| {
            let item_currency = item.unit_price().currency();
            if item_currency != currency {
                return Err(CartError::CurrencyMismatch(
                    i,
                    item_currency.iso_alpha_code,
                    currency.iso_alpha_code,
                ));
            }

            if item.quantity() == 0 {
                return Err(CartError::ZeroQuantity(i));
            }

            if item.unit_price().to_minor_units() <= 0 {
                return Err(CartError::NonPositiveUnitPrice(i));
            }

            Ok(())
        })?;

        let computed = pricing::items_total_minor(&items)?;
        let declared = declared_subtotal.to_minor_units();

        if computed != declared {
            return Err(CartError::SubtotalMismatch { declared, computed });
        }

        Ok(Cart {
            items,
            subtotal: declared_subtotal,
            currency,
        })
    }

    /// Returns the line items in cart order.
    pub fn items(&self) -> &[LineItem<'a>] {
        &self.items
    }

    /// Returns the declared (and verified) subtotal.
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Returns the subtotal in minor units.
    pub fn subtotal_minor(&self) -> i64 {
        self.subtotal.to_minor_units()
    }

    /// Returns the cart currency.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Returns the number of line items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Checks whether the cart has no line items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso;
    use testresult::TestResult;

    use crate::ids::ProductId;

    use super::*;

    fn test_items<'a>() -> [LineItem<'a>; 2] {
        [
            LineItem::new(ProductId::from("sku-1"), 2, Money::from_minor(100, iso::GBP)),
            LineItem::new(ProductId::from("sku-2"), 1, Money::from_minor(300, iso::GBP)),
        ]
    }

    #[test]
    fn new_with_matching_subtotal_succeeds() -> TestResult {
        let cart = Cart::new(test_items(), Money::from_minor(500, iso::GBP), iso::GBP)?;

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.subtotal_minor(), 500);
        assert_eq!(cart.currency(), iso::GBP);
        assert!(!cart.is_empty());

        Ok(())
    }

    #[test]
    fn mismatched_subtotal_is_a_caller_error() {
        let result = Cart::new(test_items(), Money::from_minor(499, iso::GBP), iso::GBP);

        assert!(matches!(
            result,
            Err(CartError::SubtotalMismatch {
                declared: 499,
                computed: 500,
            })
        ));
    }

    #[test]
    fn currency_mismatch_errors_with_item_index() {
        let items = [
            LineItem::new(ProductId::from("sku-1"), 1, Money::from_minor(100, iso::GBP)),
            LineItem::new(ProductId::from("sku-2"), 1, Money::from_minor(100, iso::USD)),
        ];

        let result = Cart::new(items, Money::from_minor(200, iso::GBP), iso::GBP);

        match result {
            Err(CartError::CurrencyMismatch(idx, item_currency, cart_currency)) => {
                assert_eq!(idx, 1);
                assert_eq!(item_currency, iso::USD.iso_alpha_code);
                assert_eq!(cart_currency, iso::GBP.iso_alpha_code);
            }
            other => panic!("expected CurrencyMismatch error, got {other:?}"),
        }
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let items = [LineItem::new(
            ProductId::from("sku-1"),
            0,
            Money::from_minor(100, iso::GBP),
        )];

        let result = Cart::new(items, Money::from_minor(0, iso::GBP), iso::GBP);

        assert!(matches!(result, Err(CartError::ZeroQuantity(0))));
    }

    #[test]
    fn non_positive_unit_price_is_rejected() {
        let items = [LineItem::new(
            ProductId::from("sku-1"),
            1,
            Money::from_minor(0, iso::GBP),
        )];

        let result = Cart::new(items, Money::from_minor(0, iso::GBP), iso::GBP);

        assert!(matches!(result, Err(CartError::NonPositiveUnitPrice(0))));
    }

    #[test]
    fn empty_cart_with_zero_subtotal_is_valid() -> TestResult {
        let cart = Cart::new([], Money::from_minor(0, iso::GBP), iso::GBP)?;

        assert!(cart.is_empty());
        assert_eq!(cart.subtotal_minor(), 0);

        Ok(())
    }
}
