//! Line Items

use rusty_money::{Money, iso::Currency};

use crate::ids::{CategoryId, ProductId};

/// An immutable snapshot of one cart line for the duration of a validation
/// call. The engine never mutates cart state.
#[derive(Clone, Debug, PartialEq)]
pub struct LineItem<'a> {
    product: ProductId,
    category: Option<CategoryId>,
    quantity: u32,
    unit_price: Money<'a, Currency>,
}

impl<'a> LineItem<'a> {
    /// Creates a line item without a category.
    #[must_use]
    pub fn new(product: ProductId, quantity: u32, unit_price: Money<'a, Currency>) -> Self {
        Self {
            product,
            category: None,
            quantity,
            unit_price,
        }
    }

    /// Creates a line item with a category.
    #[must_use]
    pub fn with_category(
        product: ProductId,
        category: CategoryId,
        quantity: u32,
        unit_price: Money<'a, Currency>,
    ) -> Self {
        Self {
            product,
            category: Some(category),
            quantity,
            unit_price,
        }
    }

    /// Returns the product identifier.
    pub fn product(&self) -> &ProductId {
        &self.product
    }

    /// Returns the category identifier, if the product has one.
    pub fn category(&self) -> Option<&CategoryId> {
        self.category.as_ref()
    }

    /// Returns the quantity of units on this line.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns the unit price.
    pub fn unit_price(&self) -> &Money<'a, Currency> {
        &self.unit_price
    }
}
