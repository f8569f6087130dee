//! Promotion Scope
//!
//! Determines which cart line items a promotion is allowed to discount.

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::{
    ids::{CategoryId, ProductId},
    items::LineItem,
};

/// Item-level scope of a promotion: product/category allow-lists and a
/// product exclude-list. Empty or absent include-lists mean "all products
/// eligible before exclusions".
#[derive(Clone, Debug, Default)]
pub struct Scope {
    included_products: FxHashSet<ProductId>,
    included_categories: FxHashSet<CategoryId>,
    excluded_products: FxHashSet<ProductId>,
}

impl Scope {
    /// A scope covering the whole cart.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a scope from its three id sets.
    #[must_use]
    pub fn new(
        included_products: FxHashSet<ProductId>,
        included_categories: FxHashSet<CategoryId>,
        excluded_products: FxHashSet<ProductId>,
    ) -> Self {
        Self {
            included_products,
            included_categories,
            excluded_products,
        }
    }

    /// Restrict the scope to the given products.
    #[must_use]
    pub fn with_included_products(mut self, products: impl IntoIterator<Item = ProductId>) -> Self {
        self.included_products = products.into_iter().collect();
        self
    }

    /// Restrict the scope to the given categories.
    #[must_use]
    pub fn with_included_categories(
        mut self,
        categories: impl IntoIterator<Item = CategoryId>,
    ) -> Self {
        self.included_categories = categories.into_iter().collect();
        self
    }

    /// Exclude the given products from the scope.
    #[must_use]
    pub fn with_excluded_products(mut self, products: impl IntoIterator<Item = ProductId>) -> Self {
        self.excluded_products = products.into_iter().collect();
        self
    }

    /// Resolve the eligible items for this scope, preserving cart order.
    ///
    /// The include-product filter applies first, then the include-category
    /// filter narrows the same working set (intersection, not union), and
    /// finally excluded products are removed. An empty result means the
    /// promotion is inapplicable to the cart, which callers must surface
    /// distinctly from a zero-value discount.
    pub fn resolve<'i, 'a>(&self, items: &'i [LineItem<'a>]) -> SmallVec<[&'i LineItem<'a>; 10]> {
        items
            .iter()
            .filter(|item| {
                self.included_products.is_empty() || self.included_products.contains(item.product())
            })
            .filter(|item| {
                self.included_categories.is_empty()
                    || item
                        .category()
                        .is_some_and(|category| self.included_categories.contains(category))
            })
            .filter(|item| !self.excluded_products.contains(item.product()))
            .collect()
    }
}
