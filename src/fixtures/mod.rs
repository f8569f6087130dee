//! Fixtures
//!
//! YAML-backed carts and promotion sets for tests and demos. A fixture set
//! doubles as an in-memory [`PromotionRepository`], so the engine can run
//! against it directly.

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    cart::{Cart, CartError},
    items::LineItem,
    ledger::{CollaboratorError, PromotionRepository},
    pricing::{self, PricingError},
    promotions::{Promotion, PromotionSource},
};

pub mod records;

use records::FixtureFile;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Promotion not found
    #[error("Promotion not found: {0}")]
    PromotionNotFound(String),

    /// Currency mismatch between items
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No items loaded
    #[error("No items loaded; cannot create a cart")]
    NoItems,

    /// Cart creation error
    #[error("Failed to create cart: {0}")]
    Cart(#[from] CartError),

    /// Subtotal computation error
    #[error("Failed to total the fixture items: {0}")]
    Pricing(#[from] PricingError),
}

/// A loaded fixture set: one cart and its promotion records.
#[derive(Debug)]
pub struct Fixture {
    items: Vec<LineItem<'static>>,
    currency: &'static Currency,
    promotions: Vec<Promotion<'static>>,
    promotion_keys: FxHashMap<String, usize>,
}

impl Fixture {
    /// Load the fixture set `fixtures/<name>.yml` relative to the crate
    /// root.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, the set has no
    /// items, or its currencies disagree.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::from_path(PathBuf::from("./fixtures").join(format!("{name}.yml")))
    }

    /// Load a fixture set from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, the set has no
    /// items, or its currencies disagree.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, FixtureError> {
        let contents = fs::read_to_string(path.into())?;
        let file: FixtureFile = serde_norway::from_str(&contents)?;

        let mut items = Vec::with_capacity(file.cart.items.len());
        let mut currency: Option<&'static Currency> = None;

        for record in file.cart.items {
            let (item, item_currency) = record.try_into_item()?;

            match currency {
                Some(existing) if existing != item_currency => {
                    return Err(FixtureError::CurrencyMismatch(
                        existing.iso_alpha_code.to_string(),
                        item_currency.iso_alpha_code.to_string(),
                    ));
                }
                Some(_) => {}
                None => currency = Some(item_currency),
            }

            items.push(item);
        }

        let currency = currency.ok_or(FixtureError::NoItems)?;

        let mut promotions = Vec::with_capacity(file.promotions.len());
        let mut promotion_keys = FxHashMap::default();

        for (key, record) in file.promotions {
            let promotion = record.try_into_promotion(&key)?;

            promotion_keys.insert(key, promotions.len());
            promotions.push(promotion);
        }

        Ok(Self {
            items,
            currency,
            promotions,
            promotion_keys,
        })
    }

    /// Build the cart under test from the fixture items.
    ///
    /// # Errors
    ///
    /// Returns an error if the items fail cart validation.
    pub fn cart(&self) -> Result<Cart<'static>, FixtureError> {
        let subtotal = pricing::items_total_minor(&self.items)?;

        Ok(Cart::new(
            self.items.clone(),
            Money::from_minor(subtotal, self.currency),
            self.currency,
        )?)
    }

    /// All promotions in the set.
    pub fn promotions(&self) -> &[Promotion<'static>] {
        &self.promotions
    }

    /// A promotion by its fixture key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is not in the set.
    pub fn promotion(&self, key: &str) -> Result<&Promotion<'static>, FixtureError> {
        self.promotion_keys
            .get(key)
            .and_then(|index| self.promotions.get(*index))
            .ok_or_else(|| FixtureError::PromotionNotFound(key.to_string()))
    }

    /// The bundle promotions in the set, cloned for use as engine input.
    pub fn bundles(&self) -> Vec<Promotion<'static>> {
        self.promotions
            .iter()
            .filter(|p| matches!(p.source, PromotionSource::Bundle(_)))
            .cloned()
            .collect()
    }

    /// The fixture currency.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}

impl PromotionRepository for Fixture {
    fn find_by_code(&self, code: &str) -> Result<Option<Promotion<'static>>, CollaboratorError> {
        Ok(self
            .promotions
            .iter()
            .find(|promotion| promotion.matches_code(code))
            .cloned())
    }
}
