//! Identifiers
//!
//! String-backed id newtypes for the entities the engine references but does
//! not own. They arrive verbatim from the storefront's database.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_impls {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from its string form.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

id_impls!(
    /// Identifier of a product (SKU-level).
    ProductId
);

id_impls!(
    /// Identifier of a product category.
    CategoryId
);

id_impls!(
    /// Identifier of a bundle definition.
    BundleId
);

id_impls!(
    /// Identifier of a promotion record.
    PromotionId
);
