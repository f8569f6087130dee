//! Customers

use serde::{Deserialize, Serialize};

/// Customer segment a promotion is restricted to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CustomerSegment {
    /// No segment restriction.
    #[default]
    All,

    /// Customers without any prior paid order.
    NewCustomers,

    /// Customers with at least one prior paid order.
    ReturningCustomers,

    /// VIP customers; satisfiable only through an explicit email allow-list.
    VipCustomers,
}

/// Identity of the requesting customer, as known to the storefront at
/// validation time. Both fields are optional because cart preview runs for
/// anonymous visitors too.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Customer {
    /// Durable customer identifier, if signed in.
    pub id: Option<String>,

    /// Email address, if known.
    pub email: Option<String>,
}

impl Customer {
    /// An anonymous visitor.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A customer known only by email.
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            id: None,
            email: Some(email.into()),
        }
    }

    /// Lower-cased, trimmed email comparison key used against allow-lists.
    #[must_use]
    pub fn email_key(&self) -> Option<String> {
        self.email
            .as_deref()
            .map(|email| email.trim().to_lowercase())
    }
}
