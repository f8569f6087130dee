//! Vouch
//!
//! Vouch is a deterministic promotion and discount validation engine: given a cart snapshot, a coupon code, and the requesting customer, it decides whether the coupon applies and computes the exact discount, stacked against any bundle discounts already in play.

pub mod cart;
pub mod customers;
pub mod discounts;
pub mod eligibility;
pub mod engine;
pub mod fixtures;
pub mod ids;
pub mod items;
pub mod ledger;
pub mod pricing;
pub mod promotions;
pub mod rejections;
pub mod scope;
pub mod stacking;
