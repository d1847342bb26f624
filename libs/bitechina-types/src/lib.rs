//! Shared wire types for the BiteChina subscription backend and its client SDK.
//!
//! This crate provides:
//! - The subscription snapshot returned by the status endpoint
//! - Checkout request/response bodies, including the currency conflict body
//! - Profile subscription status values stored in `user_profiles`
//! - API error codes
//! - The display language enum

mod checkout;
mod errors;
mod language;
mod subscription;

pub use checkout::{CheckoutRequest, CheckoutResponse, CurrencyMismatchBody, ErrorBody};
pub use errors::ErrorCode;
pub use language::Language;
pub use subscription::{ProfileStatus, SubscriptionSnapshot};
