//! Test utilities for handler and use case tests.
//!
//! This module provides:
//! - Test data factories with sensible defaults
//! - In-memory fakes for the identity provider, payment processor, repositories
//!   and email sender
//! - A builder for an `AppState` wired to those fakes

mod app_state_builder;
mod digest_mocks;
mod factories;
mod subscription_mocks;

pub use app_state_builder::*;
pub use digest_mocks::*;
pub use factories::*;
pub use subscription_mocks::*;
