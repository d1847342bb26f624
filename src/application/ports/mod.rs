pub mod identity_provider;
pub mod payment_processor;
