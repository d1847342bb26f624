//! Client-side SDK for BiteChina.
//!
//! This SDK provides the pieces a BiteChina front end needs around the
//! subscription backend.
//!
//! # Features
//!
//! - **Locale resolution** - Korean for visitors in KR, English otherwise, with a sticky user override
//! - **Session bootstrap** - Profile creation, subscription refresh and sign-out on auth state changes
//! - **Content API** - News listing, article detail and profile endpoints
//! - **Pricing and paywall** - Checkout start/return handling and article preview gating
//!
//! HTTP implementations live behind the `client` feature (on by default).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bitechina_sdk::*;
//!
//! let config = SdkConfig {
//!     backend_base: "https://api.bitechina.com".into(),
//!     supabase_url: "https://abcd.supabase.co".into(),
//!     supabase_anon_key: "eyJ...".into(),
//!     ..Default::default()
//! };
//! config.validate()?;
//!
//! let storage = Arc::new(MemoryStorage::new());
//! let session = SessionBootstrapper::new(
//!     Arc::new(SupabaseAuthClient::new(&config, storage.clone())),
//!     Arc::new(ContentApiClient::new(&config)),
//!     Arc::new(BackendClient::new(&config)),
//!     storage,
//!     navigator,
//! );
//! session.start().await;
//! ```

mod api;
mod article;
mod auth;
mod config;
mod envelope;
mod error;
mod locale;
mod paywall;
mod platform;
mod pricing;
mod session;

#[cfg(feature = "client")]
mod backend;
#[cfg(feature = "client")]
mod content;
#[cfg(feature = "client")]
mod supabase;

pub use api::{
    CheckoutOutcome, EnsuredProfile, EnsuredUser, NewsItem, NewsPage, NewsQuery, Pagination,
    ProfileApi, ProfileDetails, SubscriptionApi,
};
pub use article::{build_article_path, slugify};
pub use auth::{AUTH_STORAGE_PREFIX, AuthEvent, AuthProvider, AuthUser, Pkce, Session};
pub use config::{DEFAULT_CONTENT_API_BASE, DEFAULT_GEO_LOOKUP_URL, SdkConfig};
pub use envelope::ApiEnvelope;
pub use error::SdkError;
pub use locale::{GeoLookup, LocaleResolver, LocaleState};
pub use paywall::{ArticleView, PREVIEW_CHARS, gate_article};
pub use platform::{
    HeadlessNavigator, LocalStorage, MemoryStorage, Navigator, purge_prefixed, strip_query_params,
};
pub use pricing::{
    CheckoutReturn, RECHECK_DELAY, begin_checkout, checkout_region, checkout_request,
    handle_checkout_return, inspect_checkout_return,
};
pub use session::{
    Entitlement, IdentityState, SIGN_OUT_REDIRECT_DELAY, SessionBootstrapper, SessionState,
};

#[cfg(feature = "client")]
pub use backend::BackendClient;
#[cfg(feature = "client")]
pub use content::ContentApiClient;
#[cfg(feature = "client")]
pub use locale::IpApiLookup;
#[cfg(feature = "client")]
pub use supabase::SupabaseAuthClient;

// Re-export shared types for convenience
pub use bitechina_types::{
    CheckoutRequest, CheckoutResponse, ErrorCode, Language, ProfileStatus, SubscriptionSnapshot,
};
