//! `AppState` wired to in-memory fakes for HTTP-level tests.

use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use url::Url;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    domain::entities::price_tier::PriceTable,
    infra::config::{AppConfig, DEFAULT_STRIPE_API_BASE},
    test_utils::{
        FakeIdentityProvider, InMemoryDigestRepo, InMemoryEmailSender, InMemoryPaymentProcessor,
        InMemoryUserProfileRepo, create_test_profile,
    },
    use_cases::{
        digest::DigestUseCases,
        subscription::{CheckoutSettings, DEFAULT_TRIAL_DAYS, SubscriptionUseCases},
    },
};

pub const TEST_TOKEN: &str = "test-access-token";
pub const TEST_EMAIL: &str = "reader@example.com";
pub const TEST_DIGEST_TOKEN: &str = "digest-trigger-secret";

/// Builder for creating `AppState` with in-memory fakes.
///
/// `TEST_TOKEN` authenticates as `user_id` / `TEST_EMAIL`, who has a free
/// profile with an unused trial. Prices: `price_default` (usd) and
/// `price_kr` (krw).
///
/// ```ignore
/// let builder = TestAppStateBuilder::new();
/// builder.processor.add_customer(TEST_EMAIL, "cus_1");
/// let app_state = builder.build();
/// ```
pub struct TestAppStateBuilder {
    pub user_id: Uuid,
    pub processor: Arc<InMemoryPaymentProcessor>,
    pub profiles: Arc<InMemoryUserProfileRepo>,
    pub digest_repo: Arc<InMemoryDigestRepo>,
    pub email: Arc<InMemoryEmailSender>,
    prices: PriceTable,
    digest_token: Option<&'static str>,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        let user_id = Uuid::new_v4();
        let processor = InMemoryPaymentProcessor::new();
        processor.set_price("price_default", "usd");
        processor.set_price("price_kr", "krw");

        Self {
            user_id,
            processor: Arc::new(processor),
            profiles: Arc::new(InMemoryUserProfileRepo::with_profiles(vec![
                create_test_profile(user_id, |_| {}),
            ])),
            digest_repo: Arc::new(InMemoryDigestRepo::new()),
            email: Arc::new(InMemoryEmailSender::new()),
            prices: PriceTable::new(Some("price_default".into()), Some("price_kr".into())),
            digest_token: Some(TEST_DIGEST_TOKEN),
        }
    }

    pub fn without_prices(mut self) -> Self {
        self.prices = PriceTable::default();
        self
    }

    pub fn without_digest_token(mut self) -> Self {
        self.digest_token = None;
        self
    }

    pub fn build(&self) -> AppState {
        let config = test_config(self.prices.clone(), self.digest_token);
        let identity = Arc::new(FakeIdentityProvider::with_user(
            TEST_TOKEN,
            self.user_id,
            TEST_EMAIL,
        ));

        let subscription_use_cases = SubscriptionUseCases::new(
            identity,
            self.processor.clone(),
            self.profiles.clone(),
            CheckoutSettings {
                prices: config.prices.clone(),
                trial_days: config.trial_days,
            },
        );
        let digest_use_cases = DigestUseCases::new(self.digest_repo.clone(), self.email.clone());

        AppState {
            config: Arc::new(config),
            subscription_use_cases: Arc::new(subscription_use_cases),
            digest_use_cases: Arc::new(digest_use_cases),
        }
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn test_config(prices: PriceTable, digest_token: Option<&str>) -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        app_origin: Url::parse("http://localhost:5173").unwrap(),
        cors_origin: HeaderValue::from_static("http://localhost:5173"),
        database_url: "postgres://localhost/test".to_string(),
        supabase_url: Url::parse("http://localhost:54321").unwrap(),
        supabase_anon_key: SecretString::new("anon".into()),
        stripe_secret_key: SecretString::new("sk_test".into()),
        stripe_api_base: DEFAULT_STRIPE_API_BASE.to_string(),
        prices,
        trial_days: DEFAULT_TRIAL_DAYS,
        resend_api_key: SecretString::new("re_test".into()),
        resend_email_from: "news@example.com".to_string(),
        digest_poll_seconds: 0,
        digest_trigger_token: digest_token.map(|t| SecretString::new(t.into())),
    }
}
