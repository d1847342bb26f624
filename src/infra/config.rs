use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

use crate::{
    domain::entities::price_tier::PriceTable, use_cases::subscription::parse_trial_days,
};

pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Fallback for checkout return URLs when the request carries no `Origin`.
    pub app_origin: Url,
    pub cors_origin: HeaderValue,
    pub database_url: String,
    /// Supabase project URL; identity tokens are verified against its auth API.
    pub supabase_url: Url,
    pub supabase_anon_key: SecretString,
    pub stripe_secret_key: SecretString,
    pub stripe_api_base: String,
    /// Default and Korea price ids. Either may be unset; checkout fails with a
    /// configuration error when the selected tier has no price.
    pub prices: PriceTable,
    pub trial_days: u32,
    pub resend_api_key: SecretString,
    pub resend_email_from: String,
    /// Seconds between background digest runs. Zero disables the loop.
    pub digest_poll_seconds: u64,
    /// Bearer token required by `POST /api/digest/send`. Unset disables the route.
    pub digest_trigger_token: Option<SecretString>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr: SocketAddr =
            get_env_default("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3001)));
        let app_origin: Url = get_env("APP_ORIGIN");
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:5173"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");
        let database_url: String = get_env("DATABASE_URL");
        let supabase_url: Url = get_env("SUPABASE_URL");
        let supabase_anon_key = SecretString::new(get_env::<String>("SUPABASE_ANON_KEY").into());
        let stripe_secret_key = SecretString::new(get_env::<String>("STRIPE_SECRET_KEY").into());
        let stripe_api_base: String =
            get_env_default("STRIPE_API_BASE", DEFAULT_STRIPE_API_BASE.to_string());
        let prices = PriceTable::new(
            optional_env("STRIPE_PRICE_ID_DEFAULT"),
            optional_env("STRIPE_PRICE_ID_KR"),
        );
        let trial_days = parse_trial_days(optional_env("STRIPE_TRIAL_DAYS").as_deref());
        let resend_api_key = SecretString::new(get_env::<String>("RESEND_API_KEY").into());
        let resend_email_from: String = get_env("RESEND_EMAIL_FROM");
        let digest_poll_seconds: u64 = get_env_default("DIGEST_POLL_SECONDS", 0);
        let digest_trigger_token =
            optional_env("DIGEST_TRIGGER_TOKEN").map(|t| SecretString::new(t.into()));

        if prices.default_price_id.is_none() {
            tracing::warn!("STRIPE_PRICE_ID_DEFAULT is not set; non-Korea checkouts will fail");
        }

        Self {
            bind_addr,
            app_origin,
            cors_origin,
            database_url,
            supabase_url,
            supabase_anon_key,
            stripe_secret_key,
            stripe_api_base,
            prices,
            trial_days,
            resend_api_key,
            resend_email_from,
            digest_poll_seconds,
            digest_trigger_token,
        }
    }

    /// Origin without the trailing slash `Url` always carries.
    pub fn app_origin_str(&self) -> &str {
        self.app_origin.as_str().trim_end_matches('/')
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
