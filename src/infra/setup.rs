use crate::{
    adapters::{email::resend::ResendEmailSender, http::app_state::AppState},
    infra::{
        config::AppConfig, postgres_persistence, stripe_payment_adapter::StripePaymentAdapter,
        supabase_auth::SupabaseIdentityProvider,
    },
    use_cases::{
        digest::{DigestRepo, DigestUseCases},
        subscription::{CheckoutSettings, SubscriptionUseCases, UserProfileRepo},
    },
};
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let postgres_arc = Arc::new(postgres_persistence(&config.database_url).await?);

    let identity = Arc::new(SupabaseIdentityProvider::new(
        config.supabase_url.clone(),
        config.supabase_anon_key.clone(),
    ));
    let processor = Arc::new(StripePaymentAdapter::new(
        config.stripe_secret_key.clone(),
        config.stripe_api_base.clone(),
    ));
    let email = Arc::new(ResendEmailSender::new(
        config.resend_api_key.clone(),
        config.resend_email_from.clone(),
    ));

    let subscription_use_cases = SubscriptionUseCases::new(
        identity,
        processor,
        postgres_arc.clone() as Arc<dyn UserProfileRepo>,
        CheckoutSettings {
            prices: config.prices.clone(),
            trial_days: config.trial_days,
        },
    );
    let digest_use_cases = DigestUseCases::new(postgres_arc as Arc<dyn DigestRepo>, email);

    Ok(AppState {
        config: Arc::new(config),
        subscription_use_cases: Arc::new(subscription_use_cases),
        digest_use_cases: Arc::new(digest_use_cases),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "bitechina_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs); skipped when the file cannot be created.
    let json_layer = File::create("app.log").ok().map(|file| {
        fmt::layer()
            .json()
            .with_writer(file)
            .with_current_span(true)
            .with_span_list(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
