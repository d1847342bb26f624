use std::sync::Arc;

use async_trait::async_trait;
use bitechina_types::{CheckoutRequest, Language, ProfileStatus, SubscriptionSnapshot};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{
        identity_provider::{Identity, IdentityProvider},
        payment_processor::{CheckoutSessionRequest, CustomerId, PaymentProcessor, TrialPolicy},
    },
    domain::entities::{
        price_tier::{PriceTable, Region},
        user_profile::UserProfile,
    },
};

/// Trial length used when none (or an invalid one) is configured.
pub const DEFAULT_TRIAL_DAYS: u32 = 7;

#[async_trait]
pub trait UserProfileRepo: Send + Sync {
    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>>;
    async fn set_subscription_status(&self, user_id: Uuid, status: ProfileStatus) -> AppResult<()>;
    /// Flips `has_used_trial` from false to true. Returns whether a row changed.
    async fn mark_trial_used(&self, user_id: Uuid) -> AppResult<bool>;
}

#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub prices: PriceTable,
    pub trial_days: u32,
}

#[derive(Clone)]
pub struct SubscriptionUseCases {
    identity: Arc<dyn IdentityProvider>,
    processor: Arc<dyn PaymentProcessor>,
    profiles: Arc<dyn UserProfileRepo>,
    settings: CheckoutSettings,
}

impl SubscriptionUseCases {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        processor: Arc<dyn PaymentProcessor>,
        profiles: Arc<dyn UserProfileRepo>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            identity,
            processor,
            profiles,
            settings,
        }
    }

    /// Reads entitlement from the payment processor and mirrors it onto the
    /// caller's profile. Processor failures surface as errors and the client
    /// treats them as "not subscribed"; the profile write never fails the call.
    #[instrument(skip(self, access_token))]
    pub async fn check_status(&self, access_token: &str) -> AppResult<SubscriptionSnapshot> {
        let user = self.identity.get_user(access_token).await?;
        info!(user_id = %user.id, "User authenticated");

        let Some(customer) = self.processor.find_customer_by_email(&user.email).await? else {
            info!(user_id = %user.id, "No customer found, reporting unsubscribed");
            return Ok(SubscriptionSnapshot::unsubscribed());
        };
        info!(customer_id = %customer, "Found customer");

        let active = self.processor.active_subscription(&customer).await?;

        let snapshot = match &active {
            Some(subscription) => {
                let subscription_end = subscription.subscription_end();
                if subscription_end.is_none() {
                    warn!(subscription_id = %subscription.id, "Active subscription missing period end");
                }
                info!(
                    subscription_id = %subscription.id,
                    product_id = ?subscription.product_id(),
                    "Active subscription found"
                );
                SubscriptionSnapshot {
                    subscribed: true,
                    product_id: subscription.product_id().map(str::to_string),
                    subscription_end,
                }
            }
            None => {
                info!(customer_id = %customer, "No active subscription found");
                SubscriptionSnapshot::unsubscribed()
            }
        };

        let status = if snapshot.subscribed {
            ProfileStatus::Pro
        } else {
            ProfileStatus::Free
        };
        self.sync_profile(&user, status).await;

        if active.as_ref().is_some_and(|s| s.started_with_trial())
            || self.has_trialing_subscription(&customer).await
        {
            self.mark_trial_used(&user).await;
        }

        Ok(snapshot)
    }

    /// Opens a hosted checkout and returns its redirect URL.
    #[instrument(skip(self, access_token))]
    pub async fn create_checkout(
        &self,
        access_token: &str,
        request: &CheckoutRequest,
        origin: &str,
    ) -> AppResult<String> {
        let user = self.identity.get_user(access_token).await?;
        info!(user_id = %user.id, "User authenticated");

        let has_used_trial = match self.profiles.get_profile(user.id).await {
            Ok(profile) => profile.is_some_and(|p| p.has_used_trial),
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Failed to load profile, assuming trial unused");
                false
            }
        };
        info!(has_used_trial, "Trial usage status resolved");

        let customer = self.processor.find_customer_by_email(&user.email).await?;

        let region = Region::from_raw(request.region.as_deref());
        let locale = Language::from_raw(request.locale.as_deref());
        let price_id = self
            .settings
            .prices
            .select(region)
            .ok_or_else(|| AppError::Configuration("Stripe price configuration is missing".into()))?
            .to_string();
        info!(
            region = region.as_str(),
            price_id = %price_id,
            korea_price = self.settings.prices.korea_price_id.as_deref() == Some(price_id.as_str()),
            "Price selected"
        );

        let desired_currency = match self.processor.price_currency(&price_id).await {
            Ok(currency) => Some(currency),
            Err(e) => {
                warn!(price_id = %price_id, error = %e, "Failed to retrieve desired price");
                None
            }
        };

        // Read-then-decide: two concurrent checkouts for one customer can both
        // pass this check.
        if let (Some(customer), Some(desired)) = (&customer, &desired_currency) {
            let current = self.processor.active_subscription(customer).await?;
            let current = current.as_ref().and_then(|s| s.currency());
            if let Some(current) = current.filter(|c| !c.eq_ignore_ascii_case(desired)) {
                warn!(
                    customer_id = %customer,
                    current_currency = current,
                    desired_currency = %desired,
                    "Currency mismatch detected"
                );
                return Err(AppError::CurrencyMismatch {
                    current: current.to_string(),
                    desired: desired.clone(),
                });
            }
        }

        let trial = if has_used_trial {
            self.mark_trial_used(&user).await;
            TrialPolicy::AlreadyUsed
        } else {
            TrialPolicy::Trial {
                days: self.settings.trial_days,
            }
        };
        info!(trial = ?trial, "Checkout trial configuration");

        let origin = origin.trim_end_matches('/');
        let mut session_request = CheckoutSessionRequest {
            customer: customer.clone(),
            customer_email: user.email.clone(),
            user_id: user.id.to_string(),
            price_id: price_id.clone(),
            trial,
            success_url: format!("{origin}/pricing?success=true"),
            cancel_url: format!("{origin}/pricing?canceled=true"),
            locale,
        };

        let session = match self.processor.create_checkout_session(&session_request).await {
            Ok(session) => session,
            Err(AppError::CurrencyCombination(message)) => {
                let Some(fallback) = self.settings.prices.fallback_for(&price_id) else {
                    return Err(AppError::CurrencyCombination(message));
                };
                info!(
                    customer_id = ?customer.as_ref().map(|c| c.as_str()),
                    price_id = %price_id,
                    fallback_price_id = fallback,
                    "Retrying checkout with default currency"
                );
                session_request.price_id = fallback.to_string();
                self.processor.create_checkout_session(&session_request).await?
            }
            Err(e) => return Err(e),
        };
        info!(session_id = %session.id, "Checkout session created");

        session
            .url
            .ok_or_else(|| AppError::Upstream("Checkout session has no redirect URL".into()))
    }

    async fn sync_profile(&self, user: &Identity, status: ProfileStatus) {
        match self.profiles.set_subscription_status(user.id, status).await {
            Ok(()) => info!(user_id = %user.id, status = %status, "Synced user profile subscription"),
            Err(e) => warn!(
                user_id = %user.id,
                error = %e,
                "Failed to sync user profile subscription"
            ),
        }
    }

    /// Best effort: a failed lookup leaves the trial flag untouched.
    async fn has_trialing_subscription(&self, customer: &CustomerId) -> bool {
        match self.processor.trialing_subscription(customer).await {
            Ok(Some(subscription)) => {
                info!(subscription_id = %subscription.id, "Trialing subscription found");
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(customer_id = %customer, error = %e, "Failed to look up trialing subscription");
                false
            }
        }
    }

    async fn mark_trial_used(&self, user: &Identity) {
        match self.profiles.mark_trial_used(user.id).await {
            Ok(true) => info!(user_id = %user.id, "Marked trial as used"),
            Ok(false) => {}
            Err(e) => warn!(user_id = %user.id, error = %e, "Failed to mark trial as used"),
        }
    }
}

/// Parses `STRIPE_TRIAL_DAYS`; anything missing, unparsable or non-positive
/// becomes the default.
pub fn parse_trial_days(raw: Option<&str>) -> u32 {
    raw.and_then(|r| r.trim().parse::<i64>().ok())
        .filter(|days| *days > 0)
        .and_then(|days| u32::try_from(days).ok())
        .unwrap_or(DEFAULT_TRIAL_DAYS)
}
