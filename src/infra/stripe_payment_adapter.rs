use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use secrecy::SecretString;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_processor::{
        ActiveSubscription, CheckoutSession, CheckoutSessionRequest, CustomerId,
        PaymentProcessor, SubscriptionLine, TrialPolicy,
    },
    infra::stripe_client::{CheckoutSessionParams, StripeClient, StripeSubscription},
};

/// Stripe's wording when a customer already holds objects in another currency.
const CURRENCY_COMBINATION_MARKER: &str = "You cannot combine currencies";

/// Adapter that wraps StripeClient to implement PaymentProcessor.
#[derive(Clone)]
pub struct StripePaymentAdapter {
    client: StripeClient,
}

impl StripePaymentAdapter {
    pub fn new(secret_key: SecretString, api_base: impl Into<String>) -> Self {
        Self {
            client: StripeClient::new(secret_key, api_base),
        }
    }

    fn opt_timestamp_to_datetime(ts: Option<i64>) -> Option<DateTime<Utc>> {
        ts.and_then(|t| Utc.timestamp_opt(t, 0).single())
    }

    fn map_subscription(subscription: StripeSubscription) -> ActiveSubscription {
        let first_item = subscription.items.data.into_iter().next();
        let current_period_end = subscription
            .current_period_end
            .or_else(|| first_item.as_ref().and_then(|i| i.current_period_end));

        ActiveSubscription {
            id: subscription.id,
            current_period_end: Self::opt_timestamp_to_datetime(current_period_end),
            trial_start: Self::opt_timestamp_to_datetime(subscription.trial_start),
            trial_end: Self::opt_timestamp_to_datetime(subscription.trial_end),
            cancel_at: Self::opt_timestamp_to_datetime(subscription.cancel_at),
            first_line: first_item.map(|item| SubscriptionLine {
                price_id: item.price.id,
                product_id: item.price.product,
                currency: item.price.currency.to_lowercase(),
            }),
        }
    }
}

#[async_trait]
impl PaymentProcessor for StripePaymentAdapter {
    async fn find_customer_by_email(&self, email: &str) -> AppResult<Option<CustomerId>> {
        let customer = self.client.find_customer_by_email(email).await?;
        Ok(customer.map(|c| CustomerId::new(c.id)))
    }

    async fn active_subscription(
        &self,
        customer: &CustomerId,
    ) -> AppResult<Option<ActiveSubscription>> {
        let subscription = self
            .client
            .first_subscription(customer.as_str(), "active")
            .await?;
        Ok(subscription.map(Self::map_subscription))
    }

    async fn trialing_subscription(
        &self,
        customer: &CustomerId,
    ) -> AppResult<Option<ActiveSubscription>> {
        let subscription = self
            .client
            .first_subscription(customer.as_str(), "trialing")
            .await?;
        Ok(subscription.map(Self::map_subscription))
    }

    async fn price_currency(&self, price_id: &str) -> AppResult<String> {
        let price = self.client.get_price(price_id).await?;
        Ok(price.currency.to_lowercase())
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> AppResult<CheckoutSession> {
        let mut subscription_metadata = vec![("user_id", request.user_id.clone())];
        let trial_days = match request.trial {
            TrialPolicy::Trial { days } => Some(days),
            TrialPolicy::AlreadyUsed => {
                subscription_metadata.push(("has_used_trial", "true".to_string()));
                None
            }
        };

        let params = CheckoutSessionParams {
            customer_id: request.customer.as_ref().map(|c| c.as_str()),
            customer_email: &request.customer_email,
            price_id: &request.price_id,
            client_reference_id: &request.user_id,
            success_url: &request.success_url,
            cancel_url: &request.cancel_url,
            locale: request.locale.as_str(),
            trial_days,
            metadata: vec![
                ("user_id", request.user_id.clone()),
                ("supabase_email", request.customer_email.clone()),
            ],
            subscription_metadata,
        };

        match self.client.create_checkout_session(&params).await {
            Ok(session) => Ok(CheckoutSession {
                id: session.id,
                url: session.url,
            }),
            Err(AppError::Upstream(message)) if message.contains(CURRENCY_COMBINATION_MARKER) => {
                Err(AppError::CurrencyCombination(message))
            }
            Err(e) => Err(e),
        }
    }
}
