use async_trait::async_trait;
use bitechina_types::Language;
use chrono::{DateTime, Utc};

use crate::app_error::AppResult;

// ============================================================================
// Port Types - Provider-agnostic domain types
// ============================================================================

/// Unique identifier for a customer in the payment processor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomerId(pub String);

impl CustomerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CustomerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// First line item of a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionLine {
    pub price_id: String,
    pub product_id: Option<String>,
    pub currency: String,
}

/// An active or trialing subscription as reported by the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSubscription {
    pub id: String,
    pub current_period_end: Option<DateTime<Utc>>,
    pub trial_start: Option<DateTime<Utc>>,
    pub trial_end: Option<DateTime<Utc>>,
    pub cancel_at: Option<DateTime<Utc>>,
    pub first_line: Option<SubscriptionLine>,
}

impl ActiveSubscription {
    /// End of entitlement: billing period end, else trial end, else the
    /// scheduled cancellation time.
    pub fn subscription_end(&self) -> Option<DateTime<Utc>> {
        self.current_period_end
            .or(self.trial_end)
            .or(self.cancel_at)
    }

    pub fn product_id(&self) -> Option<&str> {
        self.first_line.as_ref().and_then(|l| l.product_id.as_deref())
    }

    pub fn currency(&self) -> Option<&str> {
        self.first_line.as_ref().map(|l| l.currency.as_str())
    }

    /// True when the subscription was started with a trial period.
    pub fn started_with_trial(&self) -> bool {
        self.trial_start.is_some() || self.trial_end.is_some()
    }
}

/// Trial handling for a new subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialPolicy {
    /// Attach a trial; the subscription is canceled at trial end if no payment
    /// method was collected.
    Trial { days: u32 },
    /// The user already consumed their trial.
    AlreadyUsed,
}

/// Everything needed to open a hosted subscription checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    /// Existing customer; when absent the processor creates one from `customer_email`.
    pub customer: Option<CustomerId>,
    pub customer_email: String,
    pub user_id: String,
    pub price_id: String,
    pub trial: TrialPolicy,
    pub success_url: String,
    pub cancel_url: String,
    pub locale: Language,
}

/// Result of creating a checkout session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

// ============================================================================
// Port Trait
// ============================================================================

/// The payment processor is the source of truth for subscription state.
///
/// Lookups are "first match wins": the most recent customer for an email and
/// the most recent active subscription for a customer, each limited to one.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn find_customer_by_email(&self, email: &str) -> AppResult<Option<CustomerId>>;

    async fn active_subscription(
        &self,
        customer: &CustomerId,
    ) -> AppResult<Option<ActiveSubscription>>;

    /// Most recent subscription still inside its trial period. Trialing
    /// subscriptions do not grant entitlement but do consume the trial.
    async fn trialing_subscription(
        &self,
        customer: &CustomerId,
    ) -> AppResult<Option<ActiveSubscription>>;

    /// Lower-case ISO currency code of a price.
    async fn price_currency(&self, price_id: &str) -> AppResult<String>;

    /// Fails with `AppError::CurrencyCombination` when the processor refuses to
    /// mix currencies for this customer.
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> AppResult<CheckoutSession>;
}
