//! In-memory fakes for identity, payment processing and profiles.

use async_trait::async_trait;
use bitechina_types::ProfileStatus;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{
        identity_provider::{Identity, IdentityProvider},
        payment_processor::{
            ActiveSubscription, CheckoutSession, CheckoutSessionRequest, CustomerId,
            PaymentProcessor,
        },
    },
    domain::entities::user_profile::UserProfile,
    use_cases::subscription::UserProfileRepo,
};

// ============================================================================
// FakeIdentityProvider
// ============================================================================

#[derive(Default)]
pub struct FakeIdentityProvider {
    pub users: Mutex<HashMap<String, Identity>>,
}

impl FakeIdentityProvider {
    pub fn with_user(token: &str, id: Uuid, email: &str) -> Self {
        let provider = Self::default();
        provider.users.lock().unwrap().insert(
            token.to_string(),
            Identity {
                id,
                email: email.to_string(),
            },
        );
        provider
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn get_user(&self, access_token: &str) -> AppResult<Identity> {
        self.users
            .lock()
            .unwrap()
            .get(access_token)
            .cloned()
            .ok_or_else(|| AppError::Unauthenticated("Invalid token".into()))
    }
}

// ============================================================================
// InMemoryPaymentProcessor
// ============================================================================

#[derive(Default)]
pub struct InMemoryPaymentProcessor {
    pub customers: Mutex<HashMap<String, CustomerId>>,
    pub subscriptions: Mutex<HashMap<CustomerId, ActiveSubscription>>,
    pub trialing: Mutex<HashMap<CustomerId, ActiveSubscription>>,
    pub fail_trialing_lookups: Mutex<bool>,
    pub prices: Mutex<HashMap<String, String>>,
    pub combination_rejects: Mutex<HashSet<String>>,
    pub sessions: Mutex<Vec<CheckoutSessionRequest>>,
    pub attempts: Mutex<Vec<String>>,
    pub subscription_lookup_count: Mutex<usize>,
    pub fail_lookups: Mutex<bool>,
}

impl InMemoryPaymentProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&self, price_id: &str, currency: &str) {
        self.prices
            .lock()
            .unwrap()
            .insert(price_id.to_string(), currency.to_string());
    }

    pub fn add_customer(&self, email: &str, customer_id: &str) {
        self.customers
            .lock()
            .unwrap()
            .insert(email.to_string(), CustomerId::new(customer_id));
    }

    pub fn set_active_subscription(&self, customer_id: &str, subscription: ActiveSubscription) {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(CustomerId::new(customer_id), subscription);
    }

    pub fn set_trialing_subscription(&self, customer_id: &str, subscription: ActiveSubscription) {
        self.trialing
            .lock()
            .unwrap()
            .insert(CustomerId::new(customer_id), subscription);
    }

    pub fn fail_trialing_lookups(&self, fail: bool) {
        *self.fail_trialing_lookups.lock().unwrap() = fail;
    }

    /// Session creation for this price fails like a mixed-currency customer.
    pub fn reject_price_with_combination_error(&self, price_id: &str) {
        self.combination_rejects
            .lock()
            .unwrap()
            .insert(price_id.to_string());
    }

    pub fn fail_lookups(&self, fail: bool) {
        *self.fail_lookups.lock().unwrap() = fail;
    }

    pub fn created_sessions(&self) -> Vec<CheckoutSessionRequest> {
        self.sessions.lock().unwrap().clone()
    }

    /// Price ids of every session creation attempt, successful or not.
    pub fn session_attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn subscription_lookups(&self) -> usize {
        *self.subscription_lookup_count.lock().unwrap()
    }

    fn check_lookup(&self) -> AppResult<()> {
        if *self.fail_lookups.lock().unwrap() {
            return Err(AppError::Upstream("Stripe unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentProcessor for InMemoryPaymentProcessor {
    async fn find_customer_by_email(&self, email: &str) -> AppResult<Option<CustomerId>> {
        self.check_lookup()?;
        Ok(self.customers.lock().unwrap().get(email).cloned())
    }

    async fn active_subscription(
        &self,
        customer: &CustomerId,
    ) -> AppResult<Option<ActiveSubscription>> {
        self.check_lookup()?;
        *self.subscription_lookup_count.lock().unwrap() += 1;
        Ok(self.subscriptions.lock().unwrap().get(customer).cloned())
    }

    async fn trialing_subscription(
        &self,
        customer: &CustomerId,
    ) -> AppResult<Option<ActiveSubscription>> {
        self.check_lookup()?;
        if *self.fail_trialing_lookups.lock().unwrap() {
            return Err(AppError::Upstream("Stripe unavailable".into()));
        }
        Ok(self.trialing.lock().unwrap().get(customer).cloned())
    }

    async fn price_currency(&self, price_id: &str) -> AppResult<String> {
        self.prices
            .lock()
            .unwrap()
            .get(price_id)
            .cloned()
            .ok_or_else(|| AppError::Upstream(format!("Stripe error: No such price: '{price_id}'")))
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> AppResult<CheckoutSession> {
        self.attempts
            .lock()
            .unwrap()
            .push(request.price_id.clone());

        if self
            .combination_rejects
            .lock()
            .unwrap()
            .contains(&request.price_id)
        {
            return Err(AppError::CurrencyCombination(
                "Stripe error: You cannot combine currencies on a single customer.".into(),
            ));
        }

        let mut sessions = self.sessions.lock().unwrap();
        sessions.push(request.clone());
        let id = format!("cs_test_{}", sessions.len());
        Ok(CheckoutSession {
            url: Some(format!("https://checkout.test/{id}")),
            id,
        })
    }
}

// ============================================================================
// InMemoryUserProfileRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserProfileRepo {
    pub profiles: Mutex<HashMap<Uuid, UserProfile>>,
    pub trial_transition_count: Mutex<usize>,
    pub fail_reads: Mutex<bool>,
    pub fail_writes: Mutex<bool>,
}

impl InMemoryUserProfileRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: Vec<UserProfile>) -> Self {
        let map = profiles.into_iter().map(|p| (p.id, p)).collect();
        Self {
            profiles: Mutex::new(map),
            ..Default::default()
        }
    }

    pub fn replace(&self, profile: UserProfile) {
        self.profiles.lock().unwrap().insert(profile.id, profile);
    }

    pub fn set_status(&self, user_id: Uuid, status: ProfileStatus) {
        if let Some(p) = self.profiles.lock().unwrap().get_mut(&user_id) {
            p.subscription_status = status;
        }
    }

    pub fn status_of(&self, user_id: Uuid) -> Option<ProfileStatus> {
        self.profiles
            .lock()
            .unwrap()
            .get(&user_id)
            .map(|p| p.subscription_status)
    }

    pub fn has_used_trial(&self, user_id: Uuid) -> bool {
        self.profiles
            .lock()
            .unwrap()
            .get(&user_id)
            .is_some_and(|p| p.has_used_trial)
    }

    pub fn trial_transitions(&self) -> usize {
        *self.trial_transition_count.lock().unwrap()
    }

    pub fn fail_reads(&self, fail: bool) {
        *self.fail_reads.lock().unwrap() = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    fn check_writes(&self) -> AppResult<()> {
        if *self.fail_writes.lock().unwrap() {
            return Err(AppError::Database("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserProfileRepo for InMemoryUserProfileRepo {
    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        if *self.fail_reads.lock().unwrap() {
            return Err(AppError::Database("connection refused".into()));
        }
        Ok(self.profiles.lock().unwrap().get(&user_id).cloned())
    }

    async fn set_subscription_status(&self, user_id: Uuid, status: ProfileStatus) -> AppResult<()> {
        self.check_writes()?;
        if let Some(p) = self.profiles.lock().unwrap().get_mut(&user_id) {
            p.subscription_status = status;
            p.updated_at = Some(chrono::Utc::now());
        }
        Ok(())
    }

    async fn mark_trial_used(&self, user_id: Uuid) -> AppResult<bool> {
        self.check_writes()?;
        let mut profiles = self.profiles.lock().unwrap();
        match profiles.get_mut(&user_id) {
            Some(p) if !p.has_used_trial => {
                p.has_used_trial = true;
                *self.trial_transition_count.lock().unwrap() += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
