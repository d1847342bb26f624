use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::{
    app_error::{AppError, AppResult},
    infra::http_client::build_client,
};

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: SecretString,
    api_base: String,
}

/// Form parameters for a subscription-mode checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSessionParams<'a> {
    pub customer_id: Option<&'a str>,
    pub customer_email: &'a str,
    pub price_id: &'a str,
    pub client_reference_id: &'a str,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
    pub locale: &'a str,
    pub trial_days: Option<u32>,
    /// Session-level metadata.
    pub metadata: Vec<(&'a str, String)>,
    /// Metadata copied onto the resulting subscription.
    pub subscription_metadata: Vec<(&'a str, String)>,
}

impl StripeClient {
    pub fn new(secret_key: SecretString, api_base: impl Into<String>) -> Self {
        Self {
            client: build_client(),
            secret_key,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    fn auth_header(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:", self.secret_key.expose_secret()));
        format!("Basic {}", encoded)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    // ========================================================================
    // Customers
    // ========================================================================

    /// Most recent customer with exactly this email.
    pub async fn find_customer_by_email(&self, email: &str) -> AppResult<Option<StripeCustomer>> {
        let response = self
            .client
            .get(self.url("customers"))
            .header("Authorization", self.auth_header())
            .query(&[("email", email), ("limit", "1")])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Stripe request failed: {}", e)))?;

        let list: StripeList<StripeCustomer> = self.handle_response(response).await?;
        Ok(list.data.into_iter().next())
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// Most recent subscription of the customer in the given status
    /// (`active`, `trialing`, ...).
    pub async fn first_subscription(
        &self,
        customer_id: &str,
        status: &str,
    ) -> AppResult<Option<StripeSubscription>> {
        let response = self
            .client
            .get(self.url("subscriptions"))
            .header("Authorization", self.auth_header())
            .query(&[
                ("customer", customer_id),
                ("status", status),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Stripe request failed: {}", e)))?;

        let list: StripeList<StripeSubscription> = self.handle_response(response).await?;
        Ok(list.data.into_iter().next())
    }

    // ========================================================================
    // Prices
    // ========================================================================

    pub async fn get_price(&self, price_id: &str) -> AppResult<StripePrice> {
        let response = self
            .client
            .get(self.url(&format!("prices/{}", price_id)))
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Stripe request failed: {}", e)))?;

        self.handle_response(response).await
    }

    // ========================================================================
    // Checkout Sessions
    // ========================================================================

    pub async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams<'_>,
    ) -> AppResult<StripeCheckoutSession> {
        let mut form: Vec<(String, String)> = vec![
            ("mode".into(), "subscription".into()),
            ("line_items[0][price]".into(), params.price_id.to_string()),
            ("line_items[0][quantity]".into(), "1".into()),
            ("client_reference_id".into(), params.client_reference_id.to_string()),
            ("success_url".into(), params.success_url.to_string()),
            ("cancel_url".into(), params.cancel_url.to_string()),
            ("locale".into(), params.locale.to_string()),
        ];

        match params.customer_id {
            Some(customer_id) => form.push(("customer".into(), customer_id.to_string())),
            None => form.push(("customer_email".into(), params.customer_email.to_string())),
        }

        for (key, value) in &params.metadata {
            form.push((format!("metadata[{}]", key), value.clone()));
        }
        for (key, value) in &params.subscription_metadata {
            form.push((format!("subscription_data[metadata][{}]", key), value.clone()));
        }

        if let Some(days) = params.trial_days.filter(|d| *d > 0) {
            form.push(("subscription_data[trial_period_days]".into(), days.to_string()));
            form.push((
                "subscription_data[trial_settings][end_behavior][missing_payment_method]".into(),
                "cancel".into(),
            ));
        }

        let response = self
            .client
            .post(self.url("checkout/sessions"))
            .header("Authorization", self.auth_header())
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Stripe request failed: {}", e)))?;

        self.handle_response(response).await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Stripe API error");

            if let Ok(error) = serde_json::from_str::<StripeErrorResponse>(&body) {
                return Err(AppError::Upstream(format!(
                    "Stripe error: {}",
                    error.error.message.unwrap_or(error.error.error_type)
                )));
            }

            return Err(AppError::Upstream(format!(
                "Stripe API error: {} - {}",
                status, body
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "Failed to parse Stripe response");
            AppError::Upstream(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StripeList<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct StripeCustomer {
    pub id: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StripePrice {
    pub id: String,
    #[serde(default)]
    pub product: Option<String>,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub trial_start: Option<i64>,
    #[serde(default)]
    pub trial_end: Option<i64>,
    #[serde(default)]
    pub cancel_at: Option<i64>,
    pub items: StripeList<StripeSubscriptionItem>,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscriptionItem {
    pub price: StripePrice,
    /// Newer API versions report the billing period per item.
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StripeErrorResponse {
    pub error: StripeError,
}

#[derive(Debug, Deserialize)]
pub struct StripeError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: Option<String>,
}
