//! HTTP client for the subscription backend.

use async_trait::async_trait;
use bitechina_types::{
    CheckoutRequest, CheckoutResponse, CurrencyMismatchBody, ErrorBody, SubscriptionSnapshot,
};

use crate::{
    api::{CheckoutOutcome, SubscriptionApi},
    config::SdkConfig,
    error::SdkError,
};

#[derive(Debug, Clone)]
pub struct BackendClient {
    base: String,
    http_client: reqwest::Client,
}

impl BackendClient {
    pub fn new(config: &SdkConfig) -> Self {
        Self::with_base(config.backend_base())
    }

    pub fn with_base(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    async fn api_error(response: reqwest::Response) -> SdkError {
        let status = response.status().as_u16();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("Backend request failed: HTTP {}", status),
        };
        SdkError::Api { status, message }
    }
}

#[async_trait]
impl SubscriptionApi for BackendClient {
    async fn check_subscription(
        &self,
        access_token: &str,
    ) -> Result<SubscriptionSnapshot, SdkError> {
        let response = self
            .http_client
            .get(format!("{}/api/subscription/status", self.base))
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::api_error(response).await);
        }
        Ok(response.json().await?)
    }

    async fn create_checkout(
        &self,
        access_token: &str,
        request: &CheckoutRequest,
    ) -> Result<CheckoutOutcome, SdkError> {
        let response = self
            .http_client
            .post(format!("{}/api/checkout", self.base))
            .bearer_auth(access_token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let body: CheckoutResponse = response.json().await?;
            return Ok(CheckoutOutcome::Redirect(body.url));
        }

        if status == reqwest::StatusCode::BAD_REQUEST {
            let body = response.text().await?;
            if let Ok(mismatch) = serde_json::from_str::<CurrencyMismatchBody>(&body) {
                return Ok(CheckoutOutcome::CurrencyMismatch {
                    message: mismatch.message,
                    current_currency: mismatch.current_currency,
                    desired_currency: mismatch.desired_currency,
                });
            }
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            return Err(SdkError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Err(Self::api_error(response).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_check_subscription_sends_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/subscription/status"))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "subscribed": true,
                "product_id": "prod_pro",
                "subscription_end": "2024-02-15T12:00:00Z"
            })))
            .mount(&server)
            .await;

        let snapshot = BackendClient::with_base(server.uri())
            .check_subscription("tok")
            .await
            .unwrap();

        assert!(snapshot.subscribed);
        assert_eq!(snapshot.product_id.as_deref(), Some("prod_pro"));
    }

    #[tokio::test]
    async fn test_unauthenticated_status_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/subscription/status"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "Authentication error: invalid or expired token",
                "code": "UNAUTHENTICATED"
            })))
            .mount(&server)
            .await;

        let err = BackendClient::with_base(server.uri())
            .check_subscription("tok")
            .await
            .unwrap_err();

        assert!(matches!(err, SdkError::Api { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_checkout_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/checkout"))
            .and(body_json(json!({"region": "KR", "locale": "ko"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"url": "https://checkout.test/1"})),
            )
            .mount(&server)
            .await;

        let outcome = BackendClient::with_base(server.uri())
            .create_checkout(
                "tok",
                &CheckoutRequest {
                    region: Some("KR".into()),
                    locale: Some("ko".into()),
                },
            )
            .await
            .unwrap();

        assert_eq!(outcome, CheckoutOutcome::Redirect("https://checkout.test/1".into()));
    }

    #[tokio::test]
    async fn test_checkout_currency_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/checkout"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "CURRENCY_MISMATCH",
                "message": "Cancel your current subscription first",
                "currentCurrency": "usd",
                "desiredCurrency": "krw"
            })))
            .mount(&server)
            .await;

        let outcome = BackendClient::with_base(server.uri())
            .create_checkout("tok", &CheckoutRequest::default())
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            CheckoutOutcome::CurrencyMismatch { ref current_currency, .. } if current_currency == "usd"
        ));
    }

    #[tokio::test]
    async fn test_checkout_server_error_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/checkout"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": "No price configured",
                "code": "CONFIGURATION_ERROR"
            })))
            .mount(&server)
            .await;

        let err = BackendClient::with_base(server.uri())
            .create_checkout("tok", &CheckoutRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, SdkError::Api { status: 500, ref message } if message == "No price configured"));
    }
}
