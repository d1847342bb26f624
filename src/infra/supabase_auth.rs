use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::identity_provider::{Identity, IdentityProvider},
    infra::http_client::build_client,
};

/// Verifies access tokens against the Supabase auth API.
#[derive(Clone)]
pub struct SupabaseIdentityProvider {
    client: Client,
    base_url: Url,
    anon_key: SecretString,
}

#[derive(Debug, Deserialize)]
struct SupabaseUser {
    id: Uuid,
    email: Option<String>,
}

impl SupabaseIdentityProvider {
    pub fn new(base_url: Url, anon_key: SecretString) -> Self {
        Self {
            client: build_client(),
            base_url,
            anon_key,
        }
    }

    fn user_endpoint(&self) -> AppResult<Url> {
        self.base_url
            .join("auth/v1/user")
            .map_err(|e| AppError::Configuration(format!("Invalid SUPABASE_URL: {e}")))
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentityProvider {
    async fn get_user(&self, access_token: &str) -> AppResult<Identity> {
        let response = self
            .client
            .get(self.user_endpoint()?)
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Auth request failed: {e}")))?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(AppError::Unauthenticated(
                "Authentication error: invalid or expired token".into(),
            ));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Supabase auth API error");
            return Err(AppError::Upstream(format!("Auth API error: {status}")));
        }

        let user: SupabaseUser = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse auth user: {e}")))?;

        let email = user
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::Unauthenticated("User not authenticated or email not available".into()))?;

        Ok(Identity { id: user.id, email })
    }
}
