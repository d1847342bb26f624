//! GoTrue REST client implementing [`AuthProvider`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::{
    auth::{AuthEvent, AuthProvider, AuthUser, Pkce, Session},
    config::SdkConfig,
    error::SdkError,
    platform::LocalStorage,
};

/// Refresh this many seconds before the access token actually expires.
const EXPIRY_MARGIN_SECS: i64 = 30;

#[derive(Clone)]
pub struct SupabaseAuthClient {
    base: String,
    anon_key: String,
    storage_key: String,
    storage: Arc<dyn LocalStorage>,
    events: broadcast::Sender<AuthEvent>,
    http_client: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    expires_in: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| Utc::now().timestamp() + secs));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

#[derive(Deserialize)]
struct GoTrueError {
    #[serde(default, alias = "error_description", alias = "msg")]
    message: Option<String>,
}

impl SupabaseAuthClient {
    pub fn new(config: &SdkConfig, storage: Arc<dyn LocalStorage>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            base: config.supabase_url(),
            anon_key: config.supabase_anon_key.clone(),
            storage_key: config.storage_key(),
            storage,
            events,
            http_client: reqwest::Client::new(),
        }
    }

    fn verifier_key(&self) -> String {
        format!("{}-code-verifier", self.storage_key)
    }

    fn stored_session(&self) -> Option<Session> {
        let raw = self.storage.get(&self.storage_key)?;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable stored session");
                self.storage.remove(&self.storage_key);
                None
            }
        }
    }

    fn store_session(&self, session: &Session) {
        match serde_json::to_string(session) {
            Ok(raw) => self.storage.set(&self.storage_key, &raw),
            Err(e) => warn!(error = %e, "Failed to persist session"),
        }
    }

    fn emit(&self, event: AuthEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    /// Starts a PKCE flow and returns the challenge to send upstream.
    fn begin_pkce(&self) -> String {
        let pkce = Pkce::generate();
        self.storage.set(&self.verifier_key(), &pkce.verifier);
        pkce.challenge
    }

    async fn handle_error(response: reqwest::Response) -> SdkError {
        let status = response.status();
        let message = response
            .json::<GoTrueError>()
            .await
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| format!("Auth request failed: HTTP {}", status));
        if status == reqwest::StatusCode::BAD_REQUEST
            || status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            SdkError::Auth(message)
        } else {
            SdkError::Api {
                status: status.as_u16(),
                message,
            }
        }
    }

    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> Result<Session, SdkError> {
        let response = self
            .http_client
            .post(format!("{}/auth/v1/token", self.base))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }
        let token: TokenResponse = response.json().await?;
        Ok(token.into_session())
    }

    fn accept_session(&self, session: Session, event: fn(Session) -> AuthEvent) -> Session {
        self.store_session(&session);
        self.emit(event(session.clone()));
        session
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, SdkError> {
        let session = self
            .token_grant("password", json!({ "email": email, "password": password }))
            .await?;
        Ok(self.accept_session(session, AuthEvent::SignedIn))
    }

    /// Registers a new account. Confirmation mail links back to `redirect_to`.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        redirect_to: &str,
    ) -> Result<(), SdkError> {
        let challenge = self.begin_pkce();
        let response = self
            .http_client
            .post(format!("{}/auth/v1/signup", self.base))
            .query(&[("redirect_to", redirect_to)])
            .header("apikey", &self.anon_key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "full_name": full_name },
                "code_challenge": challenge,
                "code_challenge_method": "s256",
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }
        Ok(())
    }

    /// Sends a magic link that returns to `redirect_to` with a `code`.
    pub async fn sign_in_with_magic_link(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), SdkError> {
        let challenge = self.begin_pkce();
        let response = self
            .http_client
            .post(format!("{}/auth/v1/otp", self.base))
            .query(&[("redirect_to", redirect_to)])
            .header("apikey", &self.anon_key)
            .json(&json!({
                "email": email,
                "create_user": true,
                "code_challenge": challenge,
                "code_challenge_method": "s256",
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::handle_error(response).await);
        }
        Ok(())
    }

    /// Authorization URL for an OAuth provider such as `google`.
    pub fn oauth_url(&self, provider: &str, redirect_to: &str) -> Result<url::Url, SdkError> {
        let challenge = self.begin_pkce();
        url::Url::parse_with_params(
            &format!("{}/auth/v1/authorize", self.base),
            &[
                ("provider", provider),
                ("redirect_to", redirect_to),
                ("code_challenge", challenge.as_str()),
                ("code_challenge_method", "s256"),
                ("prompt", "select_account"),
            ],
        )
        .map_err(|e| SdkError::Config(format!("Invalid supabase_url: {}", e)))
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session, SdkError> {
        let session = self
            .token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await?;
        Ok(self.accept_session(session, AuthEvent::TokenRefreshed))
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuthClient {
    async fn current_session(&self) -> Result<Option<Session>, SdkError> {
        let Some(session) = self.stored_session() else {
            return Ok(None);
        };
        if !session.is_expired(Utc::now().timestamp() + EXPIRY_MARGIN_SECS) {
            return Ok(Some(session));
        }

        let Some(refresh_token) = session.refresh_token.as_deref() else {
            self.storage.remove(&self.storage_key);
            return Ok(None);
        };
        match self.refresh_session(refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(SdkError::Auth(message)) => {
                debug!(message = %message, "Stored session could not be refreshed");
                self.storage.remove(&self.storage_key);
                self.emit(AuthEvent::SignedOut);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn exchange_code_for_session(&self, code: &str) -> Result<Session, SdkError> {
        let verifier_key = self.verifier_key();
        let verifier = self
            .storage
            .get(&verifier_key)
            .ok_or_else(|| SdkError::Auth("No code verifier for this sign-in".into()))?;

        let result = self
            .token_grant(
                "pkce",
                json!({ "auth_code": code, "code_verifier": verifier }),
            )
            .await;
        self.storage.remove(&verifier_key);

        Ok(self.accept_session(result?, AuthEvent::SignedIn))
    }

    async fn sign_out(&self) -> Result<(), SdkError> {
        let session = self.stored_session();
        self.storage.remove(&self.storage_key);
        self.emit(AuthEvent::SignedOut);

        let Some(session) = session else {
            return Ok(());
        };
        let response = self
            .http_client
            .post(format!("{}/auth/v1/logout", self.base))
            .query(&[("scope", "global")])
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        // An already revoked token has nothing left to sign out of.
        let status = response.status();
        if status.is_success()
            || status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::NOT_FOUND
        {
            return Ok(());
        }
        Err(Self::handle_error(response).await)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
