//! HTTP client for the content and profile API.

use async_trait::async_trait;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use url::Url;

use crate::{
    api::{EnsuredProfile, NewsItem, NewsPage, NewsQuery, ProfileApi, ProfileDetails},
    config::SdkConfig,
    envelope::ApiEnvelope,
    error::SdkError,
};

#[derive(Debug, Clone)]
pub struct ContentApiClient {
    base: String,
    http_client: reqwest::Client,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: ProfileDetails,
}

impl ContentApiClient {
    pub fn new(config: &SdkConfig) -> Self {
        Self::with_base(config.content_api_base())
    }

    pub fn with_base(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Builds `{base}/{segments...}`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SdkError> {
        let mut url = Url::parse(&self.base)
            .map_err(|e| SdkError::Config(format!("Invalid content API base: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| SdkError::Config("Content API base cannot be a base URL".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        fallback: &str,
    ) -> Result<T, SdkError> {
        let status = response.status();
        let body = response.text().await?;
        // Failures still carry an envelope; fall back to the status when they don't.
        match serde_json::from_str::<ApiEnvelope<T>>(&body) {
            Ok(envelope) => envelope.into_result(fallback),
            Err(_) if !status.is_success() => Err(SdkError::Api {
                status: status.as_u16(),
                message: fallback.to_string(),
            }),
            Err(e) => Err(SdkError::Envelope(format!("{}: {}", fallback, e))),
        }
    }

    pub async fn list_news(&self, query: &NewsQuery) -> Result<NewsPage, SdkError> {
        let response = self
            .http_client
            .get(self.endpoint(&["public", "news"])?)
            .query(&query.to_pairs())
            .send()
            .await?;
        Self::decode(response, "Failed to fetch news").await
    }

    pub async fn highlighted_news(&self) -> Result<Vec<NewsItem>, SdkError> {
        Ok(self.list_news(&NewsQuery::highlights()).await?.news)
    }

    /// Looks an article up by slug or numeric id. Unknown articles are `None`.
    pub async fn news_detail(&self, slug_or_id: &str) -> Result<Option<NewsItem>, SdkError> {
        let response = self
            .http_client
            .get(self.endpoint(&["public", "news", slug_or_id])?)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::decode(response, "Failed to fetch news detail")
            .await
            .map(Some)
    }

    pub async fn profile_details(&self, user_id: &str) -> Result<ProfileDetails, SdkError> {
        let response = self
            .http_client
            .get(self.endpoint(&["public", "users", user_id])?)
            .send()
            .await?;
        let envelope: UserEnvelope = Self::decode(response, "Failed to fetch user details").await?;
        Ok(envelope.user)
    }

    pub async fn cancel_subscription(&self, user_id: &str) -> Result<(), SdkError> {
        let response = self
            .http_client
            .post(self.endpoint(&["public", "subscription", "cancel"])?)
            .json(&json!({ "userId": user_id }))
            .send()
            .await?;
        let _: serde_json::Value =
            Self::decode(response, "Failed to cancel subscription").await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileApi for ContentApiClient {
    async fn ensure_profile(&self, user_id: &str, email: &str) -> Result<EnsuredProfile, SdkError> {
        let response = self
            .http_client
            .post(self.endpoint(&["public", "users"])?)
            .json(&json!({ "email": email, "userId": user_id }))
            .send()
            .await?;
        Self::decode(response, "Failed to create user").await
    }
}
