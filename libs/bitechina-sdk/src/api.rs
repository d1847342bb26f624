//! Wire types and client-side seams for the content, profile and
//! subscription APIs.

use async_trait::async_trait;
use bitechina_types::{CheckoutRequest, Language, SubscriptionSnapshot};
use serde::{Deserialize, Serialize};

use crate::{article::build_article_path, error::SdkError};

// ============================================================================
// Content API
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: i64,
    #[serde(default)]
    pub slug: Option<String>,
    pub title: String,
    pub iso_date: String,
    pub link: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub ai_worth: Option<bool>,
    #[serde(default)]
    pub ai_reason_en: Option<String>,
    #[serde(default)]
    pub ai_reason_ko: Option<String>,
    #[serde(default)]
    pub translation_ko: Option<String>,
    #[serde(default)]
    pub translation_en: Option<String>,
    #[serde(default)]
    pub title_ko: Option<String>,
    #[serde(default)]
    pub title_en: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl NewsItem {
    /// Site path of the article in `language`.
    pub fn path(&self, language: Language) -> String {
        build_article_path(
            self.id,
            Some(self.title.as_str()),
            self.title_en.as_deref(),
            self.title_ko.as_deref(),
            language,
        )
    }

    /// Body in `language`, falling back to the other translation, then the source text.
    pub fn body(&self, language: Language) -> Option<&str> {
        let (first, second) = match language {
            Language::Ko => (&self.translation_ko, &self.translation_en),
            Language::En => (&self.translation_en, &self.translation_ko),
        };
        first
            .as_deref()
            .or(second.as_deref())
            .or(self.content.as_deref())
            .filter(|b| !b.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current: u32,
    pub total: u32,
    pub count: u32,
    pub total_count: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewsPage {
    pub news: Vec<NewsItem>,
    pub pagination: Pagination,
}

/// Filters for the news listing. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    pub hot: Option<bool>,
    pub latest: Option<bool>,
}

impl NewsQuery {
    /// Latest ten items, used for the home page highlights.
    pub fn highlights() -> Self {
        Self {
            limit: Some(10),
            latest: Some(true),
            ..Default::default()
        }
    }

    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(hot) = self.hot {
            pairs.push(("hot", hot.to_string()));
        }
        if let Some(latest) = self.latest {
            pairs.push(("latest", latest.to_string()));
        }
        pairs
    }
}

// ============================================================================
// Profile API
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnsuredUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub subscription_status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsuredProfile {
    pub user: EnsuredUser,
    pub is_new_user: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileDetails {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub subscription_status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub subscribed: Option<String>,
    #[serde(default)]
    pub latest_renewal: Option<String>,
    #[serde(default)]
    pub transactions: Option<i64>,
    #[serde(default)]
    pub current_period_start: Option<String>,
    #[serde(default)]
    pub current_period_end: Option<String>,
}

#[async_trait]
pub trait ProfileApi: Send + Sync {
    /// Creates the profile row for this identity if missing.
    async fn ensure_profile(&self, user_id: &str, email: &str) -> Result<EnsuredProfile, SdkError>;
}

// ============================================================================
// Subscription backend
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// Send the browser to the hosted checkout page.
    Redirect(String),
    /// The user already pays in another currency and must cancel first.
    CurrencyMismatch {
        message: String,
        current_currency: String,
        desired_currency: String,
    },
}

#[async_trait]
pub trait SubscriptionApi: Send + Sync {
    async fn check_subscription(&self, access_token: &str)
    -> Result<SubscriptionSnapshot, SdkError>;

    async fn create_checkout(
        &self,
        access_token: &str,
        request: &CheckoutRequest,
    ) -> Result<CheckoutOutcome, SdkError>;
}
