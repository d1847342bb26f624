use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subscription status values stored on a user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStatus {
    #[default]
    Free,
    Trial,
    Pro,
    Canceled,
    PastDue,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Trial => "trial",
            Self::Pro => "pro",
            Self::Canceled => "canceled",
            Self::PastDue => "past_due",
        }
    }

    /// Lenient parse for values read back from the profile store.
    /// Unknown or missing values are treated as `Free`.
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("trial") | Some("trialing") => Self::Trial,
            Some("pro") | Some("active") => Self::Pro,
            Some("canceled") | Some("cancelled") => Self::Canceled,
            Some("past_due") => Self::PastDue,
            _ => Self::Free,
        }
    }

    /// Statuses that receive the digest email.
    pub fn receives_digest(&self) -> bool {
        matches!(self, Self::Pro | Self::Trial)
    }
}

impl std::fmt::Display for ProfileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entitlement snapshot returned by the subscription status endpoint.
///
/// `subscribed` is true only when the payment processor currently reports an
/// active subscription for the caller's email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SubscriptionSnapshot {
    #[serde(default)]
    pub subscribed: bool,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub subscription_end: Option<DateTime<Utc>>,
}

impl SubscriptionSnapshot {
    pub fn unsubscribed() -> Self {
        Self::default()
    }
}
