use bitechina_types::ProfileStatus;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Application-level profile keyed by the identity provider's user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: Option<String>,
    pub subscription_status: ProfileStatus,
    pub has_used_trial: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
