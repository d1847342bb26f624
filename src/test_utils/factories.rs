//! Test data factories. Use the closure parameter to override fields.

use bitechina_types::ProfileStatus;
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::{
    application::ports::payment_processor::{ActiveSubscription, SubscriptionLine},
    domain::entities::{push_content::PushContent, user_profile::UserProfile},
};

pub fn test_datetime() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
}

pub fn create_test_profile(id: Uuid, overrides: impl FnOnce(&mut UserProfile)) -> UserProfile {
    let mut profile = UserProfile {
        id,
        email: Some(crate::test_utils::TEST_EMAIL.to_string()),
        subscription_status: ProfileStatus::Free,
        has_used_trial: false,
        created_at: Some(test_datetime()),
        updated_at: Some(test_datetime()),
    };
    overrides(&mut profile);
    profile
}

/// Active USD subscription on the default price, no trial.
pub fn create_test_subscription(
    overrides: impl FnOnce(&mut ActiveSubscription),
) -> ActiveSubscription {
    let mut subscription = ActiveSubscription {
        id: "sub_test123".to_string(),
        current_period_end: Some(Utc.with_ymd_and_hms(2024, 2, 15, 12, 0, 0).unwrap()),
        trial_start: None,
        trial_end: None,
        cancel_at: None,
        first_line: Some(SubscriptionLine {
            price_id: "price_default".to_string(),
            product_id: Some("prod_pro".to_string()),
            currency: "usd".to_string(),
        }),
    };
    overrides(&mut subscription);
    subscription
}

pub fn create_test_push_content(id: i64, overrides: impl FnOnce(&mut PushContent)) -> PushContent {
    let mut content = PushContent {
        id,
        title: Some("This week in Chinese food".to_string()),
        content: Some("Hello readers".to_string()),
    };
    overrides(&mut content);
    content
}
