use async_trait::async_trait;
use bitechina_types::ProfileStatus;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::user_profile::UserProfile,
    use_cases::subscription::UserProfileRepo,
};

// Profile row as stored in the db.
#[derive(sqlx::FromRow, Debug)]
pub struct UserProfileDb {
    pub id: Uuid,
    pub email: Option<String>,
    pub subscription_status: Option<String>,
    pub has_used_trial: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<UserProfileDb> for UserProfile {
    fn from(row: UserProfileDb) -> Self {
        UserProfile {
            id: row.id,
            email: row.email,
            subscription_status: ProfileStatus::from_raw(row.subscription_status.as_deref()),
            has_used_trial: row.has_used_trial.unwrap_or(false),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl UserProfileRepo for PostgresPersistence {
    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, UserProfileDb>(
            r#"
                SELECT id, email, subscription_status, has_used_trial, created_at, updated_at
                FROM user_profiles
                WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(row.map(UserProfile::from))
    }

    async fn set_subscription_status(&self, user_id: Uuid, status: ProfileStatus) -> AppResult<()> {
        sqlx::query(
            "UPDATE user_profiles SET subscription_status = $2, updated_at = now() WHERE id = $1",
        )
        .bind(user_id)
        .bind(status.as_str())
        .execute(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn mark_trial_used(&self, user_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
                UPDATE user_profiles
                SET has_used_trial = true, updated_at = now()
                WHERE id = $1 AND has_used_trial IS NOT TRUE
            "#,
        )
        .bind(user_id)
        .execute(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(result.rows_affected() > 0)
    }
}
