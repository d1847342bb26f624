use std::collections::HashSet;

use async_trait::async_trait;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    domain::entities::push_content::PushContent,
    use_cases::digest::DigestRepo,
};

#[derive(sqlx::FromRow, Debug)]
pub struct PushContentDb {
    pub id: i64,
    pub title: Option<String>,
    pub content: Option<String>,
}

#[async_trait]
impl DigestRepo for PostgresPersistence {
    async fn oldest_unpublished(&self) -> AppResult<Option<PushContent>> {
        let row = sqlx::query_as::<_, PushContentDb>(
            r#"
                SELECT id, title, content
                FROM push_content
                WHERE published = false
                ORDER BY date ASC
                LIMIT 1
            "#,
        )
        .fetch_optional(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(row.map(|r| PushContent {
            id: r.id,
            title: r.title,
            content: r.content,
        }))
    }

    async fn recorded_recipients(&self, content_id: i64) -> AppResult<HashSet<String>> {
        let rows: Vec<(Option<String>,)> =
            sqlx::query_as("SELECT user_mail FROM send_email WHERE mail_content_id = $1")
                .bind(content_id)
                .fetch_all(self.pool())
                .await
                .map_err(AppError::from)?;
        Ok(rows.into_iter().filter_map(|(email,)| email).collect())
    }

    async fn subscriber_emails(&self) -> AppResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
                SELECT email
                FROM user_profiles
                WHERE subscription_status IN ('pro', 'trial') AND email IS NOT NULL
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(rows.into_iter().map(|(email,)| email).collect())
    }

    async fn record_delivery(&self, content_id: i64, email: &str, delivered: bool) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO send_email (mail_content_id, user_mail, is_delivered) VALUES ($1, $2, $3)",
        )
        .bind(content_id)
        .bind(email)
        .bind(delivered)
        .execute(self.pool())
        .await
        .map_err(AppError::from)?;
        Ok(())
    }

    async fn mark_published(&self, content_id: i64) -> AppResult<()> {
        sqlx::query("UPDATE push_content SET published = true WHERE id = $1")
            .bind(content_id)
            .execute(self.pool())
            .await
            .map_err(AppError::from)?;
        Ok(())
    }
}
