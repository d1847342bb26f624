use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    app_error::AppResult,
    application::email_templates::digest_email,
    domain::entities::push_content::{DeliveryFailure, PushContent},
};

#[async_trait]
pub trait DigestRepo: Send + Sync {
    /// Oldest content not yet published, by creation date.
    async fn oldest_unpublished(&self) -> AppResult<Option<PushContent>>;
    /// Emails that already have a delivery record for this content.
    async fn recorded_recipients(&self, content_id: i64) -> AppResult<HashSet<String>>;
    /// Emails of profiles entitled to the digest (pro or trial).
    async fn subscriber_emails(&self) -> AppResult<Vec<String>>;
    async fn record_delivery(&self, content_id: i64, email: &str, delivered: bool)
    -> AppResult<()>;
    async fn mark_published(&self, content_id: i64) -> AppResult<()>;
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestSummary {
    pub content_id: i64,
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    pub failures: Vec<DeliveryFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestOutcome {
    NothingPending,
    NoNewRecipients { content_id: i64 },
    Sent(DigestSummary),
}

impl DigestOutcome {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            DigestOutcome::NothingPending => Some("No unpublished push content to send"),
            DigestOutcome::NoNewRecipients { .. } => Some("No new recipients to notify"),
            DigestOutcome::Sent(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct DigestUseCases {
    repo: Arc<dyn DigestRepo>,
    email: Arc<dyn EmailSender>,
}

impl DigestUseCases {
    pub fn new(repo: Arc<dyn DigestRepo>, email: Arc<dyn EmailSender>) -> Self {
        Self { repo, email }
    }

    /// Mails the oldest pending digest to every entitled subscriber that has
    /// no delivery record for it yet, then marks it published.
    #[instrument(skip(self))]
    pub async fn dispatch_pending(&self) -> AppResult<DigestOutcome> {
        let Some(content) = self.repo.oldest_unpublished().await? else {
            info!("No unpublished push content");
            return Ok(DigestOutcome::NothingPending);
        };

        let recorded = self.repo.recorded_recipients(content.id).await?;
        let subscribers = self.repo.subscriber_emails().await?;

        let mut seen = HashSet::new();
        let recipients: Vec<String> = subscribers
            .into_iter()
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
            .filter(|email| !recorded.contains(email))
            .filter(|email| seen.insert(email.clone()))
            .collect();

        if recipients.is_empty() {
            info!(content_id = content.id, "No new recipients, marking published");
            self.mark_published(content.id).await;
            return Ok(DigestOutcome::NoNewRecipients {
                content_id: content.id,
            });
        }

        let (subject, html) = digest_email(
            content.content.as_deref().unwrap_or_default(),
            Utc::now().date_naive(),
        );
        info!(
            content_id = content.id,
            recipients = recipients.len(),
            "Dispatching digest"
        );

        let mut failures = Vec::new();
        for email in &recipients {
            let delivered = match self.email.send(email, &subject, &html).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(content_id = content.id, email = %email, error = %e, "Digest delivery failed");
                    failures.push(DeliveryFailure {
                        email: email.clone(),
                        error: e.to_string(),
                    });
                    false
                }
            };

            if let Err(e) = self
                .repo
                .record_delivery(content.id, email, delivered)
                .await
            {
                warn!(content_id = content.id, email = %email, error = %e, "Failed to record delivery");
            }
        }

        self.mark_published(content.id).await;

        let summary = DigestSummary {
            content_id: content.id,
            attempted: recipients.len(),
            delivered: recipients.len() - failures.len(),
            failed: failures.len(),
            failures,
        };
        info!(
            content_id = summary.content_id,
            delivered = summary.delivered,
            failed = summary.failed,
            "Digest dispatched"
        );
        Ok(DigestOutcome::Sent(summary))
    }

    async fn mark_published(&self, content_id: i64) {
        if let Err(e) = self.repo.mark_published(content_id).await {
            warn!(content_id, error = %e, "Failed to mark content as published");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{InMemoryDigestRepo, InMemoryEmailSender, create_test_push_content};

    fn setup(repo: InMemoryDigestRepo) -> (Arc<InMemoryDigestRepo>, Arc<InMemoryEmailSender>, DigestUseCases) {
        let repo = Arc::new(repo);
        let email = Arc::new(InMemoryEmailSender::new());
        let use_cases = DigestUseCases::new(repo.clone(), email.clone());
        (repo, email, use_cases)
    }

    #[tokio::test]
    async fn test_nothing_pending() {
        let (_, email, use_cases) = setup(InMemoryDigestRepo::new());

        let outcome = use_cases.dispatch_pending().await.unwrap();

        assert_eq!(outcome, DigestOutcome::NothingPending);
        assert_eq!(outcome.message(), Some("No unpublished push content to send"));
        assert!(email.sent().is_empty());
    }

    #[tokio::test]
    async fn test_sends_to_each_subscriber_once_and_publishes() {
        let repo = InMemoryDigestRepo::new();
        repo.add_content(create_test_push_content(1, |c| {
            c.content = Some("line one\nline two".into())
        }));
        repo.add_subscriber(" a@example.com ");
        repo.add_subscriber("b@example.com");
        repo.add_subscriber("a@example.com");
        let (repo, email, use_cases) = setup(repo);

        let outcome = use_cases.dispatch_pending().await.unwrap();

        let DigestOutcome::Sent(summary) = outcome else {
            panic!("expected a sent digest");
        };
        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.delivered, 2);
        assert!(summary.failures.is_empty());

        let sent = email.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "a@example.com");
        assert!(sent[0].subject.starts_with("BiteChina Newsletter - "));
        assert_eq!(sent[0].html, "line one<br />line two");
        assert!(repo.is_published(1));
        assert_eq!(repo.deliveries(1).len(), 2);
    }

    #[tokio::test]
    async fn test_failed_recipient_is_reported_and_recorded() {
        let repo = InMemoryDigestRepo::new();
        repo.add_content(create_test_push_content(7, |_| {}));
        repo.add_subscriber("ok@example.com");
        repo.add_subscriber("bounce@example.com");
        let (repo, email, use_cases) = setup(repo);
        email.fail_for("bounce@example.com");

        let DigestOutcome::Sent(summary) = use_cases.dispatch_pending().await.unwrap() else {
            panic!("expected a sent digest");
        };

        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.delivered, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].email, "bounce@example.com");
        assert!(
            repo.deliveries(7)
                .contains(&("bounce@example.com".to_string(), false))
        );
    }

    #[tokio::test]
    async fn test_rerun_skips_recorded_recipients_and_publishes() {
        let repo = InMemoryDigestRepo::new();
        repo.add_content(create_test_push_content(3, |_| {}));
        repo.add_subscriber("a@example.com");
        repo.record_existing(3, "a@example.com", false);
        let (repo, email, use_cases) = setup(repo);

        let outcome = use_cases.dispatch_pending().await.unwrap();

        assert_eq!(outcome, DigestOutcome::NoNewRecipients { content_id: 3 });
        assert_eq!(outcome.message(), Some("No new recipients to notify"));
        assert!(email.sent().is_empty());
        assert!(repo.is_published(3));
    }

    #[tokio::test]
    async fn test_second_run_after_publish_has_nothing_pending() {
        let repo = InMemoryDigestRepo::new();
        repo.add_content(create_test_push_content(4, |_| {}));
        repo.add_subscriber("a@example.com");
        let (_, email, use_cases) = setup(repo);

        use_cases.dispatch_pending().await.unwrap();
        let second = use_cases.dispatch_pending().await.unwrap();

        assert_eq!(second, DigestOutcome::NothingPending);
        assert_eq!(email.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_record_failure_is_not_fatal() {
        let repo = InMemoryDigestRepo::new();
        repo.add_content(create_test_push_content(5, |_| {}));
        repo.add_subscriber("a@example.com");
        repo.fail_records(true);
        let (repo, _, use_cases) = setup(repo);

        let DigestOutcome::Sent(summary) = use_cases.dispatch_pending().await.unwrap() else {
            panic!("expected a sent digest");
        };

        assert_eq!(summary.delivered, 1);
        assert!(repo.is_published(5));
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = DigestSummary {
            content_id: 9,
            attempted: 1,
            delivered: 0,
            failed: 1,
            failures: vec![DeliveryFailure {
                email: "x@example.com".into(),
                error: "boom".into(),
            }],
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["contentId"], 9);
        assert_eq!(json["failures"][0]["email"], "x@example.com");
    }
}
