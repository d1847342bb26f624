//! In-memory fakes for the digest store and email sender.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Mutex;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::push_content::PushContent,
    use_cases::digest::{DigestRepo, EmailSender},
};

// ============================================================================
// InMemoryDigestRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryDigestRepo {
    /// Pending content in publication order.
    pub contents: Mutex<Vec<PushContent>>,
    pub published: Mutex<HashSet<i64>>,
    pub subscribers: Mutex<Vec<String>>,
    pub deliveries: Mutex<Vec<(i64, String, bool)>>,
    pub fail_records: Mutex<bool>,
}

impl InMemoryDigestRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_content(&self, content: PushContent) {
        self.contents.lock().unwrap().push(content);
    }

    pub fn add_subscriber(&self, email: &str) {
        self.subscribers.lock().unwrap().push(email.to_string());
    }

    pub fn record_existing(&self, content_id: i64, email: &str, delivered: bool) {
        self.deliveries
            .lock()
            .unwrap()
            .push((content_id, email.to_string(), delivered));
    }

    pub fn fail_records(&self, fail: bool) {
        *self.fail_records.lock().unwrap() = fail;
    }

    pub fn is_published(&self, content_id: i64) -> bool {
        self.published.lock().unwrap().contains(&content_id)
    }

    pub fn deliveries(&self, content_id: i64) -> Vec<(String, bool)> {
        self.deliveries
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _, _)| *id == content_id)
            .map(|(_, email, delivered)| (email.clone(), *delivered))
            .collect()
    }
}

#[async_trait]
impl DigestRepo for InMemoryDigestRepo {
    async fn oldest_unpublished(&self) -> AppResult<Option<PushContent>> {
        let published = self.published.lock().unwrap();
        Ok(self
            .contents
            .lock()
            .unwrap()
            .iter()
            .find(|c| !published.contains(&c.id))
            .cloned())
    }

    async fn recorded_recipients(&self, content_id: i64) -> AppResult<HashSet<String>> {
        Ok(self
            .deliveries(content_id)
            .into_iter()
            .map(|(email, _)| email)
            .collect())
    }

    async fn subscriber_emails(&self) -> AppResult<Vec<String>> {
        Ok(self.subscribers.lock().unwrap().clone())
    }

    async fn record_delivery(&self, content_id: i64, email: &str, delivered: bool) -> AppResult<()> {
        if *self.fail_records.lock().unwrap() {
            return Err(AppError::Database("insert failed".into()));
        }
        self.record_existing(content_id, email, delivered);
        Ok(())
    }

    async fn mark_published(&self, content_id: i64) -> AppResult<()> {
        self.published.lock().unwrap().insert(content_id);
        Ok(())
    }
}

// ============================================================================
// InMemoryEmailSender
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Default)]
pub struct InMemoryEmailSender {
    pub sent: Mutex<Vec<SentEmail>>,
    pub failing: Mutex<HashSet<String>>,
}

impl InMemoryEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, email: &str) {
        self.failing.lock().unwrap().insert(email.to_string());
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for InMemoryEmailSender {
    async fn send(&self, to: &str, subject: &str, html: &str) -> AppResult<()> {
        if self.failing.lock().unwrap().contains(to) {
            return Err(AppError::Upstream(format!("Resend error 422: rejected {to}")));
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}
