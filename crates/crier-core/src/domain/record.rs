//! Stored rows: articles, publish records, accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::LedgerError;
use super::fingerprint::ContentFingerprint;
use super::ids::{ArticleId, RecordId, TaskId};
use super::platform::{ContentType, Platform};
use super::status::PublishStatus;

/// One row per distinct fingerprint. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub title: String,
    pub fingerprint: ContentFingerprint,
    pub content_type: ContentType,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Input of `ContentLedger::save_article`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub title: String,
    pub fingerprint: ContentFingerprint,
    pub content_type: ContentType,
    pub tags: Vec<String>,
}

/// Outcome of one platform within one task.
///
/// Design:
/// - This is the single source of truth for per-platform state.
/// - All status changes go through `apply`, which enforces the state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRecord {
    pub id: RecordId,
    pub task_id: TaskId,
    pub article_fingerprint: ContentFingerprint,
    pub platform: Platform,
    pub status: PublishStatus,
    pub post_url: Option<String>,
    pub error: Option<String>,
    pub retries: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PublishRecord {
    pub fn new(id: RecordId, new: NewPublishRecord, now: DateTime<Utc>) -> Self {
        Self {
            id,
            task_id: new.task_id,
            article_fingerprint: new.fingerprint,
            platform: new.platform,
            status: new.status,
            post_url: new.post_url,
            error: new.error,
            retries: new.retries,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update. Only `Some` fields overwrite.
    pub fn apply(&mut self, update: RecordUpdate, now: DateTime<Utc>) -> Result<(), LedgerError> {
        if !self.status.can_transition_to(update.status) {
            return Err(LedgerError::InvalidTransition {
                id: self.id,
                from: self.status,
                to: update.status,
            });
        }
        self.status = update.status;
        if let Some(url) = update.post_url {
            self.post_url = Some(url);
        }
        if let Some(error) = update.error {
            self.error = Some(error);
        }
        if let Some(retries) = update.retries {
            self.retries = retries;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Input of `ContentLedger::save_publish_record`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPublishRecord {
    pub task_id: TaskId,
    pub fingerprint: ContentFingerprint,
    pub platform: Platform,
    pub status: PublishStatus,
    pub post_url: Option<String>,
    pub error: Option<String>,
    pub retries: u32,
}

impl NewPublishRecord {
    pub fn new(
        task_id: TaskId,
        fingerprint: ContentFingerprint,
        platform: Platform,
        status: PublishStatus,
    ) -> Self {
        Self {
            task_id,
            fingerprint,
            platform,
            status,
            post_url: None,
            error: None,
            retries: 0,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Partial update of a publish record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordUpdate {
    pub status: PublishStatus,
    pub post_url: Option<String>,
    pub error: Option<String>,
    pub retries: Option<u32>,
}

impl RecordUpdate {
    /// Change only the status.
    pub fn status(status: PublishStatus) -> Self {
        Self {
            status,
            post_url: None,
            error: None,
            retries: None,
        }
    }
}

/// Cached authentication state of one platform account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub platform: Platform,
    pub display_name: Option<String>,
    pub authenticated: bool,
    pub last_checked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn record(status: PublishStatus) -> PublishRecord {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let new = NewPublishRecord::new(
            TaskId::new("task00000001"),
            ContentFingerprint::from_hex("f".repeat(32)),
            Platform::Csdn,
            status,
        );
        PublishRecord::new(RecordId::new(1), new, now)
    }

    #[test]
    fn partial_update_keeps_unset_fields() {
        let mut r = record(PublishStatus::Processing);
        r.error = Some("old".into());
        let later = r.created_at + Duration::seconds(5);

        r.apply(
            RecordUpdate {
                status: PublishStatus::Published,
                post_url: Some("https://example.com/p/1".into()),
                error: None,
                retries: Some(2),
            },
            later,
        )
        .unwrap();

        assert_eq!(r.status, PublishStatus::Published);
        assert_eq!(r.post_url.as_deref(), Some("https://example.com/p/1"));
        assert_eq!(r.error.as_deref(), Some("old"));
        assert_eq!(r.retries, 2);
        assert_eq!(r.updated_at, later);
    }

    #[test]
    fn terminal_record_rejects_updates() {
        let mut r = record(PublishStatus::Published);
        let before = r.clone();
        let err = r
            .apply(RecordUpdate::status(PublishStatus::Processing), Utc::now())
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidTransition { .. }));
        assert_eq!(r, before);
    }
}
