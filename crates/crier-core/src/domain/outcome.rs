//! Result shapes handed back to callers.
//!
//! `PlatformResult` is the common currency between adapters, the retry
//! wrapper and the dispatcher; the other types are views assembled from it
//! or from ledger rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fingerprint::ContentFingerprint;
use super::ids::{RecordId, TaskId};
use super::platform::{ContentType, Platform, PublishMethod};
use super::record::PublishRecord;
use super::status::PublishStatus;

/// Outcome of one platform's publish attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformResult {
    pub platform: Platform,
    pub status: PublishStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default)]
    pub retries: u32,
}

impl PlatformResult {
    pub fn published(platform: Platform) -> Self {
        Self::with_status(platform, PublishStatus::Published)
    }

    pub fn draft_saved(platform: Platform) -> Self {
        Self::with_status(platform, PublishStatus::DraftSaved)
    }

    pub fn failed(platform: Platform, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::with_status(platform, PublishStatus::Failed)
        }
    }

    pub fn with_status(platform: Platform, status: PublishStatus) -> Self {
        Self {
            platform,
            status,
            post_url: None,
            error: None,
            retries: 0,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.post_url = Some(url.into());
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl From<&PublishRecord> for PlatformResult {
    fn from(record: &PublishRecord) -> Self {
        Self {
            platform: record.platform,
            status: record.status,
            post_url: record.post_url.clone(),
            error: record.error.clone(),
            retries: record.retries,
        }
    }
}

/// Response of `submit` and `redrive`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: TaskId,
    pub fingerprint: ContentFingerprint,

    /// One entry per requested platform, in request order.
    pub results: Vec<PlatformResult>,

    pub created_at: DateTime<Utc>,

    /// True when the content had been submitted before and this is the
    /// earlier task's state.
    #[serde(default)]
    pub deduplicated: bool,
}

/// Aggregated view of a task, read back from the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub task_id: TaskId,
    pub status: PublishStatus,
    pub results: Vec<PlatformResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A failed record re-marked `processing`, waiting to be redriven.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryTarget {
    pub platform: Platform,
    pub record_id: RecordId,
}

/// What `retry` prepared: the platforms to publish again for a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryDescriptor {
    pub task_id: TaskId,
    pub fingerprint: ContentFingerprint,
    pub targets: Vec<RetryTarget>,
}

impl RetryDescriptor {
    pub fn platforms(&self) -> Vec<Platform> {
        self.targets.iter().map(|t| t.platform).collect()
    }
}

/// One row of `list_targets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetInfo {
    pub platform: Platform,
    pub display_name: String,
    pub method: PublishMethod,
    pub authenticated: bool,
    pub content_types: Vec<ContentType>,
}

/// One page of publish history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub records: Vec<PublishRecord>,
    pub total: usize,
    pub page: usize,
    pub size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_carries_error() {
        let r = PlatformResult::failed(Platform::Csdn, "boom");
        assert_eq!(r.status, PublishStatus::Failed);
        assert_eq!(r.error.as_deref(), Some("boom"));
        assert!(!r.is_success());
    }

    #[test]
    fn result_json_omits_empty_optionals() {
        let r = PlatformResult::published(Platform::Zhihu).with_url("https://z.example/p/1");
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["platform"], "zhihu");
        assert_eq!(v["status"], "published");
        assert_eq!(v["post_url"], "https://z.example/p/1");
        assert!(v.get("error").is_none());
    }
}
