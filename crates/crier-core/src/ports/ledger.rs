//! ContentLedger port: the source of truth for articles, publish records and
//! accounts.
//!
//! # Rules
//! - Every write is its own unit; a failed write leaves sibling writes alone.
//! - `save_article` is the only place dedup state is established.
//! - Record updates are partial: only `Some` fields overwrite.

use async_trait::async_trait;

use crate::domain::{
    Account, Article, ContentFingerprint, HistoryQuery, LedgerError, NewArticle,
    NewPublishRecord, Platform, PublishRecord, RecordId, RecordUpdate, TaskId,
};

#[async_trait]
pub trait ContentLedger: Send + Sync {
    /// Store the article unless its fingerprint is already known.
    ///
    /// Returns `true` when a new row was written.
    async fn save_article(&self, article: NewArticle) -> Result<bool, LedgerError>;

    async fn is_duplicate(&self, fingerprint: &ContentFingerprint) -> Result<bool, LedgerError>;

    async fn article_by_fingerprint(
        &self,
        fingerprint: &ContentFingerprint,
    ) -> Result<Option<Article>, LedgerError>;

    /// Task id of the newest publish record carrying this fingerprint.
    async fn latest_task_id_for_fingerprint(
        &self,
        fingerprint: &ContentFingerprint,
    ) -> Result<Option<TaskId>, LedgerError>;

    async fn save_publish_record(&self, record: NewPublishRecord)
    -> Result<RecordId, LedgerError>;

    async fn update_publish_record_status(
        &self,
        id: RecordId,
        update: RecordUpdate,
    ) -> Result<(), LedgerError>;

    /// All records of a task, in insertion order.
    async fn records_for_task(&self, task_id: &TaskId) -> Result<Vec<PublishRecord>, LedgerError>;

    /// One page of records, newest first, plus the total number of matches.
    async fn history(
        &self,
        query: &HistoryQuery,
    ) -> Result<(Vec<PublishRecord>, usize), LedgerError>;

    async fn upsert_account(
        &self,
        platform: Platform,
        authenticated: bool,
        display_name: Option<String>,
    ) -> Result<(), LedgerError>;

    async fn accounts(&self) -> Result<Vec<Account>, LedgerError>;
}
