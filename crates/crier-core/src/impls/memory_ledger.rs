//! In-memory ledger for tests and dry runs.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::ledger_state::LedgerState;
use crate::domain::{
    Account, Article, ContentFingerprint, HistoryQuery, LedgerError, NewArticle,
    NewPublishRecord, Platform, PublishRecord, RecordId, RecordUpdate, TaskId,
};
use crate::ports::{Clock, ContentLedger, SystemClock};

/// Keeps every row in process memory. Lost on exit.
#[derive(Clone)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(LedgerState::default())),
            clock,
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentLedger for InMemoryLedger {
    async fn save_article(&self, article: NewArticle) -> Result<bool, LedgerError> {
        let now = self.clock.now();
        Ok(self.state.lock().await.save_article(article, now))
    }

    async fn is_duplicate(&self, fingerprint: &ContentFingerprint) -> Result<bool, LedgerError> {
        Ok(self.state.lock().await.is_duplicate(fingerprint))
    }

    async fn article_by_fingerprint(
        &self,
        fingerprint: &ContentFingerprint,
    ) -> Result<Option<Article>, LedgerError> {
        Ok(self.state.lock().await.article_by_fingerprint(fingerprint))
    }

    async fn latest_task_id_for_fingerprint(
        &self,
        fingerprint: &ContentFingerprint,
    ) -> Result<Option<TaskId>, LedgerError> {
        Ok(self.state.lock().await.latest_task_id(fingerprint))
    }

    async fn save_publish_record(
        &self,
        record: NewPublishRecord,
    ) -> Result<RecordId, LedgerError> {
        let now = self.clock.now();
        Ok(self.state.lock().await.save_record(record, now))
    }

    async fn update_publish_record_status(
        &self,
        id: RecordId,
        update: RecordUpdate,
    ) -> Result<(), LedgerError> {
        let now = self.clock.now();
        self.state.lock().await.update_record(id, update, now)
    }

    async fn records_for_task(&self, task_id: &TaskId) -> Result<Vec<PublishRecord>, LedgerError> {
        Ok(self.state.lock().await.records_for_task(task_id))
    }

    async fn history(
        &self,
        query: &HistoryQuery,
    ) -> Result<(Vec<PublishRecord>, usize), LedgerError> {
        Ok(self.state.lock().await.history(query))
    }

    async fn upsert_account(
        &self,
        platform: Platform,
        authenticated: bool,
        display_name: Option<String>,
    ) -> Result<(), LedgerError> {
        let now = self.clock.now();
        self.state
            .lock()
            .await
            .upsert_account(platform, authenticated, display_name, now);
        Ok(())
    }

    async fn accounts(&self) -> Result<Vec<Account>, LedgerError> {
        Ok(self.state.lock().await.accounts())
    }
}
