//! JSON-file ledger: the in-memory tables, snapshotted to disk after every
//! write so separate CLI runs share one history.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use super::ledger_state::LedgerState;
use crate::domain::{
    Account, Article, ContentFingerprint, HistoryQuery, LedgerError, NewArticle,
    NewPublishRecord, Platform, PublishRecord, RecordId, RecordUpdate, TaskId,
};
use crate::ports::{Clock, ContentLedger, SystemClock};

pub struct JsonFileLedger {
    path: PathBuf,
    state: Mutex<LedgerState>,
    clock: Arc<dyn Clock>,
}

impl JsonFileLedger {
    /// Load the ledger at `path`, or start empty if the file does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        Self::open_with_clock(path, Arc::new(SystemClock)).await
    }

    pub async fn open_with_clock(
        path: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LedgerError> {
        let path = path.into();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => LedgerState::default(),
            Err(err) => return Err(err.into()),
        };
        debug!(path = %path.display(), "opened ledger");
        Ok(Self {
            path,
            state: Mutex::new(state),
            clock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the tables, persist the copy, then make it
    /// current. A failed write leaves both disk and memory untouched.
    async fn write<T>(
        &self,
        change: impl FnOnce(&mut LedgerState, DateTime<Utc>) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut guard = self.state.lock().await;
        let mut next = guard.clone();
        let out = change(&mut next, self.clock.now())?;
        self.persist(&next).await?;
        *guard = next;
        Ok(out)
    }

    async fn persist(&self, state: &LedgerState) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl ContentLedger for JsonFileLedger {
    async fn save_article(&self, article: NewArticle) -> Result<bool, LedgerError> {
        if self.is_duplicate(&article.fingerprint).await? {
            return Ok(false);
        }
        self.write(|state, now| Ok(state.save_article(article, now)))
            .await
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
        self.write(|state, now| Ok(state.save_record(record, now)))
            .await
    }

    async fn update_publish_record_status(
        &self,
        id: RecordId,
        update: RecordUpdate,
    ) -> Result<(), LedgerError> {
        self.write(|state, now| state.update_record(id, update, now))
            .await
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
        self.write(|state, now| {
            state.upsert_account(platform, authenticated, display_name, now);
            Ok(())
        })
        .await
    }

    async fn accounts(&self) -> Result<Vec<Account>, LedgerError> {
        Ok(self.state.lock().await.accounts())
    }
}
