//! Ledger tables shared by the in-memory and JSON-file ledgers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Account, Article, ArticleId, ContentFingerprint, HistoryQuery, LedgerError, NewArticle,
    NewPublishRecord, Platform, PublishRecord, RecordId, RecordUpdate, TaskId,
};

/// All ledger rows.
///
/// Rows are kept in id order; ids are allocated here and never reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct LedgerState {
    articles: Vec<Article>,
    records: Vec<PublishRecord>,
    accounts: Vec<Account>,
    next_article_id: u64,
    next_record_id: u64,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            articles: Vec::new(),
            records: Vec::new(),
            accounts: Vec::new(),
            next_article_id: 1,
            next_record_id: 1,
        }
    }
}

impl LedgerState {
    fn allocate_article_id(&mut self) -> ArticleId {
        let id = ArticleId::new(self.next_article_id);
        self.next_article_id += 1;
        id
    }

    fn allocate_record_id(&mut self) -> RecordId {
        let id = RecordId::new(self.next_record_id);
        self.next_record_id += 1;
        id
    }

    pub(crate) fn save_article(&mut self, new: NewArticle, now: DateTime<Utc>) -> bool {
        if self.is_duplicate(&new.fingerprint) {
            return false;
        }
        let id = self.allocate_article_id();
        self.articles.push(Article {
            id,
            title: new.title,
            fingerprint: new.fingerprint,
            content_type: new.content_type,
            tags: new.tags,
            created_at: now,
        });
        true
    }

    pub(crate) fn is_duplicate(&self, fingerprint: &ContentFingerprint) -> bool {
        self.articles.iter().any(|a| &a.fingerprint == fingerprint)
    }

    pub(crate) fn article_by_fingerprint(&self, fingerprint: &ContentFingerprint) -> Option<Article> {
        self.articles
            .iter()
            .find(|a| &a.fingerprint == fingerprint)
            .cloned()
    }

    pub(crate) fn latest_task_id(&self, fingerprint: &ContentFingerprint) -> Option<TaskId> {
        self.records
            .iter()
            .filter(|r| &r.article_fingerprint == fingerprint)
            .max_by_key(|r| (r.created_at, r.id))
            .map(|r| r.task_id.clone())
    }

    pub(crate) fn save_record(&mut self, new: NewPublishRecord, now: DateTime<Utc>) -> RecordId {
        let id = self.allocate_record_id();
        self.records.push(PublishRecord::new(id, new, now));
        id
    }

    pub(crate) fn update_record(
        &mut self,
        id: RecordId,
        update: RecordUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let index = self
            .records
            .binary_search_by_key(&id, |r| r.id)
            .map_err(|_| LedgerError::RecordNotFound(id))?;
        self.records[index].apply(update, now)
    }

    pub(crate) fn records_for_task(&self, task_id: &TaskId) -> Vec<PublishRecord> {
        self.records
            .iter()
            .filter(|r| &r.task_id == task_id)
            .cloned()
            .collect()
    }

    /// Matching records newest first, one page of them, plus the match count.
    pub(crate) fn history(&self, query: &HistoryQuery) -> (Vec<PublishRecord>, usize) {
        let mut matching: Vec<&PublishRecord> = self
            .records
            .iter()
            .filter(|r| query.platform.is_none_or(|p| r.platform == p))
            .filter(|r| query.status.is_none_or(|s| r.status == s))
            .collect();
        matching.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));

        let total = matching.len();
        let page = matching
            .into_iter()
            .skip(query.offset())
            .take(query.size)
            .cloned()
            .collect();
        (page, total)
    }

    pub(crate) fn upsert_account(
        &mut self,
        platform: Platform,
        authenticated: bool,
        display_name: Option<String>,
        now: DateTime<Utc>,
    ) {
        match self.accounts.iter_mut().find(|a| a.platform == platform) {
            Some(account) => {
                account.authenticated = authenticated;
                if display_name.is_some() {
                    account.display_name = display_name;
                }
                account.last_checked_at = now;
            }
            None => self.accounts.push(Account {
                platform,
                display_name,
                authenticated,
                last_checked_at: now,
            }),
        }
    }

    pub(crate) fn accounts(&self) -> Vec<Account> {
        self.accounts.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContentType, PublishStatus};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn fp(c: char) -> ContentFingerprint {
        ContentFingerprint::from_hex(c.to_string().repeat(32))
    }

    fn record(task: &str, fingerprint: ContentFingerprint, platform: Platform) -> NewPublishRecord {
        NewPublishRecord::new(TaskId::new(task), fingerprint, platform, PublishStatus::Processing)
    }

    #[test]
    fn article_is_stored_once_per_fingerprint() {
        let mut state = LedgerState::default();
        let new = NewArticle {
            title: "T".into(),
            fingerprint: fp('a'),
            content_type: ContentType::Article,
            tags: vec!["rust".into()],
        };

        assert!(state.save_article(new.clone(), t0()));
        assert!(!state.save_article(new, t0()));
        assert!(state.is_duplicate(&fp('a')));
        assert!(!state.is_duplicate(&fp('b')));
        assert_eq!(
            state.article_by_fingerprint(&fp('a')).unwrap().id,
            ArticleId::new(1)
        );
    }

    #[test]
    fn latest_task_prefers_newest_record() {
        let mut state = LedgerState::default();
        state.save_record(record("first0000000", fp('a'), Platform::Zhihu), t0());
        state.save_record(
            record("second000000", fp('a'), Platform::Zhihu),
            t0() + Duration::seconds(1),
        );
        state.save_record(
            record("other0000000", fp('b'), Platform::Zhihu),
            t0() + Duration::seconds(2),
        );

        assert_eq!(
            state.latest_task_id(&fp('a')),
            Some(TaskId::new("second000000"))
        );
        assert_eq!(state.latest_task_id(&fp('c')), None);
    }

    #[test]
    fn updating_unknown_record_fails() {
        let mut state = LedgerState::default();
        let err = state
            .update_record(
                RecordId::new(9),
                RecordUpdate::status(PublishStatus::Published),
                t0(),
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::RecordNotFound(id) if id == RecordId::new(9)));
    }

    #[test]
    fn history_filters_and_pages_newest_first() {
        let mut state = LedgerState::default();
        for (i, platform) in [Platform::Zhihu, Platform::Csdn, Platform::Zhihu, Platform::Juejin]
            .into_iter()
            .enumerate()
        {
            state.save_record(
                record("task00000000", fp('a'), platform),
                t0() + Duration::seconds(i as i64),
            );
        }
        state
            .update_record(
                RecordId::new(2),
                RecordUpdate::status(PublishStatus::Failed),
                t0(),
            )
            .unwrap();

        let (page, total) = state.history(&HistoryQuery::new(1, 3));
        assert_eq!(total, 4);
        let ids: Vec<u64> = page.iter().map(|r| r.id.value()).collect();
        assert_eq!(ids, vec![4, 3, 2]);

        let (page, total) = state.history(&HistoryQuery::new(2, 3));
        assert_eq!(total, 4);
        assert_eq!(page.len(), 1);

        let (page, total) = state.history(&HistoryQuery::default().with_platform(Platform::Zhihu));
        assert_eq!(total, 2);
        assert!(page.iter().all(|r| r.platform == Platform::Zhihu));

        let (_, total) = state.history(&HistoryQuery::default().with_status(PublishStatus::Failed));
        assert_eq!(total, 1);

        let (page, total) = state.history(&HistoryQuery::new(5, 10));
        assert_eq!(total, 4);
        assert!(page.is_empty());
    }

    #[test]
    fn account_upsert_keeps_one_row_per_platform() {
        let mut state = LedgerState::default();
        state.upsert_account(Platform::Zhihu, false, Some("me".into()), t0());
        state.upsert_account(Platform::Zhihu, true, None, t0() + Duration::seconds(5));

        let accounts = state.accounts();
        assert_eq!(accounts.len(), 1);
        assert!(accounts[0].authenticated);
        assert_eq!(accounts[0].display_name.as_deref(), Some("me"));
        assert_eq!(accounts[0].last_checked_at, t0() + Duration::seconds(5));
    }
}
