//! Dispatcher: the publish engine.
//!
//! One `submit` fans a request out to its platforms under a per-submission
//! limiter, retries each platform independently and records every outcome in
//! the ledger. The dispatcher is an explicit instance; build one with
//! `DispatcherBuilder`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use super::registry::AdapterRegistry;
use super::retry::{RetryPolicy, publish_with_retry};
use super::status::task_status;
use crate::domain::{
    Account, ContentFingerprint, CrierError, HistoryPage, HistoryQuery, LedgerError, NewArticle,
    NewPublishRecord, Platform, PlatformResult, PublishRecord, PublishRequest, PublishStatus,
    RecordId,
    RecordUpdate, RetryDescriptor, RetryTarget, TargetInfo, TaskId, TaskResult, TaskStatus,
    ValidationError,
};
use crate::ports::{Clock, ContentLedger, IdGenerator};

/// Platforms of one submission published at the same time.
pub const MAX_CONCURRENCY: usize = 3;

/// Upper bound on a single `check_auth` probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(15);

pub struct Dispatcher {
    pub(super) registry: Arc<AdapterRegistry>,
    pub(super) ledger: Arc<dyn ContentLedger>,
    pub(super) ids: Arc<dyn IdGenerator>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) retry_policy: RetryPolicy,
    pub(super) probe_timeout: Duration,
}

impl Dispatcher {
    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Publish `request` to every platform it names.
    ///
    /// Content seen before short-circuits: the earlier task's state comes
    /// back with `deduplicated` set and no adapter is called.
    pub async fn submit(&self, request: PublishRequest) -> Result<TaskResult, CrierError> {
        request.validate()?;
        let fingerprint = request.fingerprint();

        if self.ledger.is_duplicate(&fingerprint).await?
            && let Some(previous) = self.latest_task_for(&fingerprint).await?
        {
            info!(task_id = %previous.task_id, %fingerprint, "duplicate content, returning earlier task");
            return Ok(TaskResult {
                task_id: previous.task_id,
                fingerprint,
                results: previous.results,
                created_at: previous.created_at,
                deduplicated: true,
            });
        }

        let task_id = self.ids.generate_task_id();
        let created_at = self.clock.now();

        let is_new = self
            .ledger
            .save_article(NewArticle {
                title: request.title.clone(),
                fingerprint: fingerprint.clone(),
                content_type: request.content_type,
                tags: request.tags.clone(),
            })
            .await?;
        if !is_new {
            debug!(%task_id, %fingerprint, "article already stored");
        }

        info!(%task_id, %fingerprint, platforms = request.platforms.len(), "publishing");
        let jobs = request.platforms.iter().map(|&p| (p, None)).collect();
        let results = self
            .fan_out(&task_id, &fingerprint, Arc::new(request), jobs)
            .await;

        Ok(TaskResult {
            task_id,
            fingerprint,
            results,
            created_at,
            deduplicated: false,
        })
    }

    /// Aggregated state of a task, `None` if the id is unknown.
    pub async fn status(&self, task_id: &TaskId) -> Result<Option<TaskStatus>, CrierError> {
        let records = self.ledger.records_for_task(task_id).await?;
        Ok(task_status(task_id, &records))
    }

    /// Re-mark a task's failed records as `processing`, optionally only for
    /// one platform.
    ///
    /// `None` means there is nothing to retry. Nothing is published here;
    /// pass the descriptor to `redrive` to do that. If re-marking fails
    /// part way, the records already re-marked are put back to `failed`.
    pub async fn retry(
        &self,
        task_id: &TaskId,
        platform: Option<Platform>,
    ) -> Result<Option<RetryDescriptor>, CrierError> {
        self.prepare_retry(task_id, platform, None).await
    }

    /// `retry` followed by `redrive` of `request` in one call.
    ///
    /// The content is checked against the task before any record is
    /// re-marked, so a mismatch leaves the task untouched. `request.platforms`
    /// is replaced by the platforms being retried.
    pub async fn retry_with(
        &self,
        task_id: &TaskId,
        platform: Option<Platform>,
        mut request: PublishRequest,
    ) -> Result<Option<TaskResult>, CrierError> {
        request.validate_content()?;
        let fingerprint = request.fingerprint();
        let Some(descriptor) = self
            .prepare_retry(task_id, platform, Some(&fingerprint))
            .await?
        else {
            return Ok(None);
        };

        request.platforms = descriptor.platforms();
        self.redrive(&descriptor, request).await.map(Some)
    }

    async fn prepare_retry(
        &self,
        task_id: &TaskId,
        platform: Option<Platform>,
        content: Option<&ContentFingerprint>,
    ) -> Result<Option<RetryDescriptor>, CrierError> {
        let records = self.ledger.records_for_task(task_id).await?;
        if records.is_empty() {
            debug!(%task_id, "retry requested for unknown task");
            return Ok(None);
        }

        let failed: Vec<_> = records
            .into_iter()
            .filter(|r| r.status == PublishStatus::Failed)
            .filter(|r| platform.is_none_or(|p| r.platform == p))
            .collect();
        let Some(first) = failed.first() else {
            debug!(%task_id, ?platform, "nothing to retry");
            return Ok(None);
        };

        let fingerprint = first.article_fingerprint.clone();
        if let Some(actual) = content
            && *actual != fingerprint
        {
            return Err(ValidationError::FingerprintMismatch {
                expected: fingerprint,
                actual: actual.clone(),
            }
            .into());
        }
        if self
            .ledger
            .article_by_fingerprint(&fingerprint)
            .await?
            .is_none()
        {
            warn!(%task_id, %fingerprint, "article missing for task, cannot retry");
            return Ok(None);
        }

        let mut targets = Vec::with_capacity(failed.len());
        for record in &failed {
            let marked = self
                .ledger
                .update_publish_record_status(
                    record.id,
                    RecordUpdate::status(PublishStatus::Processing),
                )
                .await;
            if let Err(err) = marked {
                error!(%task_id, platform = %record.platform, error = %err, "could not re-mark record, rolling back");
                self.unmark(&targets).await;
                return Err(err.into());
            }
            targets.push(RetryTarget {
                platform: record.platform,
                record_id: record.id,
            });
        }

        info!(%task_id, targets = targets.len(), "prepared retry");
        Ok(Some(RetryDescriptor {
            task_id: task_id.clone(),
            fingerprint,
            targets,
        }))
    }

    /// Publish again to the platforms `retry` prepared, updating their
    /// existing records.
    ///
    /// `request` must carry the same content as the original submission.
    pub async fn redrive(
        &self,
        descriptor: &RetryDescriptor,
        request: PublishRequest,
    ) -> Result<TaskResult, CrierError> {
        request.validate()?;
        let actual = request.fingerprint();
        if actual != descriptor.fingerprint {
            return Err(ValidationError::FingerprintMismatch {
                expected: descriptor.fingerprint.clone(),
                actual,
            }
            .into());
        }

        info!(task_id = %descriptor.task_id, targets = descriptor.targets.len(), "redriving");
        let jobs = descriptor
            .targets
            .iter()
            .map(|t| (t.platform, Some(t.record_id)))
            .collect();
        let results = self
            .fan_out(
                &descriptor.task_id,
                &descriptor.fingerprint,
                Arc::new(request),
                jobs,
            )
            .await;

        Ok(TaskResult {
            task_id: descriptor.task_id.clone(),
            fingerprint: descriptor.fingerprint.clone(),
            results,
            created_at: self.clock.now(),
            deduplicated: false,
        })
    }

    /// Every platform in the catalogue with a live authentication probe.
    ///
    /// Probe faults, timeouts and missing adapters all read as not
    /// authenticated. Each probe result is cached in the ledger's accounts.
    pub async fn list_targets(&self) -> Vec<TargetInfo> {
        let probes: Vec<_> = Platform::ALL
            .into_iter()
            .map(|platform| {
                let registry = Arc::clone(&self.registry);
                let timeout = self.probe_timeout;
                (
                    platform,
                    tokio::spawn(async move { probe(&registry, platform, timeout).await }),
                )
            })
            .collect();

        let mut targets = Vec::with_capacity(probes.len());
        for (platform, handle) in probes {
            let authenticated = match handle.await {
                Ok(authenticated) => authenticated,
                Err(err) => {
                    warn!(%platform, error = %err, "auth probe aborted");
                    false
                }
            };

            if let Err(err) = self
                .ledger
                .upsert_account(platform, authenticated, None)
                .await
            {
                warn!(%platform, error = %err, "could not record account state");
            }

            targets.push(TargetInfo {
                platform,
                display_name: platform.display_name().to_string(),
                method: platform.method(),
                authenticated,
                content_types: platform.content_types().to_vec(),
            });
        }
        targets
    }

    /// Cached account states from the last `list_targets`.
    pub async fn accounts(&self) -> Result<Vec<Account>, CrierError> {
        Ok(self.ledger.accounts().await?)
    }

    /// One page of publish records, newest first.
    pub async fn history(&self, query: &HistoryQuery) -> Result<HistoryPage, CrierError> {
        query.validate()?;
        let (records, total) = self.ledger.history(query).await?;
        Ok(HistoryPage {
            records,
            total,
            page: query.page,
            size: query.size,
        })
    }

    /// Put re-marked records back to `failed`. Their earlier error is kept.
    async fn unmark(&self, targets: &[RetryTarget]) {
        for target in targets {
            if let Err(err) = self
                .ledger
                .update_publish_record_status(
                    target.record_id,
                    RecordUpdate::status(PublishStatus::Failed),
                )
                .await
            {
                error!(record_id = %target.record_id, error = %err, "could not roll back re-marked record");
            }
        }
    }

    async fn latest_task_for(
        &self,
        fingerprint: &ContentFingerprint,
    ) -> Result<Option<TaskStatus>, CrierError> {
        match self
            .ledger
            .latest_task_id_for_fingerprint(fingerprint)
            .await?
        {
            Some(task_id) => self.status(&task_id).await,
            None => Ok(None),
        }
    }

    /// Run one pipeline per job, at most `MAX_CONCURRENCY` at a time.
    ///
    /// Results come back in job order, one per job, whatever happens inside
    /// the pipelines.
    async fn fan_out(
        &self,
        task_id: &TaskId,
        fingerprint: &ContentFingerprint,
        request: Arc<PublishRequest>,
        jobs: Vec<(Platform, Option<RecordId>)>,
    ) -> Vec<PlatformResult> {
        let limiter = Arc::new(Semaphore::new(MAX_CONCURRENCY));

        let handles: Vec<_> = jobs
            .into_iter()
            .map(|(platform, existing)| {
                let pipeline = Pipeline {
                    registry: Arc::clone(&self.registry),
                    ledger: Arc::clone(&self.ledger),
                    retry_policy: self.retry_policy.clone(),
                    task_id: task_id.clone(),
                    fingerprint: fingerprint.clone(),
                    request: Arc::clone(&request),
                };
                let limiter = Arc::clone(&limiter);
                let handle = tokio::spawn(async move {
                    let Ok(_permit) = limiter.acquire_owned().await else {
                        return PlatformResult::failed(platform, "concurrency limiter closed");
                    };
                    pipeline.run(platform, existing).await
                });
                (platform, existing, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (platform, existing, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(err) => {
                    error!(%task_id, %platform, error = %err, "publish pipeline aborted");
                    let result =
                        PlatformResult::failed(platform, format!("publish pipeline aborted: {err}"));
                    self.record_abort(task_id, fingerprint, platform, existing, &result)
                        .await;
                    result
                }
            };
            info!(%task_id, %platform, status = %result.status, retries = result.retries, "platform finished");
            results.push(result);
        }
        results
    }

    /// Finalize the record of a pipeline that died, or write a failed one if
    /// it never got that far.
    async fn record_abort(
        &self,
        task_id: &TaskId,
        fingerprint: &ContentFingerprint,
        platform: Platform,
        existing: Option<RecordId>,
        result: &PlatformResult,
    ) {
        let record = match existing {
            Some(id) => Some(id),
            None => match self.ledger.records_for_task(task_id).await {
                Ok(records) => records
                    .iter()
                    .find(|r| r.platform == platform)
                    .map(|r| r.id),
                Err(err) => {
                    error!(%task_id, %platform, error = %err, "could not look up aborted record");
                    return;
                }
            },
        };
        write_failure(
            self.ledger.as_ref(),
            task_id,
            fingerprint,
            platform,
            record,
            result,
        )
        .await;
    }
}

/// Store `result` as the failure of `platform`: update `record` when there
/// is one, insert a failed record otherwise. Errors are only logged.
async fn write_failure(
    ledger: &dyn ContentLedger,
    task_id: &TaskId,
    fingerprint: &ContentFingerprint,
    platform: Platform,
    record: Option<RecordId>,
    result: &PlatformResult,
) {
    let write = match record {
        Some(id) => {
            let update = RecordUpdate {
                status: PublishStatus::Failed,
                post_url: None,
                error: result.error.clone(),
                retries: None,
            };
            ledger.update_publish_record_status(id, update).await
        }
        None => {
            let mut new = NewPublishRecord::new(
                task_id.clone(),
                fingerprint.clone(),
                platform,
                PublishStatus::Failed,
            );
            new.error = result.error.clone();
            ledger.save_publish_record(new).await.map(|_| ())
        }
    };
    if let Err(err) = write {
        error!(%task_id, %platform, error = %err, "could not record failure");
    }
}

async fn probe(registry: &AdapterRegistry, platform: Platform, timeout: Duration) -> bool {
    let Some(adapter) = registry.get(platform) else {
        return false;
    };
    match tokio::time::timeout(timeout, adapter.check_auth(platform)).await {
        Ok(Ok(authenticated)) => authenticated,
        Ok(Err(err)) => {
            warn!(%platform, error = %err, "auth probe failed");
            false
        }
        Err(_) => {
            warn!(%platform, ?timeout, "auth probe timed out");
            false
        }
    }
}

/// Everything one platform's publish needs, owned so it can run on its own
/// task.
struct Pipeline {
    registry: Arc<AdapterRegistry>,
    ledger: Arc<dyn ContentLedger>,
    retry_policy: RetryPolicy,
    task_id: TaskId,
    fingerprint: ContentFingerprint,
    request: Arc<PublishRequest>,
}

impl Pipeline {
    /// `existing` is the record to update when redriving; otherwise a fresh
    /// record is written.
    ///
    /// A redriven record must still be `processing`. One that has moved on
    /// (an earlier redrive finished it) is reported as stored and the
    /// adapter is not called.
    async fn run(self, platform: Platform, existing: Option<RecordId>) -> PlatformResult {
        if let Some(id) = existing {
            match self.stored_record(id).await {
                Ok(Some(record)) if record.status == PublishStatus::Processing => {}
                Ok(Some(record)) => {
                    info!(task_id = %self.task_id, %platform, record_id = %id, status = %record.status, "record is not awaiting a redrive, skipping");
                    return PlatformResult::from(&record);
                }
                Ok(None) => {
                    warn!(task_id = %self.task_id, %platform, record_id = %id, "redriven record not found");
                    return PlatformResult::failed(platform, format!("publish record {id} not found"));
                }
                Err(err) => {
                    error!(task_id = %self.task_id, %platform, error = %err, "could not read publish record");
                    return PlatformResult::failed(platform, format!("ledger read failed: {err}"));
                }
            }
        }

        let Some(adapter) = self.registry.get(platform).cloned() else {
            let result = PlatformResult::failed(
                platform,
                format!("no adapter registered for platform {platform}"),
            );
            warn!(task_id = %self.task_id, %platform, "no adapter registered");
            self.record_failure(platform, existing, &result).await;
            return result;
        };

        let record_id = match existing {
            Some(id) => id,
            None => {
                let new = NewPublishRecord::new(
                    self.task_id.clone(),
                    self.fingerprint.clone(),
                    platform,
                    PublishStatus::Processing,
                );
                match self.ledger.save_publish_record(new).await {
                    Ok(id) => id,
                    Err(err) => {
                        error!(task_id = %self.task_id, %platform, error = %err, "could not save publish record");
                        return PlatformResult::failed(
                            platform,
                            format!("ledger write failed: {err}"),
                        );
                    }
                }
            }
        };

        let result =
            publish_with_retry(adapter.as_ref(), &self.request, platform, &self.retry_policy)
                .await;

        let update = RecordUpdate {
            status: result.status,
            post_url: result.post_url.clone(),
            error: result.error.clone(),
            retries: Some(result.retries),
        };
        if let Err(err) = self.ledger.update_publish_record_status(record_id, update).await {
            error!(task_id = %self.task_id, %platform, %record_id, error = %err, "could not update publish record");
            return PlatformResult::failed(platform, format!("ledger write failed: {err}"))
                .with_retries(result.retries);
        }
        result
    }

    async fn stored_record(&self, id: RecordId) -> Result<Option<PublishRecord>, LedgerError> {
        let records = self.ledger.records_for_task(&self.task_id).await?;
        Ok(records.into_iter().find(|r| r.id == id))
    }

    async fn record_failure(
        &self,
        platform: Platform,
        existing: Option<RecordId>,
        result: &PlatformResult,
    ) {
        write_failure(
            self.ledger.as_ref(),
            &self.task_id,
            &self.fingerprint,
            platform,
            existing,
            result,
        )
        .await;
    }
}
