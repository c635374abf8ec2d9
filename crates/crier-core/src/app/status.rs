//! Task status view assembled from ledger records.

use crate::domain::{PlatformResult, PublishRecord, TaskId, TaskStatus, aggregate_status};

/// Build the aggregated view of a task. `None` when there are no records.
pub fn task_status(task_id: &TaskId, records: &[PublishRecord]) -> Option<TaskStatus> {
    let created_at = records.iter().map(|r| r.created_at).min()?;
    let updated_at = records.iter().map(|r| r.updated_at).max()?;

    Some(TaskStatus {
        task_id: task_id.clone(),
        status: aggregate_status(records.iter().map(|r| r.status)),
        results: records.iter().map(PlatformResult::from).collect(),
        created_at,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ContentFingerprint, NewPublishRecord, Platform, PublishStatus, RecordId,
    };
    use chrono::{Duration, TimeZone, Utc};

    fn record(id: u64, platform: Platform, status: PublishStatus, offset_secs: i64) -> PublishRecord {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap() + Duration::seconds(offset_secs);
        let new = NewPublishRecord::new(
            TaskId::new("abcdefghjkmn"),
            ContentFingerprint::from_hex("0".repeat(32)),
            platform,
            status,
        );
        PublishRecord::new(RecordId::new(id), new, at)
    }

    #[test]
    fn no_records_means_no_status() {
        assert!(task_status(&TaskId::new("unknown"), &[]).is_none());
    }

    #[test]
    fn view_spans_all_records() {
        let records = vec![
            record(1, Platform::Zhihu, PublishStatus::Published, 0),
            record(2, Platform::Csdn, PublishStatus::Failed, 3),
        ];

        let status = task_status(&TaskId::new("abcdefghjkmn"), &records).unwrap();

        assert_eq!(status.status, PublishStatus::Processing);
        assert_eq!(status.results.len(), 2);
        assert_eq!(status.results[0].platform, Platform::Zhihu);
        assert_eq!(status.results[1].platform, Platform::Csdn);
        assert_eq!(status.created_at, records[0].created_at);
        assert_eq!(status.updated_at, records[1].updated_at);
    }
}
