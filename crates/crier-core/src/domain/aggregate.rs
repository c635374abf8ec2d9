//! Task status aggregation.

use super::status::PublishStatus;

/// Derive one overall status from a task's per-platform statuses.
///
/// - all published -> published
/// - any processing -> processing
/// - all failed -> failed
/// - anything else (including an empty set) -> processing
pub fn aggregate_status<I>(statuses: I) -> PublishStatus
where
    I: IntoIterator<Item = PublishStatus>,
{
    let statuses: Vec<PublishStatus> = statuses.into_iter().collect();
    if statuses.is_empty() {
        PublishStatus::Processing
    } else if statuses.iter().all(|&s| s == PublishStatus::Published) {
        PublishStatus::Published
    } else if statuses.iter().any(|&s| s == PublishStatus::Processing) {
        PublishStatus::Processing
    } else if statuses.iter().all(|&s| s == PublishStatus::Failed) {
        PublishStatus::Failed
    } else {
        PublishStatus::Processing
    }
}
