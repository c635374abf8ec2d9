//! Domain model: requests, fingerprints, records, statuses, results, errors.

pub mod aggregate;
pub mod errors;
pub mod fingerprint;
pub mod ids;
pub mod outcome;
pub mod platform;
pub mod query;
pub mod record;
pub mod request;
pub mod status;

pub use aggregate::aggregate_status;
pub use errors::{AdapterError, CrierError, LedgerError, ValidationError};
pub use fingerprint::ContentFingerprint;
pub use ids::{ArticleId, RecordId, TaskId};
pub use outcome::{
    HistoryPage, PlatformResult, RetryDescriptor, RetryTarget, TargetInfo, TaskResult, TaskStatus,
};
pub use platform::{ContentType, Platform, PublishMethod};
pub use query::HistoryQuery;
pub use record::{Account, Article, NewArticle, NewPublishRecord, PublishRecord, RecordUpdate};
pub use request::PublishRequest;
pub use status::PublishStatus;
