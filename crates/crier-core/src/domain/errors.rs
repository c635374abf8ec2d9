//! Error types, one enum per concern.
//!
//! - `ValidationError`: malformed input, rejected before any task exists.
//! - `LedgerError`: persistence faults, scoped to the write that failed.
//! - `AdapterError`: unexpected adapter faults. Ordinary publish failures are
//!   not errors; they come back as `failed` results.
//! - `CrierError`: what engine operations return.

use std::time::Duration;

use thiserror::Error;

use super::fingerprint::ContentFingerprint;
use super::ids::RecordId;
use super::status::PublishStatus;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,

    #[error("title is {0} characters, at most {max} allowed", max = super::request::MAX_TITLE_CHARS)]
    TitleTooLong(usize),

    #[error("body must not be empty")]
    EmptyBody,

    #[error("at least one target platform is required")]
    NoPlatforms,

    #[error("platform '{0}' is listed more than once")]
    DuplicatePlatform(String),

    #[error("video content requires a video reference")]
    MissingVideo,

    #[error("unknown platform '{0}'")]
    UnknownPlatform(String),

    #[error("unknown content type '{0}'")]
    UnknownContentType(String),

    #[error("unknown publish status '{0}'")]
    UnknownStatus(String),

    #[error("page must be at least 1")]
    InvalidPage,

    #[error("page size must be between 1 and {max}, got {0}", max = super::query::MAX_PAGE_SIZE)]
    InvalidPageSize(usize),

    #[error("request fingerprint {actual} does not match task fingerprint {expected}")]
    FingerprintMismatch {
        expected: ContentFingerprint,
        actual: ContentFingerprint,
    },
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("publish record {0} not found")]
    RecordNotFound(RecordId),

    #[error("publish record {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: RecordId,
        from: PublishStatus,
        to: PublishStatus,
    },

    #[error("ledger io: {0}")]
    Io(#[from] std::io::Error),

    #[error("ledger serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("ledger internal error: {0}")]
    Internal(String),
}

/// An adapter fault: something other than an ordinary failed publish.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum CrierError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
