//! Domain identifiers (strongly-typed IDs).
//!
//! Two families of ids live here:
//! - `TaskId`: a short random token minted once per submission. It is what
//!   callers see and pass back to `status` / `retry`.
//! - `Id<T>`: ledger-assigned sequence numbers for stored rows (articles and
//!   publish records). The phantom marker keeps `RecordId` and `ArticleId`
//!   from being mixed up while sharing one implementation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Length of a minted task id.
pub const TASK_ID_LEN: usize = 12;

/// Identifier of a Task (the set of publish records from one submission).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Marker trait for ledger row ids.
///
/// Provides the prefix used by `Display` ("rec-", "article-").
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// Generic ledger row id.
///
/// Values are allocated by the ledger in insertion order, so comparing two
/// ids of the same kind tells which row was written first.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    value: u64,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn new(value: u64) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.value)
    }
}

/// Marker for publish record ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Record {}

impl IdMarker for Record {
    fn prefix() -> &'static str {
        "rec-"
    }
}

/// Marker for article ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArticleRow {}

impl IdMarker for ArticleRow {
    fn prefix() -> &'static str {
        "article-"
    }
}

/// Identifier of a stored PublishRecord.
pub type RecordId = Id<Record>;

/// Identifier of a stored Article.
pub type ArticleId = Id<ArticleRow>;
