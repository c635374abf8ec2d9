//! History query: offset pagination with optional filters.

use serde::{Deserialize, Serialize};

use super::errors::ValidationError;
use super::platform::Platform;
use super::status::PublishStatus;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    /// 1-based page number.
    pub page: usize,
    pub size: usize,
    pub platform: Option<Platform>,
    pub status: Option<PublishStatus>,
}

impl HistoryQuery {
    pub fn new(page: usize, size: usize) -> Self {
        Self {
            page,
            size,
            platform: None,
            status: None,
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_status(mut self, status: PublishStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.page == 0 {
            return Err(ValidationError::InvalidPage);
        }
        if self.size == 0 || self.size > MAX_PAGE_SIZE {
            return Err(ValidationError::InvalidPageSize(self.size));
        }
        Ok(())
    }

    /// Number of matching rows to skip.
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.size)
    }
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}
