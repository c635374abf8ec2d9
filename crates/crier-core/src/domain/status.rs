//! Publish status state machine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::ValidationError;

/// Status of one (task, platform) publish record.
///
/// State transitions:
/// - Pending -> Processing -> Published | DraftSaved | Failed
/// - Failed -> Processing (manual retry)
///
/// Published and DraftSaved never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    #[default]
    Pending,
    Processing,
    DraftSaved,
    Published,
    Failed,
}

impl PublishStatus {
    /// Published or draft saved: the platform accepted the content.
    pub fn is_success(self) -> bool {
        matches!(self, PublishStatus::Published | PublishStatus::DraftSaved)
    }

    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        self.is_success()
    }

    /// Whether a record in `self` may move to `next`.
    pub fn can_transition_to(self, next: PublishStatus) -> bool {
        use PublishStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Processing, DraftSaved)
                | (Processing, Published)
                | (Processing, Failed)
                | (Failed, Processing)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PublishStatus::Pending => "pending",
            PublishStatus::Processing => "processing",
            PublishStatus::DraftSaved => "draft_saved",
            PublishStatus::Published => "published",
            PublishStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublishStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PublishStatus::Pending),
            "processing" => Ok(PublishStatus::Processing),
            "draft_saved" => Ok(PublishStatus::DraftSaved),
            "published" => Ok(PublishStatus::Published),
            "failed" => Ok(PublishStatus::Failed),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use PublishStatus::*;

    #[rstest]
    #[case::start(Pending, Processing)]
    #[case::publish(Processing, Published)]
    #[case::draft(Processing, DraftSaved)]
    #[case::fail(Processing, Failed)]
    #[case::manual_retry(Failed, Processing)]
    fn allowed_transitions(#[case] from: PublishStatus, #[case] to: PublishStatus) {
        assert!(from.can_transition_to(to));
    }

    #[rstest]
    #[case::published_is_final(Published, Processing)]
    #[case::draft_is_final(DraftSaved, Processing)]
    #[case::published_cannot_fail(Published, Failed)]
    #[case::no_skipping_processing(Pending, Published)]
    #[case::failed_cannot_jump(Failed, Published)]
    fn rejected_transitions(#[case] from: PublishStatus, #[case] to: PublishStatus) {
        assert!(!from.can_transition_to(to));
    }

    #[test]
    fn status_serializes_as_snake_case() {
        let s = serde_json::to_string(&DraftSaved).unwrap();
        assert_eq!(s, "\"draft_saved\"");
        assert_eq!("draft_saved".parse::<PublishStatus>().unwrap(), DraftSaved);
    }
}
