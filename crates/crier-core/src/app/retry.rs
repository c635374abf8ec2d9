//! Retry wrapper: publish to one platform with exponential backoff.

use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::{Platform, PlatformResult, PublishRequest};
use crate::ports::PlatformAdapter;

pub const MAX_RETRIES: u32 = 3;
pub const BASE_DELAY: Duration = Duration::from_secs(1);
pub const MAX_DELAY: Duration = Duration::from_secs(32);

/// Backoff schedule for one platform publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// No sleeping between attempts.
    pub fn immediate() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay after the failed attempt `attempt` (0-indexed):
    /// `min(base_delay * 2^attempt, max_delay)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |d| d.min(self.max_delay))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: BASE_DELAY,
            max_delay: MAX_DELAY,
        }
    }
}

/// Publish `request` to `platform`, retrying failed results and faults.
///
/// Never fails: exhaustion yields a `failed` result whose error names the
/// ceiling and the last error seen.
pub async fn publish_with_retry(
    adapter: &dyn PlatformAdapter,
    request: &PublishRequest,
    platform: Platform,
    policy: &RetryPolicy,
) -> PlatformResult {
    let mut last_error = String::from("no attempt made");

    for attempt in 0..=policy.max_retries {
        match adapter.publish(request, platform).await {
            Ok(result) if result.is_success() => {
                return PlatformResult {
                    platform,
                    ..result
                }
                .with_retries(attempt);
            }
            Ok(result) => {
                last_error = result
                    .error
                    .unwrap_or_else(|| format!("publish ended as {}", result.status));
                warn!(%platform, attempt, error = %last_error, "publish attempt failed");
            }
            Err(err) => {
                last_error = err.to_string();
                warn!(%platform, attempt, error = %last_error, "publish attempt raised a fault");
            }
        }

        if attempt < policy.max_retries {
            let delay = policy.delay_for(attempt);
            debug!(%platform, attempt, ?delay, "backing off before next attempt");
            tokio::time::sleep(delay).await;
        }
    }

    PlatformResult::failed(
        platform,
        format!("max retries ({}) reached: {last_error}", policy.max_retries),
    )
    .with_retries(policy.max_retries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PublishStatus;
    use crate::impls::{Script, ScriptedAdapter};
    use rstest::rstest;

    fn request() -> PublishRequest {
        PublishRequest::new("Title", "Body", [Platform::Csdn])
    }

    #[rstest]
    #[case(0, Duration::from_secs(1))]
    #[case(1, Duration::from_secs(2))]
    #[case(2, Duration::from_secs(4))]
    #[case(5, Duration::from_secs(32))]
    #[case(6, Duration::from_secs(32))]
    #[case(40, Duration::from_secs(32))]
    fn backoff_is_capped(#[case] attempt: u32, #[case] expected: Duration) {
        assert_eq!(RetryPolicy::default().delay_for(attempt), expected);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    #[tokio::test]
    async fn retries_count_failures_before_success(#[case] failures: u32) {
        let adapter = ScriptedAdapter::new()
            .script(Platform::Csdn, Script::FailTimes(failures));

        let result =
            publish_with_retry(&adapter, &request(), Platform::Csdn, &RetryPolicy::immediate())
                .await;

        assert_eq!(result.status, PublishStatus::Published);
        assert_eq!(result.retries, failures);
        assert_eq!(adapter.calls(Platform::Csdn), failures as usize + 1);
    }

    #[tokio::test]
    async fn exhaustion_reports_ceiling_and_last_error() {
        let adapter = ScriptedAdapter::new().script(Platform::Csdn, Script::AlwaysFail);

        let result =
            publish_with_retry(&adapter, &request(), Platform::Csdn, &RetryPolicy::immediate())
                .await;

        assert_eq!(result.status, PublishStatus::Failed);
        assert_eq!(result.retries, MAX_RETRIES);
        let error = result.error.unwrap();
        assert!(error.contains("max retries (3)"), "{error}");
        assert!(error.contains("scripted failure"), "{error}");
        assert_eq!(adapter.calls(Platform::Csdn), MAX_RETRIES as usize + 1);
    }

    #[tokio::test]
    async fn faults_are_retried_like_failures() {
        let adapter = ScriptedAdapter::new().script(Platform::Zhihu, Script::Fault);

        let result =
            publish_with_retry(&adapter, &request(), Platform::Zhihu, &RetryPolicy::immediate())
                .await;

        assert_eq!(result.status, PublishStatus::Failed);
        assert_eq!(result.retries, MAX_RETRIES);
        assert!(result.error.unwrap().contains("scripted fault"));
    }

    #[tokio::test]
    async fn success_is_not_retried() {
        let adapter = ScriptedAdapter::new();

        let result =
            publish_with_retry(&adapter, &request(), Platform::Juejin, &RetryPolicy::default())
                .await;

        assert_eq!(result.status, PublishStatus::Published);
        assert_eq!(result.retries, 0);
        assert_eq!(adapter.calls(Platform::Juejin), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_sleeps_between_attempts_only() {
        let adapter = ScriptedAdapter::new().script(Platform::Csdn, Script::AlwaysFail);
        let start = tokio::time::Instant::now();

        publish_with_retry(&adapter, &request(), Platform::Csdn, &RetryPolicy::default()).await;

        // 1s + 2s + 4s, no sleep after the final attempt
        assert_eq!(start.elapsed(), Duration::from_secs(7));
    }
}
