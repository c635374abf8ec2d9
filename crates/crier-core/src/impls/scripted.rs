//! Scripted adapter: deterministic outcomes per platform, no network.
//!
//! Backs `crier --dry-run` and the engine's tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{AdapterError, Platform, PlatformResult, PublishRequest};
use crate::ports::PlatformAdapter;

/// How one platform behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Script {
    /// Publish on the first attempt.
    #[default]
    Succeed,
    /// Return a failed result for the first `n` calls, then succeed.
    FailTimes(u32),
    /// Always return a failed result.
    AlwaysFail,
    /// Always raise an adapter fault, for publishes and auth probes alike.
    Fault,
    /// Wait, then succeed. Auth probes wait too.
    Stall(Duration),
}

pub struct ScriptedAdapter {
    targets: Vec<Platform>,
    scripts: HashMap<Platform, Script>,
    logged_out: HashSet<Platform>,
    calls: HashMap<Platform, AtomicUsize>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedAdapter {
    /// Serves every platform in the catalogue; all succeed.
    pub fn new() -> Self {
        Self::for_platforms(Platform::ALL)
    }

    pub fn for_platforms(platforms: impl IntoIterator<Item = Platform>) -> Self {
        let targets: Vec<Platform> = platforms.into_iter().collect();
        let calls = targets.iter().map(|&p| (p, AtomicUsize::new(0))).collect();
        Self {
            targets,
            scripts: HashMap::new(),
            logged_out: HashSet::new(),
            calls,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn script(mut self, platform: Platform, script: Script) -> Self {
        self.scripts.insert(platform, script);
        self
    }

    /// `check_auth` reports `false` for this platform.
    pub fn logged_out(mut self, platform: Platform) -> Self {
        self.logged_out.insert(platform);
        self
    }

    /// Number of `publish` calls made for `platform`.
    pub fn calls(&self, platform: Platform) -> usize {
        self.calls
            .get(&platform)
            .map_or(0, |c| c.load(Ordering::SeqCst))
    }

    /// Highest number of `publish` calls that were running at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn script_for(&self, platform: Platform) -> Script {
        self.scripts.get(&platform).copied().unwrap_or_default()
    }

    fn succeed(&self, request: &PublishRequest, platform: Platform, call: usize) -> PlatformResult {
        if request.draft_only {
            PlatformResult::draft_saved(platform)
        } else {
            PlatformResult::published(platform)
                .with_url(format!("https://{platform}.example.com/p/{call}"))
        }
    }

    async fn run(
        &self,
        request: &PublishRequest,
        platform: Platform,
    ) -> Result<PlatformResult, AdapterError> {
        let call = self
            .calls
            .get(&platform)
            .map_or(0, |c| c.fetch_add(1, Ordering::SeqCst));

        match self.script_for(platform) {
            Script::Succeed => Ok(self.succeed(request, platform, call)),
            Script::FailTimes(n) if call < n as usize => Ok(PlatformResult::failed(
                platform,
                format!("scripted failure {} of {n}", call + 1),
            )),
            Script::FailTimes(_) => Ok(self.succeed(request, platform, call)),
            Script::AlwaysFail => Ok(PlatformResult::failed(platform, "scripted failure")),
            Script::Fault => Err(AdapterError::Other(format!("scripted fault on {platform}"))),
            Script::Stall(delay) => {
                tokio::time::sleep(delay).await;
                Ok(self.succeed(request, platform, call))
            }
        }
    }
}

impl Default for ScriptedAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformAdapter for ScriptedAdapter {
    async fn publish(
        &self,
        request: &PublishRequest,
        platform: Platform,
    ) -> Result<PlatformResult, AdapterError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let result = self.run(request, platform).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn check_auth(&self, platform: Platform) -> Result<bool, AdapterError> {
        match self.script_for(platform) {
            Script::Fault => Err(AdapterError::Other(format!("scripted fault on {platform}"))),
            Script::Stall(delay) => {
                tokio::time::sleep(delay).await;
                Ok(!self.logged_out.contains(&platform))
            }
            _ => Ok(!self.logged_out.contains(&platform)),
        }
    }

    fn supported_targets(&self) -> Vec<Platform> {
        self.targets.clone()
    }
}
