//! DispatcherBuilder: wiring and startup validation.

use std::sync::Arc;
use std::time::Duration;

use super::dispatcher::{DEFAULT_PROBE_TIMEOUT, Dispatcher};
use super::registry::{AdapterRegistry, RegistryError};
use super::retry::RetryPolicy;
use crate::domain::Platform;
use crate::impls::InMemoryLedger;
use crate::ports::{Clock, ContentLedger, IdGenerator, PlatformAdapter, SystemClock, UlidGenerator};

/// Builds a `Dispatcher`.
///
/// # Example
/// ```ignore
/// let dispatcher = DispatcherBuilder::new()
///     .register(Arc::new(BridgeAdapter::new(config)?))?
///     .ledger(Arc::new(JsonFileLedger::open("crier.json").await?))
///     .expect_platforms(&[Platform::Zhihu, Platform::Csdn])
///     .build()?;
/// ```
///
/// # Fail-fast
/// `build()` checks that every platform passed to `expect_platforms` has an
/// adapter, and reports all the missing ones at once.
pub struct DispatcherBuilder {
    registry: AdapterRegistry,
    ledger: Option<Arc<dyn ContentLedger>>,
    clock: Arc<dyn Clock>,
    ids: Option<Arc<dyn IdGenerator>>,
    retry_policy: RetryPolicy,
    probe_timeout: Duration,
    expected_platforms: Option<Vec<Platform>>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Missing adapters for platforms: {0:?}. These platforms were expected but have no adapter.")]
    MissingPlatforms(Vec<Platform>),
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            registry: AdapterRegistry::new(),
            ledger: None,
            clock: Arc::new(SystemClock),
            ids: None,
            retry_policy: RetryPolicy::default(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            expected_platforms: None,
        }
    }

    pub fn register(mut self, adapter: Arc<dyn PlatformAdapter>) -> Result<Self, RegistryError> {
        self.registry.register(adapter)?;
        Ok(self)
    }

    /// Defaults to a fresh `InMemoryLedger`.
    pub fn ledger(mut self, ledger: Arc<dyn ContentLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Defaults to a `UlidGenerator` on the builder's clock.
    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn expect_platforms(mut self, platforms: &[Platform]) -> Self {
        self.expected_platforms = Some(platforms.to_vec());
        self
    }

    pub fn build(self) -> Result<Dispatcher, BuildError> {
        if let Some(expected) = &self.expected_platforms {
            let missing: Vec<Platform> = expected
                .iter()
                .filter(|p| !self.registry.contains(**p))
                .copied()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingPlatforms(missing));
            }
        }

        let clock = self.clock;
        let ledger = self
            .ledger
            .unwrap_or_else(|| Arc::new(InMemoryLedger::with_clock(Arc::clone(&clock))));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(Arc::clone(&clock))));

        Ok(Dispatcher {
            registry: Arc::new(self.registry),
            ledger,
            ids,
            clock,
            retry_policy: self.retry_policy,
            probe_timeout: self.probe_timeout,
        })
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::ScriptedAdapter;

    #[test]
    fn build_success() {
        let dispatcher = DispatcherBuilder::new()
            .register(Arc::new(ScriptedAdapter::for_platforms([Platform::Zhihu])))
            .unwrap()
            .expect_platforms(&[Platform::Zhihu])
            .build();
        assert!(dispatcher.is_ok());
    }

    #[test]
    fn build_missing_platforms() {
        let dispatcher = DispatcherBuilder::new()
            .register(Arc::new(ScriptedAdapter::for_platforms([Platform::Zhihu])))
            .unwrap()
            .expect_platforms(&[Platform::Zhihu, Platform::Csdn, Platform::Twitter])
            .build();
        assert!(matches!(
            dispatcher,
            Err(BuildError::MissingPlatforms(missing)) if missing == vec![Platform::Csdn, Platform::Twitter]
        ));
    }

    #[test]
    fn build_without_expectations() {
        let dispatcher = DispatcherBuilder::new().build().unwrap();
        assert!(dispatcher.registry().is_empty());
    }

    #[test]
    fn duplicate_registration_fails() {
        let result = DispatcherBuilder::new()
            .register(Arc::new(ScriptedAdapter::for_platforms([Platform::Csdn])))
            .unwrap()
            .register(Arc::new(ScriptedAdapter::for_platforms([Platform::Csdn])));
        assert!(matches!(
            result,
            Err(RegistryError::AlreadyRegistered(Platform::Csdn))
        ));
    }
}
