//! Adapter registry: platform -> adapter.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::Platform;
use crate::ports::PlatformAdapter;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("an adapter is already registered for platform '{0}'")]
    AlreadyRegistered(Platform),
}

/// Built during initialization, read-only afterwards.
#[derive(Default, Clone)]
pub struct AdapterRegistry {
    adapters: HashMap<Platform, Arc<dyn PlatformAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Register `adapter` for every platform it reports as supported.
    ///
    /// Fails without registering anything if one of those platforms is
    /// already taken.
    pub fn register(&mut self, adapter: Arc<dyn PlatformAdapter>) -> Result<(), RegistryError> {
        let targets = adapter.supported_targets();
        if let Some(taken) = targets.iter().find(|p| self.adapters.contains_key(*p)) {
            return Err(RegistryError::AlreadyRegistered(*taken));
        }
        for platform in targets {
            self.adapters.insert(platform, Arc::clone(&adapter));
        }
        Ok(())
    }

    pub fn get(&self, platform: Platform) -> Option<&Arc<dyn PlatformAdapter>> {
        self.adapters.get(&platform)
    }

    pub fn contains(&self, platform: Platform) -> bool {
        self.adapters.contains_key(&platform)
    }

    /// Registered platforms in catalogue order.
    pub fn platforms(&self) -> Vec<Platform> {
        Platform::ALL
            .into_iter()
            .filter(|p| self.adapters.contains_key(p))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::ScriptedAdapter;

    #[test]
    fn adapter_is_registered_for_each_target() {
        let mut reg = AdapterRegistry::new();
        reg.register(Arc::new(ScriptedAdapter::for_platforms([
            Platform::Zhihu,
            Platform::Csdn,
        ])))
        .unwrap();

        assert_eq!(reg.len(), 2);
        assert!(reg.contains(Platform::Zhihu));
        assert!(reg.get(Platform::Csdn).is_some());
        assert!(reg.get(Platform::Juejin).is_none());
        assert_eq!(reg.platforms(), vec![Platform::Zhihu, Platform::Csdn]);
    }

    #[test]
    fn overlapping_adapter_is_rejected_whole() {
        let mut reg = AdapterRegistry::new();
        reg.register(Arc::new(ScriptedAdapter::for_platforms([Platform::Csdn])))
            .unwrap();

        let err = reg
            .register(Arc::new(ScriptedAdapter::for_platforms([
                Platform::Juejin,
                Platform::Csdn,
            ])))
            .unwrap_err();

        assert_eq!(err, RegistryError::AlreadyRegistered(Platform::Csdn));
        assert!(!reg.contains(Platform::Juejin));
    }
}
