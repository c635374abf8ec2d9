//! `crier.toml` loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crier_core::impls::BridgeConfig;
use crier_core::impls::bridge::{DEFAULT_BRIDGE_URL, DEFAULT_LIST_TIMEOUT, DEFAULT_PUBLISH_TIMEOUT};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "crier.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrierConfig {
    pub ledger: LedgerSection,
    pub bridge: BridgeSection,
    pub probe: ProbeSection,
    pub log: LogSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSection {
    pub path: PathBuf,
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from("crier-ledger.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSection {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            url: DEFAULT_BRIDGE_URL.to_string(),
            timeout_secs: DEFAULT_PUBLISH_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSection {
    pub timeout_secs: u64,
}

impl Default for ProbeSection {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_LIST_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CrierConfig {
    /// Read `path`, or `crier.toml` if present, or fall back to defaults.
    ///
    /// An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if !required && !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Command-line and environment values win over the file.
    pub fn with_overrides(mut self, ledger: Option<PathBuf>, bridge_url: Option<String>) -> Self {
        if let Some(path) = ledger {
            self.ledger.path = path;
        }
        if let Some(url) = bridge_url {
            self.bridge.url = url;
        }
        self
    }

    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            url: self.bridge.url.clone(),
            publish_timeout: Duration::from_secs(self.bridge.timeout_secs),
            list_timeout: self.probe_timeout(),
        }
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe.timeout_secs)
    }
}
