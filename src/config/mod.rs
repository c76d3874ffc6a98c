//! Configuration management
//!
//! Handles loading and validation of the TOML configuration and its
//! conversion into collector settings, enrichment flags and the static
//! permission gate used on hosts without a permission system. Every section
//! is optional; missing sections take their defaults.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    assembler::{CollectorSettings, DEFAULT_CLONE_MANAGERS},
    orchestrator::EnrichmentFlags,
    permissions::{Capability, CapabilitySet, StaticPermissionGate},
};

/// Upper bound for `geocode_timeout_ms`
pub const MAX_GEOCODE_TIMEOUT_MS: u64 = 30_000;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["pretty", "compact", "json"];

/// Default configuration file location
pub fn default_config_path() -> PathBuf {
    dirs::config_dir().map_or_else(
        || PathBuf::from("/etc/device-snapshot/config.toml"),
        |d| d.join("device-snapshot/config.toml"),
    )
}

/// Resolve the log directory, falling back to XDG_DATA_HOME/device-snapshot/logs
pub fn resolve_log_dir(configured: &Option<PathBuf>) -> PathBuf {
    configured.clone().unwrap_or_else(|| {
        dirs::data_dir().map_or_else(
            || PathBuf::from("/tmp/device-snapshot"),
            |d| d.join("device-snapshot/logs"),
        )
    })
}

/// `[collector]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub location_enrichment: bool,
    pub telephony_enrichment: bool,
    pub guided_remediation: bool,
    /// Bound for reverse geocoding, in milliseconds
    pub geocode_timeout_ms: u64,
    pub interfering_packages: Vec<String>,
    pub click_automator_packages: Vec<String>,
    pub clone_manager_packages: Vec<String>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            location_enrichment: false,
            telephony_enrichment: false,
            guided_remediation: false,
            geocode_timeout_ms: 2000,
            interfering_packages: Vec::new(),
            click_automator_packages: Vec::new(),
            clone_manager_packages: DEFAULT_CLONE_MANAGERS
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
        }
    }
}

/// `[permissions]`, by capability key (`fine-location`, `phone-state`, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionsConfig {
    pub granted: Vec<String>,
    pub denied: Vec<String>,
    pub permanently_denied: Vec<String>,
    /// Denied capabilities the simulated request UI grants
    pub grant_on_request: Vec<String>,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty`, `compact` or `json`
    pub format: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            log_dir: None,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub collector: CollectorConfig,
    pub permissions: PermissionsConfig,
    pub logging: LoggingConfig,
}

fn parse_capabilities(section: &str, names: &[String]) -> Result<CapabilitySet> {
    names
        .iter()
        .map(|name| {
            name.parse::<Capability>()
                .with_context(|| format!("Invalid capability in [permissions].{section}"))
        })
        .collect()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let timeout = self.collector.geocode_timeout_ms;
        if timeout == 0 || timeout > MAX_GEOCODE_TIMEOUT_MS {
            anyhow::bail!(
                "geocode_timeout_ms ({timeout}) must be between 1 and {MAX_GEOCODE_TIMEOUT_MS}"
            );
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("Invalid log level: {}", self.logging.level);
        }

        if !LOG_FORMATS.contains(&self.logging.format.as_str()) {
            anyhow::bail!("Invalid log format: {}", self.logging.format);
        }

        let sections = [
            ("granted", &self.permissions.granted),
            ("denied", &self.permissions.denied),
            ("permanently_denied", &self.permissions.permanently_denied),
        ];
        let mut seen = BTreeSet::new();
        for (section, names) in sections {
            for capability in parse_capabilities(section, names)? {
                if !seen.insert(capability) {
                    anyhow::bail!("Capability {capability} is listed in more than one grant section");
                }
            }
        }
        parse_capabilities("grant_on_request", &self.permissions.grant_on_request)?;

        Ok(())
    }

    /// Override enrichment flags from the command line
    pub fn with_overrides(mut self, location: bool, telephony: bool, guided: bool) -> Self {
        self.collector.location_enrichment |= location;
        self.collector.telephony_enrichment |= telephony;
        self.collector.guided_remediation |= guided;
        self
    }

    pub fn enrichment_flags(&self) -> EnrichmentFlags {
        EnrichmentFlags::new()
            .with_location(self.collector.location_enrichment)
            .with_telephony(self.collector.telephony_enrichment)
            .with_guided_remediation(self.collector.guided_remediation)
    }

    pub fn collector_settings(&self) -> CollectorSettings {
        CollectorSettings {
            geocode_timeout: Duration::from_millis(self.collector.geocode_timeout_ms),
            interfering_packages: self.collector.interfering_packages.clone(),
            click_automator_packages: self.collector.click_automator_packages.clone(),
            clone_manager_packages: self.collector.clone_manager_packages.clone(),
        }
    }

    /// Gate answering from `[permissions]`
    ///
    /// Capabilities not listed anywhere are denied.
    pub fn permission_gate(&self) -> Result<StaticPermissionGate> {
        let p = &self.permissions;
        let granted = parse_capabilities("granted", &p.granted)?;
        let permanently_denied = parse_capabilities("permanently_denied", &p.permanently_denied)?;
        let grant_on_request = parse_capabilities("grant_on_request", &p.grant_on_request)?;
        Ok(StaticPermissionGate::new(
            &granted,
            &permanently_denied,
            grant_on_request,
        ))
    }
}
