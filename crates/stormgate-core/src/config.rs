//! Configuration loading and the live config store.
//!
//! The canonical configuration lives in `stormgate-config.yaml` at the
//! project root. This module defines strongly-typed structs mirroring
//! the YAML structure, plus [`ConfigStore`], a shared handle whose
//! contents can be swapped by an admin reload without restarting the
//! scheduler.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use stormgate_gate::RequirementsConfig;
use stormgate_rewards::RewardsConfig;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level Stormgate configuration.
///
/// Mirrors the structure of `stormgate-config.yaml`. All fields have
/// defaults, so an empty file (or no file at all) yields a working
/// configuration with no dungeon kinds.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StormgateConfig {
    /// Portal lifecycle settings shared by all kinds.
    #[serde(default)]
    pub portals: PortalsConfig,

    /// Dungeon kinds, keyed by kind id. Sorted so spawn polling walks
    /// kinds in a deterministic order.
    #[serde(default)]
    pub dungeons: BTreeMap<String, DungeonConfig>,
}

impl StormgateConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yml::from_str(&contents)?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// The kinds currently eligible to spawn portals, in sorted order.
    pub fn spawnable_kinds(&self) -> impl Iterator<Item = (&String, &DungeonConfig)> {
        self.dungeons
            .iter()
            .filter(|(_, cfg)| cfg.enabled && cfg.portal.enabled)
    }
}

/// Portal lifecycle configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PortalsConfig {
    /// Seconds between spawn polls.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,

    /// Seconds between cleanup sweeps.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,

    /// Seconds between ambient effect pulses at live portals.
    #[serde(default = "default_effects_interval_secs")]
    pub effects_interval_secs: u64,

    /// Maximum simultaneous portals across all kinds.
    #[serde(default = "default_max_portals")]
    pub max_portals: usize,

    /// Radius of the portal-opened announcement, in blocks.
    #[serde(default = "default_announce_radius")]
    pub announce_radius: f64,

    /// Minimum portal distance from the storm epicenter, in blocks.
    #[serde(default = "default_spawn_radius_min")]
    pub spawn_radius_min: f64,

    /// Maximum portal distance from the storm epicenter, in blocks.
    #[serde(default = "default_spawn_radius_max")]
    pub spawn_radius_max: f64,
}

impl Default for PortalsConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            effects_interval_secs: default_effects_interval_secs(),
            max_portals: default_max_portals(),
            announce_radius: default_announce_radius(),
            spawn_radius_min: default_spawn_radius_min(),
            spawn_radius_max: default_spawn_radius_max(),
        }
    }
}

/// Configuration for one dungeon kind.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DungeonConfig {
    /// Whether the kind participates at all. Kinds opt in explicitly;
    /// merely listing one does not make it spawnable.
    #[serde(default)]
    pub enabled: bool,

    /// Name shown in announcements and admin output.
    #[serde(default)]
    pub display_name: String,

    /// Portal spawn settings for the kind.
    #[serde(default)]
    pub portal: PortalSpawnConfig,

    /// Entry requirements for the kind.
    #[serde(default)]
    pub requirements: RequirementsConfig,

    /// Completion rewards for the kind.
    #[serde(default)]
    pub rewards: RewardsConfig,
}

impl DungeonConfig {
    /// The display name, falling back to the kind id when unset.
    pub fn display_name_or<'a>(&'a self, kind: &'a str) -> &'a str {
        if self.display_name.is_empty() {
            kind
        } else {
            &self.display_name
        }
    }
}

/// Per-kind portal spawn settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PortalSpawnConfig {
    /// Whether portals of this kind spawn at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Probability of spawning per qualifying storm per poll, in [0, 1].
    #[serde(default = "default_spawn_chance")]
    pub spawn_chance: Decimal,
}

impl Default for PortalSpawnConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            spawn_chance: default_spawn_chance(),
        }
    }
}

// ---------------------------------------------------------------------------
// Live config store
// ---------------------------------------------------------------------------

/// Shared handle to the live configuration.
///
/// Readers take a cheap `Arc` snapshot; a reload swaps the whole
/// configuration atomically, so a poll mid-reload sees either the old or
/// the new config, never a mix.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    inner: Arc<RwLock<Arc<StormgateConfig>>>,
}

impl ConfigStore {
    /// Wrap an initial configuration.
    pub fn new(config: StormgateConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// Snapshot the current configuration.
    pub fn current(&self) -> Arc<StormgateConfig> {
        match self.inner.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replace the live configuration.
    pub fn replace(&self, config: StormgateConfig) {
        let dungeons = config.dungeons.len();
        let next = Arc::new(config);
        match self.inner.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
        info!(dungeons, "configuration replaced");
    }

    /// Reload the configuration from a file and swap it in.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed;
    /// the live configuration is left untouched on error.
    pub fn reload_from(&self, path: &Path) -> Result<(), ConfigError> {
        let config = StormgateConfig::from_file(path)?;
        self.replace(config);
        Ok(())
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(StormgateConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_check_interval_secs() -> u64 {
    5
}

const fn default_cleanup_interval_secs() -> u64 {
    30
}

const fn default_effects_interval_secs() -> u64 {
    1
}

const fn default_max_portals() -> usize {
    5
}

const fn default_announce_radius() -> f64 {
    300.0
}

const fn default_spawn_radius_min() -> f64 {
    50.0
}

const fn default_spawn_radius_max() -> f64 {
    150.0
}

fn default_spawn_chance() -> Decimal {
    Decimal::new(15, 2) // 0.15
}

const fn default_true() -> bool {
    true
}
