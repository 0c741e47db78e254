//! The `requirements` configuration section for a dungeon kind.
//!
//! Every key is optional. An unset key means the corresponding
//! requirement is absent from the chain entirely -- absence of
//! configuration is never an error.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default minimum storm intensity for spawn eligibility when the key is
/// unset. The proximity *check* defaults to 0 instead; a kind that never
/// set the key still only spawns in reasonably built-up storms.
pub const DEFAULT_SPAWN_MIN_INTENSITY: u32 = 40;

/// Entry requirements for one dungeon kind.
///
/// Mirrors the `dungeons.<kind>.requirements` YAML section. Each set key
/// contributes exactly one requirement to the chain, in the fixed build
/// order: exposure level, essence balance, storm proximity, required
/// completions (sorted by kind), permission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementsConfig {
    /// Minimum storm exposure level.
    #[serde(default)]
    pub min_exposure_level: Option<u32>,

    /// Essence entry cost. Checked read-only during evaluation; actually
    /// deducted by the separate cost-consumption step.
    #[serde(default)]
    pub essence_cost: Option<Decimal>,

    /// Maximum distance from the source storm's epicenter, in blocks.
    #[serde(default)]
    pub max_distance_from_storm: Option<f64>,

    /// Minimum storm intensity. Shared by spawn eligibility (default 40
    /// when unset) and the proximity check (default 0 when unset).
    #[serde(default)]
    pub min_storm_intensity: Option<u32>,

    /// Prior completion counts required per dungeon kind.
    #[serde(default)]
    pub required_completions: BTreeMap<String, u32>,

    /// Required permission flag.
    #[serde(default)]
    pub permission: Option<String>,
}

impl RequirementsConfig {
    /// Minimum intensity used when deciding whether a portal may spawn.
    pub fn spawn_min_intensity(&self) -> u32 {
        self.min_storm_intensity
            .unwrap_or(DEFAULT_SPAWN_MIN_INTENSITY)
    }

    /// Minimum intensity used by the proximity check.
    pub fn proximity_min_intensity(&self) -> u32 {
        self.min_storm_intensity.unwrap_or(0)
    }
}
