//! The requirement variants.
//!
//! Five checks, each independent and pure with respect to system state.
//! The exposure and balance checks read external sources and pass
//! vacuously when the source is absent or cannot answer -- a deliberate
//! availability tradeoff: a half-installed server should not lock every
//! portal. Write-side operations never fail open (see the chain's cost
//! consumption).

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use stormgate_types::{CompletionLookup, EssenceProvider, PermissionSource, StormId, StormSource};
use stormgate_world::storm_intensity;

use crate::requirement::{Entrant, Requirement};

// ---------------------------------------------------------------------------
// Exposure level
// ---------------------------------------------------------------------------

/// Minimum storm exposure level, read from the essence provider.
pub struct ExposureRequirement {
    essence: Option<Arc<dyn EssenceProvider>>,
    min_level: u32,
}

impl ExposureRequirement {
    /// Create the check. `essence = None` makes it pass vacuously.
    pub const fn new(essence: Option<Arc<dyn EssenceProvider>>, min_level: u32) -> Self {
        Self { essence, min_level }
    }

    fn current_level(&self, entrant: &Entrant) -> Option<u32> {
        self.essence
            .as_ref()
            .and_then(|p| p.exposure_level(entrant.player))
    }
}

impl Requirement for ExposureRequirement {
    fn check(&self, entrant: &Entrant) -> bool {
        match self.current_level(entrant) {
            Some(level) => level >= self.min_level,
            None => {
                debug!(player = %entrant.player, "exposure source unavailable, check passes vacuously");
                true
            }
        }
    }

    fn failure_message(&self, entrant: &Entrant) -> String {
        let current = self.current_level(entrant).unwrap_or(0);
        format!(
            "Requires exposure level {} (you have: {current})",
            self.min_level
        )
    }

    fn name(&self) -> &'static str {
        "exposure"
    }
}

// ---------------------------------------------------------------------------
// Essence balance
// ---------------------------------------------------------------------------

/// Minimum essence balance. Read-only at check time; the deduction itself
/// belongs to the cost-consumption step.
pub struct BalanceRequirement {
    essence: Option<Arc<dyn EssenceProvider>>,
    required: Decimal,
}

impl BalanceRequirement {
    /// Create the check. `essence = None` makes it pass vacuously.
    pub const fn new(essence: Option<Arc<dyn EssenceProvider>>, required: Decimal) -> Self {
        Self { essence, required }
    }

    fn current_balance(&self, entrant: &Entrant) -> Option<Decimal> {
        self.essence.as_ref().and_then(|p| p.balance(entrant.player))
    }
}

impl Requirement for BalanceRequirement {
    fn check(&self, entrant: &Entrant) -> bool {
        match self.current_balance(entrant) {
            Some(balance) => balance >= self.required,
            None => {
                debug!(player = %entrant.player, "balance source unavailable, check passes vacuously");
                true
            }
        }
    }

    fn failure_message(&self, entrant: &Entrant) -> String {
        let current = self.current_balance(entrant).unwrap_or(Decimal::ZERO);
        format!("Requires {} essence (you have: {current})", self.required)
    }

    fn name(&self) -> &'static str {
        "essence"
    }
}

// ---------------------------------------------------------------------------
// Storm proximity + intensity
// ---------------------------------------------------------------------------

/// The entrant must stand near the portal's source storm while it is
/// sufficiently intense. Distance and intensity are both required; either
/// failing fails the whole check with one combined message.
pub struct ProximityRequirement {
    storms: Arc<dyn StormSource>,
    storm_id: StormId,
    max_distance: f64,
    min_intensity: u32,
}

impl ProximityRequirement {
    /// Create the check against a specific source storm.
    pub const fn new(
        storms: Arc<dyn StormSource>,
        storm_id: StormId,
        max_distance: f64,
        min_intensity: u32,
    ) -> Self {
        Self {
            storms,
            storm_id,
            max_distance,
            min_intensity,
        }
    }
}

impl Requirement for ProximityRequirement {
    fn check(&self, entrant: &Entrant) -> bool {
        // A storm that has ended or moved out of knowledge fails the
        // check: the entrant cannot be near it.
        let Some(storm) = self.storms.find(self.storm_id) else {
            return false;
        };
        let near = entrant
            .position
            .distance_to(&storm.epicenter)
            .is_some_and(|d| d <= self.max_distance);
        near && storm_intensity(&storm) >= self.min_intensity
    }

    fn failure_message(&self, _entrant: &Entrant) -> String {
        format!("Must be near a storm (intensity {}+)", self.min_intensity)
    }

    fn name(&self) -> &'static str {
        "storm proximity"
    }
}

// ---------------------------------------------------------------------------
// Historical completions
// ---------------------------------------------------------------------------

/// The entrant must have completed a named (possibly different) dungeon
/// kind a minimum number of times.
pub struct CompletionRequirement {
    completions: Arc<dyn CompletionLookup>,
    required_kind: String,
    required_count: u32,
}

impl CompletionRequirement {
    /// Create the check against the completion ledger.
    pub const fn new(
        completions: Arc<dyn CompletionLookup>,
        required_kind: String,
        required_count: u32,
    ) -> Self {
        Self {
            completions,
            required_kind,
            required_count,
        }
    }
}

impl Requirement for CompletionRequirement {
    fn check(&self, entrant: &Entrant) -> bool {
        self.completions
            .completion_count(entrant.player, &self.required_kind)
            >= self.required_count
    }

    fn failure_message(&self, entrant: &Entrant) -> String {
        let current = self
            .completions
            .completion_count(entrant.player, &self.required_kind);
        format!(
            "Must complete {} {} times (you have: {current})",
            self.required_kind, self.required_count
        )
    }

    fn name(&self) -> &'static str {
        "completion"
    }
}

// ---------------------------------------------------------------------------
// Permission flag
// ---------------------------------------------------------------------------

/// The entrant must carry a named capability flag.
pub struct PermissionRequirement {
    permissions: Arc<dyn PermissionSource>,
    flag: String,
}

impl PermissionRequirement {
    /// Create the check for the given flag.
    pub const fn new(permissions: Arc<dyn PermissionSource>, flag: String) -> Self {
        Self { permissions, flag }
    }
}

impl Requirement for PermissionRequirement {
    fn check(&self, entrant: &Entrant) -> bool {
        self.permissions.has_flag(entrant.player, &self.flag)
    }

    fn failure_message(&self, _entrant: &Entrant) -> String {
        String::from("You don't have permission to access this dungeon")
    }

    fn name(&self) -> &'static str {
        "permission"
    }
}
