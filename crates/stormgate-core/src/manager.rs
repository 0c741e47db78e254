//! The portal manager: spawning, sweeping, and spatial queries.
//!
//! One manager owns every live portal. Spawning is driven by the
//! scheduler's periodic poll over active storms; sweeping tears down
//! portals whose storm has ended or whose frame has been broken past
//! the half-intact threshold.
//!
//! Each storm spawns at most one portal in its lifetime. The claim is
//! recorded when the portal spawns and released when the portal is
//! removed, so a long-lived storm cannot repopulate the world on every
//! poll.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tokio::sync::RwLock;
use tracing::{debug, info};

use stormgate_types::{
    Anchor, AnnouncementSink, FrameMaterializer, PortalId, Storm, StormId, StormSource, Terrain,
};
use stormgate_world::{RadiusBand, find_portal_site, handle_is_intact, storm_intensity};

use crate::config::{ConfigStore, DungeonConfig, PortalsConfig};
use crate::error::PortalError;
use crate::portal::{Portal, PortalSnapshot};

/// Spawn rolls are taken per ten-thousand for exact decimal thresholds.
const PROBABILITY_SCALE: i64 = 10_000;

/// Why a portal is being torn down, for the log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemovalReason {
    StormEnded,
    FrameBroken,
    Explicit,
    Shutdown,
}

impl RemovalReason {
    const fn as_str(self) -> &'static str {
        match self {
            Self::StormEnded => "storm ended",
            Self::FrameBroken => "frame broken",
            Self::Explicit => "removed explicitly",
            Self::Shutdown => "shutdown",
        }
    }
}

#[derive(Default)]
struct ManagerState {
    portals: BTreeMap<PortalId, Portal>,
    claimed_storms: BTreeSet<StormId>,
}

/// Owns all live portals and their lifecycle.
pub struct PortalManager {
    storms: Arc<dyn StormSource>,
    terrain: Arc<dyn Terrain>,
    frames: Arc<dyn FrameMaterializer>,
    announcements: Arc<dyn AnnouncementSink>,
    config: ConfigStore,
    state: RwLock<ManagerState>,
    shutting_down: AtomicBool,
}

impl PortalManager {
    /// Create the manager over its collaborators and the live config.
    pub fn new(
        storms: Arc<dyn StormSource>,
        terrain: Arc<dyn Terrain>,
        frames: Arc<dyn FrameMaterializer>,
        announcements: Arc<dyn AnnouncementSink>,
        config: ConfigStore,
    ) -> Self {
        Self {
            storms,
            terrain,
            frames,
            announcements,
            config,
            state: RwLock::new(ManagerState::default()),
            shutting_down: AtomicBool::new(false),
        }
    }

    /// The live config store this manager reads from.
    pub const fn config(&self) -> &ConfigStore {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Spawning
    // -----------------------------------------------------------------------

    /// One spawn poll over all active storms.
    ///
    /// For each unclaimed, still-running storm, each spawnable kind whose
    /// minimum intensity the storm meets gets one spawn-chance roll, in
    /// sorted kind order; the first winning kind takes the storm. The
    /// poll stops as soon as the global portal cap is reached.
    pub async fn poll_and_spawn(&self, rng: &mut impl Rng) -> Vec<PortalSnapshot> {
        if self.shutting_down.load(Ordering::Acquire) {
            return Vec::new();
        }

        let config = self.config.current();
        let storms = self.storms.active_storms();
        let mut spawned = Vec::new();

        let mut state = self.state.write().await;
        for storm in storms {
            if state.portals.len() >= config.portals.max_portals {
                debug!(
                    max = config.portals.max_portals,
                    "portal cap reached, ending spawn poll"
                );
                break;
            }
            if storm.has_ended() || state.claimed_storms.contains(&storm.id) {
                continue;
            }

            let intensity = storm_intensity(&storm);
            for (kind, dungeon) in config.spawnable_kinds() {
                if intensity < dungeon.requirements.spawn_min_intensity() {
                    continue;
                }
                if !roll_passes(dungeon.portal.spawn_chance, rng) {
                    continue;
                }
                let snapshot =
                    self.spawn_locked(&mut state, kind, dungeon, &storm, &config.portals, rng);
                spawned.push(snapshot);
                // One portal per storm.
                break;
            }
        }

        spawned
    }

    /// Spawn a portal of a specific kind at a specific storm, bypassing
    /// the spawn-chance roll. Admin surface only.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] when the manager is shutting down, the
    /// kind is unknown or disabled, the cap is reached, or the storm has
    /// already spawned a portal.
    pub async fn force_spawn(
        &self,
        kind: &str,
        storm: &Storm,
        rng: &mut impl Rng,
    ) -> Result<PortalSnapshot, PortalError> {
        if self.shutting_down.load(Ordering::Acquire) {
            return Err(PortalError::ShuttingDown);
        }

        let config = self.config.current();
        let dungeon = config
            .dungeons
            .get(kind)
            .filter(|d| d.enabled && d.portal.enabled)
            .ok_or_else(|| PortalError::UnknownKind {
                kind: kind.to_owned(),
            })?;

        let mut state = self.state.write().await;
        if state.portals.len() >= config.portals.max_portals {
            return Err(PortalError::CapacityReached {
                max: config.portals.max_portals,
            });
        }
        if state.claimed_storms.contains(&storm.id) {
            return Err(PortalError::StormClaimed { storm: storm.id });
        }

        Ok(self.spawn_locked(&mut state, kind, dungeon, storm, &config.portals, rng))
    }

    fn spawn_locked(
        &self,
        state: &mut ManagerState,
        kind: &str,
        dungeon: &DungeonConfig,
        storm: &Storm,
        portals: &PortalsConfig,
        rng: &mut impl Rng,
    ) -> PortalSnapshot {
        let band = RadiusBand::new(portals.spawn_radius_min, portals.spawn_radius_max);
        let site = find_portal_site(self.terrain.as_ref(), storm, band, rng);
        let frame = self.frames.place_frame(&site);
        let portal = Portal::new(
            kind.to_owned(),
            dungeon.display_name_or(kind).to_owned(),
            site,
            storm.id,
            frame,
        );

        self.announcements
            .portal_opened(&portal.display_name, &portal.anchor, portals.announce_radius);
        info!(
            portal_id = %portal.id,
            kind,
            storm_id = %storm.id,
            anchor = %portal.anchor,
            "portal opened"
        );

        let snapshot = portal.snapshot();
        state.claimed_storms.insert(storm.id);
        state.portals.insert(portal.id, portal);
        snapshot
    }

    // -----------------------------------------------------------------------
    // Sweeping and removal
    // -----------------------------------------------------------------------

    /// Tear down every portal whose storm has ended or whose frame has
    /// fallen below the half-intact threshold. Returns how many were
    /// removed.
    pub async fn sweep(&self) -> usize {
        let storms = self.storms.active_storms();
        let mut state = self.state.write().await;

        let doomed: Vec<(PortalId, RemovalReason)> = state
            .portals
            .values()
            .filter_map(|portal| {
                let storm_alive = storms
                    .iter()
                    .any(|s| s.id == portal.storm_id && !s.has_ended());
                if !storm_alive {
                    return Some((portal.id, RemovalReason::StormEnded));
                }
                if !handle_is_intact(self.frames.as_ref(), portal.frame) {
                    return Some((portal.id, RemovalReason::FrameBroken));
                }
                None
            })
            .collect();

        let count = doomed.len();
        for (id, reason) in doomed {
            self.remove_locked(&mut state, id, reason);
        }
        count
    }

    /// Remove one portal by id. Returns whether it existed. Idempotent.
    pub async fn remove(&self, id: PortalId) -> bool {
        let mut state = self.state.write().await;
        self.remove_locked(&mut state, id, RemovalReason::Explicit)
    }

    /// Remove every live portal. Returns how many were removed.
    pub async fn clear_all(&self) -> usize {
        let mut state = self.state.write().await;
        self.clear_locked(&mut state, RemovalReason::Explicit)
    }

    /// Refuse further spawns and tear down every live portal.
    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::Release);
        let mut state = self.state.write().await;
        let removed = self.clear_locked(&mut state, RemovalReason::Shutdown);
        info!(removed, "portal manager shut down");
    }

    fn clear_locked(&self, state: &mut ManagerState, reason: RemovalReason) -> usize {
        let ids: Vec<PortalId> = state.portals.keys().copied().collect();
        let count = ids.len();
        for id in ids {
            self.remove_locked(state, id, reason);
        }
        count
    }

    fn remove_locked(&self, state: &mut ManagerState, id: PortalId, reason: RemovalReason) -> bool {
        let Some(mut portal) = state.portals.remove(&id) else {
            return false;
        };
        if portal.mark_removed() {
            self.frames.teardown(portal.frame);
            self.announcements
                .portal_closed(&portal.display_name, &portal.anchor);
            info!(
                portal_id = %portal.id,
                kind = portal.kind,
                reason = reason.as_str(),
                "portal closed"
            );
        }
        state.claimed_storms.remove(&portal.storm_id);
        true
    }

    // -----------------------------------------------------------------------
    // Queries and effects
    // -----------------------------------------------------------------------

    /// The portal whose frame covers the given anchor, if any.
    pub async fn portal_at(&self, anchor: &Anchor) -> Option<PortalSnapshot> {
        let state = self.state.read().await;
        state
            .portals
            .values()
            .find(|p| p.anchor.region == anchor.region && self.frames.covers(p.frame, anchor))
            .map(Portal::snapshot)
    }

    /// The nearest portal in the anchor's region, with its distance.
    pub async fn nearest_to(&self, anchor: &Anchor) -> Option<(PortalSnapshot, f64)> {
        let state = self.state.read().await;
        let mut best: Option<(&Portal, f64)> = None;
        for portal in state.portals.values() {
            let Some(distance) = anchor.distance_to(&portal.anchor) else {
                continue;
            };
            match best {
                Some((_, d)) if distance >= d => {}
                _ => best = Some((portal, distance)),
            }
        }
        best.map(|(portal, distance)| (portal.snapshot(), distance))
    }

    /// Snapshots of every live portal, in id order.
    pub async fn active_portals(&self) -> Vec<PortalSnapshot> {
        let state = self.state.read().await;
        state.portals.values().map(Portal::snapshot).collect()
    }

    /// Number of live portals.
    pub async fn portal_count(&self) -> usize {
        self.state.read().await.portals.len()
    }

    /// Emit one ambient effect pulse at every live portal.
    pub async fn pulse_effects(&self) {
        let state = self.state.read().await;
        for portal in state.portals.values() {
            self.announcements.portal_pulse(&portal.anchor);
        }
    }
}

/// Roll against a probability in `[0, 1]`, per ten-thousand.
fn roll_passes(chance: Decimal, rng: &mut impl Rng) -> bool {
    let threshold = chance
        .saturating_mul(Decimal::from(PROBABILITY_SCALE))
        .to_i64()
        .unwrap_or(0)
        .clamp(0, PROBABILITY_SCALE);
    if threshold == 0 {
        return false;
    }
    rng.random_range(0..PROBABILITY_SCALE) < threshold
}
