//! Demo adapters for running Stormgate without a live game server.
//!
//! Every external contract gets a self-contained implementation: a
//! simulated storm front, flat terrain, an in-memory essence economy,
//! a grant-list permission source, log-line announcements, and a
//! gateway that "runs" a dungeon on a timer and reports completion.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::time::Duration;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use stormgate_types::{
    Anchor, AnnouncementSink, CompletionEvent, DungeonGateway, EssenceProvider, FrameHandle,
    FrameMaterializer, PermissionSource, PlayerId, Position, RegionId, Storm, StormId,
    StormSource, Terrain,
};

// ---------------------------------------------------------------------------
// Storms
// ---------------------------------------------------------------------------

/// A simulated storm front.
///
/// Storms age one second per driver tick and new ones roll in at random
/// over a square region around the origin. The driver task owns all
/// mutation; readers only ever see point-in-time snapshots.
#[derive(Default)]
pub struct SimStorms {
    storms: Mutex<Vec<Storm>>,
}

impl SimStorms {
    /// Chance per driver tick of a new storm forming, per ten-thousand.
    const FORMATION_CHANCE: i64 = 300;

    /// Start the weather driver. Runs until aborted.
    pub fn drive(self: std::sync::Arc<Self>, seed: u64) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut timer = tokio::time::interval(Duration::from_secs(1));
            loop {
                timer.tick().await;
                self.advance(&mut rng);
            }
        })
    }

    fn advance(&self, rng: &mut impl Rng) {
        let Ok(mut storms) = self.storms.lock() else {
            return;
        };
        for storm in storms.iter_mut() {
            storm.remaining_secs = storm.remaining_secs.saturating_sub(1);
        }
        storms.retain(|s| !s.has_ended());

        if rng.random_range(0..10_000_i64) < Self::FORMATION_CHANCE {
            let total = rng.random_range(120..300);
            let storm = Storm {
                id: StormId::new(),
                epicenter: Anchor::new(
                    RegionId::new("overworld"),
                    Position::new(
                        rng.random_range(-1000.0..1000.0),
                        70.0,
                        rng.random_range(-1000.0..1000.0),
                    ),
                ),
                remaining_secs: total,
                total_secs: total,
            };
            info!(storm_id = %storm.id, epicenter = %storm.epicenter.position, "storm formed");
            storms.push(storm);
        }
    }
}

impl StormSource for SimStorms {
    fn active_storms(&self) -> Vec<Storm> {
        self.storms.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Terrain and frames
// ---------------------------------------------------------------------------

/// Featureless flat terrain with the surface at y = 64. Everything is
/// solid ground and nothing obstructs.
pub struct FlatTerrain;

impl Terrain for FlatTerrain {
    fn surface_anchor(&self, region: &RegionId, x: f64, z: f64) -> Anchor {
        Anchor::new(region.clone(), Position::new(x, 64.0, z))
    }

    fn is_solid_below(&self, _anchor: &Anchor) -> bool {
        true
    }

    fn is_unobstructed(&self, _anchor: &Anchor) -> bool {
        true
    }
}

/// Frames as bookkeeping only: thirteen indestructible elements each,
/// covering a small box around the portal anchor.
#[derive(Default)]
pub struct SimFrames {
    frames: Mutex<BTreeMap<FrameHandle, Anchor>>,
    next: Mutex<u64>,
}

impl SimFrames {
    const ELEMENTS: u32 = 13;
    const COVER_RADIUS: f64 = 3.0;
}

impl FrameMaterializer for SimFrames {
    fn place_frame(&self, anchor: &Anchor) -> FrameHandle {
        let handle = {
            let Ok(mut next) = self.next.lock() else {
                return FrameHandle(0);
            };
            *next = next.saturating_add(1);
            FrameHandle(*next)
        };
        if let Ok(mut frames) = self.frames.lock() {
            frames.insert(handle, anchor.clone());
        }
        handle
    }

    fn teardown(&self, handle: FrameHandle) {
        if let Ok(mut frames) = self.frames.lock() {
            frames.remove(&handle);
        }
    }

    fn intact_elements(&self, handle: FrameHandle) -> u32 {
        let placed = self.frames.lock().is_ok_and(|f| f.contains_key(&handle));
        if placed { Self::ELEMENTS } else { 0 }
    }

    fn total_elements(&self, _handle: FrameHandle) -> u32 {
        Self::ELEMENTS
    }

    fn covers(&self, handle: FrameHandle, anchor: &Anchor) -> bool {
        let Ok(frames) = self.frames.lock() else {
            return false;
        };
        frames.get(&handle).is_some_and(|center| {
            center
                .distance_to(anchor)
                .is_some_and(|d| d <= Self::COVER_RADIUS)
        })
    }
}

// ---------------------------------------------------------------------------
// Economy and permissions
// ---------------------------------------------------------------------------

/// In-memory essence accounts. Unknown players open an account with the
/// configured starting balance and exposure level on first touch.
pub struct MemoryEssence {
    accounts: Mutex<BTreeMap<PlayerId, Decimal>>,
    starting_balance: Decimal,
    exposure_level: u32,
}

impl MemoryEssence {
    /// Create the economy with a starting balance and a flat exposure
    /// level for every player.
    pub const fn new(starting_balance: Decimal, exposure_level: u32) -> Self {
        Self {
            accounts: Mutex::new(BTreeMap::new()),
            starting_balance,
            exposure_level,
        }
    }
}

impl EssenceProvider for MemoryEssence {
    fn exposure_level(&self, _player: PlayerId) -> Option<u32> {
        Some(self.exposure_level)
    }

    fn balance(&self, player: PlayerId) -> Option<Decimal> {
        let Ok(mut accounts) = self.accounts.lock() else {
            return None;
        };
        Some(*accounts.entry(player).or_insert(self.starting_balance))
    }

    fn withdraw(&self, player: PlayerId, amount: Decimal) -> bool {
        let Ok(mut accounts) = self.accounts.lock() else {
            return false;
        };
        let balance = accounts.entry(player).or_insert(self.starting_balance);
        if *balance < amount {
            return false;
        }
        *balance = balance.saturating_sub(amount);
        true
    }

    fn deposit(&self, player: PlayerId, amount: Decimal) {
        if let Ok(mut accounts) = self.accounts.lock() {
            let balance = accounts.entry(player).or_insert(self.starting_balance);
            *balance = balance.saturating_add(amount);
        }
    }
}

/// Grant-list permissions: a flag is held by a player iff it was
/// granted to them through the admin console.
#[derive(Default)]
pub struct GrantedPermissions {
    grants: Mutex<BTreeSet<(PlayerId, String)>>,
}

impl GrantedPermissions {
    /// Grant a flag to a player.
    pub fn grant(&self, player: PlayerId, flag: &str) {
        if let Ok(mut grants) = self.grants.lock() {
            grants.insert((player, flag.to_owned()));
        }
    }

    /// Revoke a flag from a player.
    pub fn revoke(&self, player: PlayerId, flag: &str) {
        if let Ok(mut grants) = self.grants.lock() {
            grants.remove(&(player, flag.to_owned()));
        }
    }
}

impl PermissionSource for GrantedPermissions {
    fn has_flag(&self, player: PlayerId, flag: &str) -> bool {
        self.grants
            .lock()
            .is_ok_and(|grants| grants.contains(&(player, flag.to_owned())))
    }
}

// ---------------------------------------------------------------------------
// Announcements and the dungeon gateway
// ---------------------------------------------------------------------------

/// Announcements as structured log lines. Pulses log at trace level so
/// the once-per-second heartbeat stays out of normal output.
pub struct LogAnnouncer;

impl AnnouncementSink for LogAnnouncer {
    fn portal_opened(&self, display_name: &str, anchor: &Anchor, radius: f64) {
        info!(display_name, %anchor, radius, "a portal crackles open");
    }

    fn portal_pulse(&self, anchor: &Anchor) {
        tracing::trace!(%anchor, "portal pulse");
    }

    fn portal_closed(&self, display_name: &str, anchor: &Anchor) {
        info!(display_name, %anchor, "a portal collapses");
    }
}

/// A dungeon that always accepts, takes a fixed time to clear, and
/// reports completion on the event channel.
pub struct TimedDungeon {
    events: mpsc::Sender<CompletionEvent>,
    run_time: Duration,
}

impl TimedDungeon {
    /// Create the gateway with the completion channel and run time.
    pub const fn new(events: mpsc::Sender<CompletionEvent>, run_time: Duration) -> Self {
        Self { events, run_time }
    }
}

impl DungeonGateway for TimedDungeon {
    fn enter(&self, player: PlayerId, kind: &str) -> bool {
        let events = self.events.clone();
        let run_time = self.run_time;
        let kind = kind.to_owned();
        tokio::spawn(async move {
            info!(%player, kind, "dungeon run started");
            tokio::time::sleep(run_time).await;
            let sent = events.send(CompletionEvent { player, kind }).await;
            if sent.is_err() {
                tracing::warn!(%player, "completion channel closed, run not recorded");
            }
        });
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn essence_accounts_open_lazily() {
        let essence = MemoryEssence::new(dec!(1000), 50);
        let player = PlayerId::new();
        assert_eq!(essence.balance(player), Some(dec!(1000)));
        assert!(essence.withdraw(player, dec!(400)));
        assert!(!essence.withdraw(player, dec!(700)));
        essence.deposit(player, dec!(100));
        assert_eq!(essence.balance(player), Some(dec!(700)));
    }

    #[test]
    fn grants_are_per_player_and_flag() {
        let perms = GrantedPermissions::default();
        let a = PlayerId::new();
        let b = PlayerId::new();
        perms.grant(a, "stormgate.bypass");
        assert!(perms.has_flag(a, "stormgate.bypass"));
        assert!(!perms.has_flag(a, "stormgate.tier2"));
        assert!(!perms.has_flag(b, "stormgate.bypass"));
        perms.revoke(a, "stormgate.bypass");
        assert!(!perms.has_flag(a, "stormgate.bypass"));
    }

    #[test]
    fn frames_cover_near_the_anchor() {
        let frames = SimFrames::default();
        let anchor = Anchor::new(RegionId::new("overworld"), Position::new(0.0, 64.0, 0.0));
        let handle = frames.place_frame(&anchor);

        let near = Anchor::new(RegionId::new("overworld"), Position::new(1.0, 64.0, 1.0));
        let far = Anchor::new(RegionId::new("overworld"), Position::new(50.0, 64.0, 0.0));
        assert!(frames.covers(handle, &near));
        assert!(!frames.covers(handle, &far));

        assert_eq!(frames.intact_elements(handle), 13);
        frames.teardown(handle);
        assert_eq!(frames.intact_elements(handle), 0);
    }

    #[test]
    fn storms_age_and_expire() {
        let storms = SimStorms::default();
        {
            let mut guard = storms.storms.lock().unwrap();
            guard.push(Storm {
                id: StormId::new(),
                epicenter: Anchor::new(RegionId::new("overworld"), Position::new(0.0, 70.0, 0.0)),
                remaining_secs: 2,
                total_secs: 100,
            });
        }
        let mut rng = SmallRng::seed_from_u64(1);
        storms.advance(&mut rng);
        assert_eq!(storms.active_storms().first().map(|s| s.remaining_secs), Some(1));
        storms.advance(&mut rng);
        storms.advance(&mut rng);
        assert!(
            storms.active_storms().iter().all(|s| s.remaining_secs > 0),
            "expired storms must be dropped"
        );
    }
}
