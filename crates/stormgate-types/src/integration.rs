//! Collaborator contracts for the external systems Stormgate plugs into.
//!
//! Each trait here is the whole surface the core needs from one external
//! system: the storm tracker, the physical world, the essence economy, the
//! permission system, and the downstream dungeon runner. Adapters
//! implement these at the boundary; the core never performs runtime type
//! inspection or reflection to reach an integration.
//!
//! Optional integrations are injected as `Option<Arc<dyn Trait>>` at
//! startup. `None` degrades functionality: read-only checks pass
//! vacuously, write operations fail.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::geometry::{Anchor, RegionId};
use crate::ids::{PlayerId, StormId};
use crate::storm::Storm;

/// Opaque handle to a materialized portal frame.
///
/// Issued by [`FrameMaterializer::place_frame`]; only meaningful to the
/// materializer that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FrameHandle(pub u64);

/// Source of active traveling storms.
///
/// Must tolerate having no active storms (empty list).
pub trait StormSource: Send + Sync {
    /// All currently active storms, as point-in-time snapshots.
    fn active_storms(&self) -> Vec<Storm>;

    /// Look up a single storm by id. `None` when the storm has ended or
    /// was never known.
    fn find(&self, id: StormId) -> Option<Storm> {
        self.active_storms().into_iter().find(|s| s.id == id)
    }
}

/// Read access to the physical world's terrain, for portal siting.
pub trait Terrain: Send + Sync {
    /// The anchor one block above the highest solid block at (x, z).
    fn surface_anchor(&self, region: &RegionId, x: f64, z: f64) -> Anchor;

    /// Whether the block directly below the anchor is solid ground.
    fn is_solid_below(&self, anchor: &Anchor) -> bool;

    /// Whether the anchor's block and the block above it are both clear.
    fn is_unobstructed(&self, anchor: &Anchor) -> bool;
}

/// Places and tears down physical portal frames.
///
/// The materializer owns all block-level geometry. The core only ever
/// reasons about opaque handles and element counts.
pub trait FrameMaterializer: Send + Sync {
    /// Build a portal frame at the anchor and return its handle.
    fn place_frame(&self, anchor: &Anchor) -> FrameHandle;

    /// Remove the frame's blocks from the world. Safe to call twice.
    fn teardown(&self, handle: FrameHandle);

    /// Number of the frame's original elements still intact.
    fn intact_elements(&self, handle: FrameHandle) -> u32;

    /// Number of elements the frame was built with.
    fn total_elements(&self, handle: FrameHandle) -> u32;

    /// Whether the anchor lies on one of the frame's blocks.
    fn covers(&self, handle: FrameHandle, anchor: &Anchor) -> bool;
}

/// The essence economy: exposure levels, balances, and transfers.
///
/// Reads return `None` when the backing source cannot answer for the
/// player. Writes return `false` on failure and must not partially apply.
pub trait EssenceProvider: Send + Sync {
    /// The player's storm exposure level.
    fn exposure_level(&self, player: PlayerId) -> Option<u32>;

    /// The player's current essence balance.
    fn balance(&self, player: PlayerId) -> Option<Decimal>;

    /// Withdraw essence from the player. Returns whether the full amount
    /// was deducted.
    fn withdraw(&self, player: PlayerId, amount: Decimal) -> bool;

    /// Deposit essence to the player.
    fn deposit(&self, player: PlayerId, amount: Decimal);
}

/// Permission flags carried by players.
pub trait PermissionSource: Send + Sync {
    /// Whether the player carries the named capability flag.
    fn has_flag(&self, player: PlayerId, flag: &str) -> bool;
}

/// Read-only view of historical dungeon completion counts.
///
/// Implemented by the reward ledger; the requirement chain uses this to
/// gate kinds on prior completions of other kinds.
pub trait CompletionLookup: Send + Sync {
    /// How many times the player has completed the named kind.
    fn completion_count(&self, player: PlayerId, kind: &str) -> u32;
}

/// Presentation-side notifications. All methods are fire-and-forget side
/// effects; implementations must tolerate anchors whose portal has
/// already disappeared.
pub trait AnnouncementSink: Send + Sync {
    /// A portal opened; notify observers within `radius` of the anchor.
    fn portal_opened(&self, display_name: &str, anchor: &Anchor, radius: f64);

    /// Periodic ambient effect pulse at a live portal.
    fn portal_pulse(&self, anchor: &Anchor);

    /// A portal was torn down.
    fn portal_closed(&self, display_name: &str, anchor: &Anchor);
}

/// Hand-off to the external dungeon-running system.
pub trait DungeonGateway: Send + Sync {
    /// Send the player into the named dungeon kind. Returns whether the
    /// hand-off was accepted.
    fn enter(&self, player: PlayerId, kind: &str) -> bool;
}

/// A typed dungeon-completion notification.
///
/// The gateway adapter translates whatever native completion signal the
/// dungeon system produces into this event at the boundary; the reward
/// path consumes only this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEvent {
    /// The player who completed the dungeon.
    pub player: PlayerId,
    /// The configured dungeon kind that was completed.
    pub kind: String,
}
