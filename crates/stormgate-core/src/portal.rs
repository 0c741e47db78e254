//! The portal entity.

use chrono::{DateTime, Utc};

use stormgate_types::{Anchor, FrameHandle, PortalId, StormId};

/// Lifecycle state of a portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalState {
    /// Standing in the world and enterable.
    Active,
    /// Torn down. Terminal; a portal is never reactivated.
    Removed,
}

/// One spawned dungeon portal.
///
/// Owned exclusively by the portal manager; everything outside the
/// manager sees cloned [`PortalSnapshot`] values.
#[derive(Debug)]
pub struct Portal {
    /// Unique portal id.
    pub id: PortalId,
    /// The dungeon kind this portal leads to.
    pub kind: String,
    /// Name shown in announcements.
    pub display_name: String,
    /// Where the portal stands.
    pub anchor: Anchor,
    /// The storm that spawned this portal.
    pub storm_id: StormId,
    /// Handle to the materialized frame.
    pub frame: FrameHandle,
    /// When the portal opened.
    pub opened_at: DateTime<Utc>,
    state: PortalState,
}

impl Portal {
    /// Create a new active portal.
    pub fn new(
        kind: String,
        display_name: String,
        anchor: Anchor,
        storm_id: StormId,
        frame: FrameHandle,
    ) -> Self {
        Self {
            id: PortalId::new(),
            kind,
            display_name,
            anchor,
            storm_id,
            frame,
            opened_at: Utc::now(),
            state: PortalState::Active,
        }
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> PortalState {
        self.state
    }

    /// Transition to removed. Returns `true` only on the first call, so
    /// teardown side effects run exactly once.
    pub const fn mark_removed(&mut self) -> bool {
        if matches!(self.state, PortalState::Removed) {
            return false;
        }
        self.state = PortalState::Removed;
        true
    }

    /// Take a read-only snapshot for callers outside the manager.
    pub fn snapshot(&self) -> PortalSnapshot {
        PortalSnapshot {
            id: self.id,
            kind: self.kind.clone(),
            display_name: self.display_name.clone(),
            anchor: self.anchor.clone(),
            storm_id: self.storm_id,
            frame: self.frame,
            opened_at: self.opened_at,
        }
    }
}

/// Read-only view of a portal, safe to hold across lock boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct PortalSnapshot {
    /// Unique portal id.
    pub id: PortalId,
    /// The dungeon kind this portal leads to.
    pub kind: String,
    /// Name shown in announcements.
    pub display_name: String,
    /// Where the portal stands.
    pub anchor: Anchor,
    /// The storm that spawned this portal.
    pub storm_id: StormId,
    /// Handle to the materialized frame.
    pub frame: FrameHandle,
    /// When the portal opened.
    pub opened_at: DateTime<Utc>,
}
