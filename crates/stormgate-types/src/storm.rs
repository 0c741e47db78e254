//! Storm snapshot data.
//!
//! A [`Storm`] is a point-in-time view of one traveling storm as reported
//! by the storm source. The core never mutates storms; it re-queries the
//! source whenever current values are needed.

use serde::{Deserialize, Serialize};

use crate::geometry::Anchor;
use crate::ids::StormId;

/// A point-in-time snapshot of a traveling storm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storm {
    /// Identity of the storm, stable across snapshots.
    pub id: StormId,
    /// Current epicenter of the storm.
    pub epicenter: Anchor,
    /// Seconds remaining before the storm dissipates.
    pub remaining_secs: u64,
    /// The storm's total configured duration in seconds.
    pub total_secs: u64,
}

impl Storm {
    /// Whether the storm has fully dissipated.
    pub const fn has_ended(&self) -> bool {
        self.remaining_secs == 0
    }
}
