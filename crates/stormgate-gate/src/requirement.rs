//! The admission-check capability.
//!
//! A [`Requirement`] is one independent entry check against a player.
//! Instances are parameterized once from configuration plus the specific
//! portal being entered, then queried; they carry no chain state and do
//! not see each other.

use stormgate_types::{Anchor, PlayerId};

/// The player attempting entry, as seen by requirement checks.
#[derive(Debug, Clone, PartialEq)]
pub struct Entrant {
    /// The player's identity.
    pub player: PlayerId,
    /// Where the player currently stands.
    pub position: Anchor,
}

impl Entrant {
    /// Create an entrant from a player and their current position.
    pub const fn new(player: PlayerId, position: Anchor) -> Self {
        Self { player, position }
    }
}

/// One independent admission check.
pub trait Requirement: Send + Sync {
    /// Whether the entrant meets this requirement.
    fn check(&self, entrant: &Entrant) -> bool;

    /// Human-readable description of why the entrant fails, including
    /// their current standing where the backing source can report it.
    fn failure_message(&self, entrant: &Entrant) -> String;

    /// Short requirement name, for logs.
    fn name(&self) -> &'static str;
}
