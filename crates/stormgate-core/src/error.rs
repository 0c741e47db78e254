//! Core error types.

use stormgate_types::StormId;

/// Errors from explicit portal operations.
///
/// The scheduler's own polling never surfaces these; refusals there are
/// logged and skipped. They exist for the admin surface, where a refusal
/// must be reported to the operator.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// The manager is shutting down and refuses new portals.
    #[error("portal manager is shutting down")]
    ShuttingDown,

    /// The global portal cap is already reached.
    #[error("portal capacity reached ({max})")]
    CapacityReached {
        /// The configured cap.
        max: usize,
    },

    /// The storm already spawned a portal.
    #[error("storm {storm} already has a portal")]
    StormClaimed {
        /// The claimed storm.
        storm: StormId,
    },

    /// The dungeon kind is not configured or not enabled.
    #[error("unknown or disabled dungeon kind: {kind}")]
    UnknownKind {
        /// The requested kind id.
        kind: String,
    },
}
