//! Portal lifecycle and coordination for Stormgate.
//!
//! Ties the workspace together: configuration, the portal manager, the
//! entry coordinator, and the scheduler runtime that drives periodic
//! spawn polls, cleanup sweeps, and effect pulses.
//!
//! # Modules
//!
//! - [`config`] -- Typed YAML configuration and the live [`ConfigStore`]
//! - [`portal`] -- The [`Portal`] entity and its snapshot view
//! - [`manager`] -- The [`PortalManager`]: spawning, sweeping, queries
//! - [`entry`] -- The [`EntryCoordinator`] for portal interactions
//! - [`runtime`] -- The scheduler task and completion listener
//! - [`error`] -- Error types for explicit portal operations

pub mod config;
pub mod entry;
pub mod error;
pub mod manager;
pub mod portal;
pub mod runtime;

// Re-export primary types at crate root.
pub use config::{
    ConfigError, ConfigStore, DungeonConfig, PortalSpawnConfig, PortalsConfig, StormgateConfig,
};
pub use entry::{BYPASS_FLAG, EntryCoordinator, EntryOutcome};
pub use error::PortalError;
pub use manager::PortalManager;
pub use portal::{Portal, PortalSnapshot, PortalState};
pub use runtime::{RuntimeHandle, start_completion_listener, start_scheduler};
