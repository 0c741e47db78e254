//! Shared type definitions for the Stormgate workspace.
//!
//! This crate is the single source of truth for the types used across the
//! Stormgate workspace: entity identifiers, world geometry, storm
//! snapshots, and the collaborator contracts external integrations
//! implement.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`geometry`] -- Regions, positions, anchors
//! - [`storm`] -- Point-in-time storm snapshots
//! - [`integration`] -- Traits for the external collaborators

pub mod geometry;
pub mod ids;
pub mod integration;
pub mod storm;

// Re-export all public types at crate root for convenience.
pub use geometry::{Anchor, Position, RegionId};
pub use ids::{PlayerId, PortalId, StormId};
pub use integration::{
    AnnouncementSink, CompletionEvent, CompletionLookup, DungeonGateway, EssenceProvider,
    FrameHandle, FrameMaterializer, PermissionSource, StormSource, Terrain,
};
pub use storm::Storm;
