//! Entry gating for Stormgate portals.
//!
//! Turns a dungeon kind's `requirements` configuration into a chain of
//! independent admission checks, evaluates the whole chain against an
//! entrant, and collects entry costs once the chain passes.
//!
//! # Modules
//!
//! - [`config`] -- The `requirements` configuration section
//! - [`requirement`] -- The [`Requirement`] contract and [`Entrant`]
//! - [`checks`] -- The five requirement variants
//! - [`chain`] -- Chain assembly, evaluation, cost consumption

pub mod chain;
pub mod checks;
pub mod config;
pub mod requirement;

pub use chain::{EntryCost, RequirementChain};
pub use checks::{
    BalanceRequirement, CompletionRequirement, ExposureRequirement, PermissionRequirement,
    ProximityRequirement,
};
pub use config::{DEFAULT_SPAWN_MIN_INTENSITY, RequirementsConfig};
pub use requirement::{Entrant, Requirement};
