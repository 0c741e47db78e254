//! Completion tracking and reward payout for Stormgate.
//!
//! Every dungeon completion flows through this crate: the payout is
//! computed, deposited through the essence provider, and recorded in the
//! completion ledger. The ledger is the system's only persistent state
//! and doubles as the read-side for completion-gated entry requirements.
//!
//! # Modules
//!
//! - [`config`] -- The `rewards` configuration section
//! - [`ledger`] -- In-memory completion counts and the shared handle
//! - [`store`] -- Ledger persistence (YAML file, in-memory)
//! - [`reward`] -- The payout computation and [`RewardManager`]

pub mod config;
pub mod ledger;
pub mod reward;
pub mod store;

// Re-export primary types at crate root.
pub use config::RewardsConfig;
pub use ledger::{CompletionLedger, SharedLedger};
pub use reward::{Award, RewardManager};
pub use store::{CompletionStore, InMemoryStore, YamlCompletionStore};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors from loading or saving the completion ledger.
#[derive(Debug, thiserror::Error)]
pub enum RewardError {
    /// The backing file could not be read or written.
    #[error("ledger storage i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The persisted ledger could not be parsed or serialized.
    #[error("ledger serialization failed: {0}")]
    Yaml(#[from] serde_yml::Error),
}
