//! Ledger persistence.
//!
//! The store contract keeps the reward path independent of where counts
//! live. The YAML store is the production implementation; the in-memory
//! store backs tests and ephemeral runs.

use std::path::PathBuf;
use std::sync::Mutex;

use tracing::{debug, info};

use crate::RewardError;
use crate::ledger::CompletionLedger;

/// Durable storage for the completion ledger.
pub trait CompletionStore: Send + Sync {
    /// Load the persisted ledger. A missing backing file yields an empty
    /// ledger, not an error; a corrupt one is an error.
    ///
    /// # Errors
    ///
    /// Returns [`RewardError`] when the backing storage exists but cannot
    /// be read or parsed.
    fn load(&self) -> Result<CompletionLedger, RewardError>;

    /// Persist the full ledger, replacing any previous contents.
    ///
    /// # Errors
    ///
    /// Returns [`RewardError`] when the ledger cannot be serialized or
    /// written.
    fn save(&self, ledger: &CompletionLedger) -> Result<(), RewardError>;
}

// ---------------------------------------------------------------------------
// YAML file store
// ---------------------------------------------------------------------------

/// Stores the ledger as a YAML file.
///
/// Writes go through a temporary sibling file plus rename, so a crash
/// mid-save never leaves a truncated ledger behind.
pub struct YamlCompletionStore {
    path: PathBuf,
}

impl YamlCompletionStore {
    /// Create a store backed by the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl CompletionStore for YamlCompletionStore {
    fn load(&self) -> Result<CompletionLedger, RewardError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no ledger file yet, starting empty");
            return Ok(CompletionLedger::new());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let ledger = serde_yml::from_str(&raw)?;
        Ok(ledger)
    }

    fn save(&self, ledger: &CompletionLedger) -> Result<(), RewardError> {
        let raw = serde_yml::to_string(ledger)?;
        let tmp = self.path.with_extension("yaml.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.path)?;
        info!(
            path = %self.path.display(),
            players = ledger.player_count(),
            "completion ledger saved"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Keeps the ledger in memory only. Loads return whatever was last saved.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    saved: Mutex<CompletionLedger>,
}

impl InMemoryStore {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CompletionStore for InMemoryStore {
    fn load(&self) -> Result<CompletionLedger, RewardError> {
        match self.saved.lock() {
            Ok(ledger) => Ok(ledger.clone()),
            Err(poisoned) => Ok(poisoned.into_inner().clone()),
        }
    }

    fn save(&self, ledger: &CompletionLedger) -> Result<(), RewardError> {
        match self.saved.lock() {
            Ok(mut saved) => *saved = ledger.clone(),
            Err(poisoned) => *poisoned.into_inner() = ledger.clone(),
        }
        Ok(())
    }
}
