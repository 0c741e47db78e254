//! The completion ledger: per-player dungeon completion counts.
//!
//! The ledger is the system's only persistent state. It is a plain
//! counter map; reward amounts are derived from it at payout time and
//! never stored.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::warn;

use stormgate_types::{CompletionLookup, PlayerId};

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Per-player completion counts, keyed by dungeon kind.
///
/// Counts only ever increase, one at a time, and saturate at `u32::MAX`
/// rather than wrap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionLedger {
    /// `player -> kind -> count`. Both levels sorted for deterministic
    /// serialization.
    counts: BTreeMap<PlayerId, BTreeMap<String, u32>>,
}

impl CompletionLedger {
    /// Create an empty ledger.
    pub const fn new() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }

    /// How many times the player has completed the kind. Zero for
    /// unknown players and kinds.
    pub fn count(&self, player: PlayerId, kind: &str) -> u32 {
        self.counts
            .get(&player)
            .and_then(|kinds| kinds.get(kind))
            .copied()
            .unwrap_or(0)
    }

    /// Record one more completion of `kind` by `player` and return the
    /// new count.
    pub fn increment(&mut self, player: PlayerId, kind: &str) -> u32 {
        let entry = self
            .counts
            .entry(player)
            .or_default()
            .entry(kind.to_owned())
            .or_insert(0);
        *entry = entry.saturating_add(1);
        *entry
    }

    /// All of one player's completion counts, sorted by kind.
    pub fn player_counts(&self, player: PlayerId) -> BTreeMap<String, u32> {
        self.counts.get(&player).cloned().unwrap_or_default()
    }

    /// Total completions recorded across all players and kinds.
    pub fn total_completions(&self) -> u64 {
        self.counts
            .values()
            .flat_map(BTreeMap::values)
            .fold(0_u64, |acc, &c| acc.saturating_add(u64::from(c)))
    }

    /// Number of players with at least one recorded completion.
    pub fn player_count(&self) -> usize {
        self.counts.len()
    }
}

// ---------------------------------------------------------------------------
// Shared handle
// ---------------------------------------------------------------------------

/// Thread-safe shared handle over a [`CompletionLedger`].
///
/// Uses a synchronous lock: ledger operations are brief in-memory map
/// updates, so the lock is never held across an await point.
#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<RwLock<CompletionLedger>>,
}

impl SharedLedger {
    /// Wrap a ledger in a shared handle.
    pub fn new(ledger: CompletionLedger) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ledger)),
        }
    }

    /// Record one completion and return the new count.
    pub fn increment(&self, player: PlayerId, kind: &str) -> u32 {
        match self.inner.write() {
            Ok(mut ledger) => ledger.increment(player, kind),
            Err(poisoned) => {
                warn!("completion ledger lock poisoned, recovering");
                poisoned.into_inner().increment(player, kind)
            }
        }
    }

    /// Snapshot the whole ledger, for persistence and stats.
    pub fn snapshot(&self) -> CompletionLedger {
        match self.inner.read() {
            Ok(ledger) => ledger.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the ledger contents, used when loading from disk.
    pub fn replace(&self, ledger: CompletionLedger) {
        match self.inner.write() {
            Ok(mut current) => *current = ledger,
            Err(poisoned) => *poisoned.into_inner() = ledger,
        }
    }
}

impl CompletionLookup for SharedLedger {
    fn completion_count(&self, player: PlayerId, kind: &str) -> u32 {
        match self.inner.read() {
            Ok(ledger) => ledger.count(player, kind),
            Err(poisoned) => poisoned.into_inner().count(player, kind),
        }
    }
}
