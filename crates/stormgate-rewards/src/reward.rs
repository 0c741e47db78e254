//! Completion reward payout.
//!
//! One completion produces one [`Award`]: a randomized essence payout,
//! a first-completion bonus where it applies, and an incremented ledger
//! count. First-ness is judged against the count *before* this
//! completion is recorded, so the bonus lands exactly once per player
//! per kind.

use std::sync::Arc;

use rand::Rng;
use rust_decimal::Decimal;
use tracing::{info, warn};

use stormgate_types::{CompletionLookup, EssenceProvider, PlayerId};

use crate::config::RewardsConfig;
use crate::ledger::SharedLedger;

/// Variance rolls are taken per mille for exact decimal scaling.
const VARIANCE_SCALE: i32 = 1000;

// ---------------------------------------------------------------------------
// Award
// ---------------------------------------------------------------------------

/// The outcome of rewarding one dungeon completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Award {
    /// Randomized base payout, after the zero floor.
    pub base: Decimal,
    /// First-completion bonus on top of the base. Zero on repeats.
    pub bonus: Decimal,
    /// Total essence awarded.
    pub total: Decimal,
    /// Whether this was the player's first completion of the kind.
    pub first: bool,
    /// The player's completion count for the kind, after recording.
    pub new_count: u32,
    /// Whether the essence was actually deposited. False when no
    /// essence provider is installed or the total was zero.
    pub granted: bool,
}

// ---------------------------------------------------------------------------
// Reward manager
// ---------------------------------------------------------------------------

/// Pays out completion rewards and records them in the ledger.
pub struct RewardManager {
    ledger: SharedLedger,
    essence: Option<Arc<dyn EssenceProvider>>,
}

impl RewardManager {
    /// Create the manager over a shared ledger and an optional essence
    /// provider.
    pub const fn new(ledger: SharedLedger, essence: Option<Arc<dyn EssenceProvider>>) -> Self {
        Self { ledger, essence }
    }

    /// The ledger this manager records into.
    pub const fn ledger(&self) -> &SharedLedger {
        &self.ledger
    }

    /// Reward one completion of `kind` by `player`.
    ///
    /// The payout is `essence_base` plus a uniform variance in
    /// `[-essence_variance, +essence_variance]`, floored at zero. The
    /// player's first completion of the kind multiplies the payout by
    /// `1 + first_completion_bonus`. The ledger count is incremented
    /// only after the payout is computed, never before.
    pub fn award_completion(
        &self,
        player: PlayerId,
        kind: &str,
        config: &RewardsConfig,
        rng: &mut impl Rng,
    ) -> Award {
        let prior = self.ledger.completion_count(player, kind);
        let first = prior == 0;

        let base = rolled_payout(config, rng);
        let bonus = if first {
            base.saturating_mul(config.first_completion_bonus)
        } else {
            Decimal::ZERO
        };
        let total = base.saturating_add(bonus);

        let granted = self.grant(player, total);
        let new_count = self.ledger.increment(player, kind);

        info!(
            %player,
            kind,
            %total,
            first,
            new_count,
            granted,
            "dungeon completion rewarded"
        );

        Award {
            base,
            bonus,
            total,
            first,
            new_count,
            granted,
        }
    }

    fn grant(&self, player: PlayerId, total: Decimal) -> bool {
        if total <= Decimal::ZERO {
            return false;
        }
        match &self.essence {
            Some(provider) => {
                provider.deposit(player, total);
                true
            }
            None => {
                warn!(%player, "no essence provider installed, reward not deposited");
                false
            }
        }
    }
}

/// Base payout with the uniform variance applied and floored at zero.
fn rolled_payout(config: &RewardsConfig, rng: &mut impl Rng) -> Decimal {
    let roll = rng.random_range(-VARIANCE_SCALE..=VARIANCE_SCALE);
    let variance = config
        .essence_variance
        .saturating_mul(Decimal::from(roll))
        .checked_div(Decimal::from(VARIANCE_SCALE))
        .unwrap_or(Decimal::ZERO);
    config.essence_base.saturating_add(variance).max(Decimal::ZERO)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rust_decimal_macros::dec;

    use super::*;

    #[derive(Default)]
    struct RecordingEssence {
        deposits: Mutex<Vec<Decimal>>,
    }

    impl EssenceProvider for RecordingEssence {
        fn exposure_level(&self, _player: PlayerId) -> Option<u32> {
            None
        }
        fn balance(&self, _player: PlayerId) -> Option<Decimal> {
            None
        }
        fn withdraw(&self, _player: PlayerId, _amount: Decimal) -> bool {
            false
        }
        fn deposit(&self, _player: PlayerId, amount: Decimal) {
            self.deposits.lock().unwrap().push(amount);
        }
    }

    fn fixed_config() -> RewardsConfig {
        RewardsConfig {
            essence_base: dec!(100),
            essence_variance: Decimal::ZERO,
            first_completion_bonus: dec!(0.5),
        }
    }

    #[test]
    fn first_completion_gets_the_bonus_once() {
        let essence = Arc::new(RecordingEssence::default());
        let manager = RewardManager::new(
            SharedLedger::default(),
            Some(Arc::clone(&essence) as Arc<dyn EssenceProvider>),
        );
        let player = PlayerId::new();
        let mut rng = SmallRng::seed_from_u64(7);

        let first = manager.award_completion(player, "storm_caverns", &fixed_config(), &mut rng);
        assert!(first.first);
        assert_eq!(first.total, dec!(150));
        assert_eq!(first.new_count, 1);
        assert!(first.granted);

        let second = manager.award_completion(player, "storm_caverns", &fixed_config(), &mut rng);
        assert!(!second.first);
        assert_eq!(second.total, dec!(100));
        assert_eq!(second.new_count, 2);

        assert_eq!(*essence.deposits.lock().unwrap(), vec![dec!(150), dec!(100)]);
    }

    #[test]
    fn bonus_is_per_kind() {
        let manager = RewardManager::new(SharedLedger::default(), None);
        let player = PlayerId::new();
        let mut rng = SmallRng::seed_from_u64(7);

        let caverns = manager.award_completion(player, "storm_caverns", &fixed_config(), &mut rng);
        let keep = manager.award_completion(player, "tempest_keep", &fixed_config(), &mut rng);
        assert!(caverns.first);
        assert!(keep.first);
    }

    #[test]
    fn payout_never_goes_negative() {
        let config = RewardsConfig {
            essence_base: dec!(10),
            essence_variance: dec!(500),
            first_completion_bonus: Decimal::ZERO,
        };
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..200 {
            assert!(rolled_payout(&config, &mut rng) >= Decimal::ZERO);
        }
    }

    #[test]
    fn variance_stays_within_bounds() {
        let config = RewardsConfig {
            essence_base: dec!(100),
            essence_variance: dec!(25),
            first_completion_bonus: Decimal::ZERO,
        };
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..200 {
            let payout = rolled_payout(&config, &mut rng);
            assert!(payout >= dec!(75));
            assert!(payout <= dec!(125));
        }
    }

    #[test]
    fn ungranted_reward_still_counts() {
        let manager = RewardManager::new(SharedLedger::default(), None);
        let player = PlayerId::new();
        let mut rng = SmallRng::seed_from_u64(7);
        let award = manager.award_completion(player, "storm_caverns", &fixed_config(), &mut rng);
        assert!(!award.granted);
        assert_eq!(award.new_count, 1);
    }
}
