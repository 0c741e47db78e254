//! Building and evaluating the requirement chain for a portal.
//!
//! The chain is assembled once per entry attempt from the kind's
//! configuration plus the specific portal's source storm. Evaluation is
//! exhaustive: every requirement runs and every failure is reported, so
//! the player learns everything blocking them in one attempt.
//!
//! Cost consumption is a separate, later step that only runs after the
//! whole chain passes. Unlike the read-only checks it fails closed: a
//! configured cost with no provider to collect it denies entry.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use stormgate_types::{
    CompletionLookup, EssenceProvider, PermissionSource, PlayerId, StormId, StormSource,
};

use crate::checks::{
    BalanceRequirement, CompletionRequirement, ExposureRequirement, PermissionRequirement,
    ProximityRequirement,
};
use crate::config::RequirementsConfig;
use crate::requirement::{Entrant, Requirement};

/// One cost to collect on successful entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryCost {
    /// Withdraw essence from the entrant.
    Essence(Decimal),
}

/// Assembles requirement chains and collects entry costs.
///
/// Holds the optional collaborator handles once; per-attempt state lives
/// in the built requirement list, never here.
pub struct RequirementChain {
    essence: Option<Arc<dyn EssenceProvider>>,
    permissions: Arc<dyn PermissionSource>,
    storms: Arc<dyn StormSource>,
    completions: Arc<dyn CompletionLookup>,
}

impl RequirementChain {
    /// Create the chain factory from its collaborators.
    pub const fn new(
        essence: Option<Arc<dyn EssenceProvider>>,
        permissions: Arc<dyn PermissionSource>,
        storms: Arc<dyn StormSource>,
        completions: Arc<dyn CompletionLookup>,
    ) -> Self {
        Self {
            essence,
            permissions,
            storms,
            completions,
        }
    }

    /// Build the requirement list for one portal's kind.
    ///
    /// Only configured keys contribute a requirement. Order is fixed:
    /// exposure level, essence balance, storm proximity, required
    /// completions (sorted by kind), permission. An empty configuration
    /// yields an empty list, which always passes.
    pub fn build_requirements(
        &self,
        config: &RequirementsConfig,
        storm_id: StormId,
    ) -> Vec<Box<dyn Requirement>> {
        let mut requirements: Vec<Box<dyn Requirement>> = Vec::new();

        if let Some(min_level) = config.min_exposure_level {
            requirements.push(Box::new(ExposureRequirement::new(
                self.essence.clone(),
                min_level,
            )));
        }

        if let Some(cost) = config.essence_cost {
            requirements.push(Box::new(BalanceRequirement::new(
                self.essence.clone(),
                cost,
            )));
        }

        if let Some(max_distance) = config.max_distance_from_storm {
            requirements.push(Box::new(ProximityRequirement::new(
                Arc::clone(&self.storms),
                storm_id,
                max_distance,
                config.proximity_min_intensity(),
            )));
        }

        for (kind, count) in &config.required_completions {
            requirements.push(Box::new(CompletionRequirement::new(
                Arc::clone(&self.completions),
                kind.clone(),
                *count,
            )));
        }

        if let Some(flag) = &config.permission {
            requirements.push(Box::new(PermissionRequirement::new(
                Arc::clone(&self.permissions),
                flag.clone(),
            )));
        }

        requirements
    }

    /// Run every requirement and collect all failure messages.
    ///
    /// An empty result means the entrant passes. Evaluation never stops
    /// early and has no side effects.
    pub fn evaluate(
        &self,
        config: &RequirementsConfig,
        storm_id: StormId,
        entrant: &Entrant,
    ) -> Vec<String> {
        let requirements = self.build_requirements(config, storm_id);
        let mut failures = Vec::new();
        for requirement in &requirements {
            if !requirement.check(entrant) {
                debug!(
                    player = %entrant.player,
                    requirement = requirement.name(),
                    "entry requirement failed"
                );
                failures.push(requirement.failure_message(entrant));
            }
        }
        failures
    }

    /// The costs configured for a kind. Zero and negative amounts are
    /// dropped: they are configuration noise, not debts.
    pub fn entry_costs(config: &RequirementsConfig) -> Vec<EntryCost> {
        let mut costs = Vec::new();
        if let Some(amount) = config.essence_cost {
            if amount > Decimal::ZERO {
                costs.push(EntryCost::Essence(amount));
            }
        }
        costs
    }

    /// Collect all entry costs from the player, atomically.
    ///
    /// Returns `true` only when every cost was collected. On a partial
    /// failure every already-collected cost is refunded before returning,
    /// so the player is never charged for an entry that did not happen.
    pub fn consume_costs(&self, config: &RequirementsConfig, player: PlayerId) -> bool {
        self.apply_costs(&Self::entry_costs(config), player)
    }

    pub(crate) fn apply_costs(&self, costs: &[EntryCost], player: PlayerId) -> bool {
        let mut collected: Vec<&EntryCost> = Vec::new();
        for cost in costs {
            let ok = match cost {
                EntryCost::Essence(amount) => match &self.essence {
                    Some(provider) => provider.withdraw(player, *amount),
                    None => {
                        warn!(%player, "essence cost configured but no provider is installed");
                        false
                    }
                },
            };
            if ok {
                collected.push(cost);
            } else {
                for refund in collected {
                    match refund {
                        EntryCost::Essence(amount) => {
                            if let Some(provider) = &self.essence {
                                provider.deposit(player, *amount);
                            }
                        }
                    }
                }
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::sync::Mutex;

    use rust_decimal_macros::dec;
    use stormgate_types::{Anchor, Position, RegionId, Storm};

    use super::*;

    struct NoStorms;

    impl StormSource for NoStorms {
        fn active_storms(&self) -> Vec<Storm> {
            Vec::new()
        }
    }

    struct AllowAll;

    impl PermissionSource for AllowAll {
        fn has_flag(&self, _player: PlayerId, _flag: &str) -> bool {
            true
        }
    }

    struct DenyAll;

    impl PermissionSource for DenyAll {
        fn has_flag(&self, _player: PlayerId, _flag: &str) -> bool {
            false
        }
    }

    struct NoCompletions;

    impl CompletionLookup for NoCompletions {
        fn completion_count(&self, _player: PlayerId, _kind: &str) -> u32 {
            0
        }
    }

    /// Essence account that refuses withdrawals past a configured count,
    /// for exercising the refund path.
    struct CountingEssence {
        balance: Mutex<Decimal>,
        allowed_withdrawals: Mutex<u32>,
    }

    impl CountingEssence {
        fn new(balance: Decimal, allowed_withdrawals: u32) -> Self {
            Self {
                balance: Mutex::new(balance),
                allowed_withdrawals: Mutex::new(allowed_withdrawals),
            }
        }

        fn balance_now(&self) -> Decimal {
            *self.balance.lock().unwrap()
        }
    }

    impl EssenceProvider for CountingEssence {
        fn exposure_level(&self, _player: PlayerId) -> Option<u32> {
            None
        }

        fn balance(&self, _player: PlayerId) -> Option<Decimal> {
            Some(self.balance_now())
        }

        fn withdraw(&self, _player: PlayerId, amount: Decimal) -> bool {
            let mut allowed = self.allowed_withdrawals.lock().unwrap();
            if *allowed == 0 {
                return false;
            }
            let mut balance = self.balance.lock().unwrap();
            if *balance < amount {
                return false;
            }
            *allowed = allowed.saturating_sub(1);
            *balance -= amount;
            true
        }

        fn deposit(&self, _player: PlayerId, amount: Decimal) {
            *self.balance.lock().unwrap() += amount;
        }
    }

    fn entrant() -> Entrant {
        Entrant::new(
            PlayerId::new(),
            Anchor::new(RegionId::new("overworld"), Position::new(0.0, 65.0, 0.0)),
        )
    }

    fn bare_chain(essence: Option<Arc<dyn EssenceProvider>>) -> RequirementChain {
        RequirementChain::new(essence, Arc::new(AllowAll), Arc::new(NoStorms), Arc::new(NoCompletions))
    }

    #[test]
    fn empty_config_builds_empty_chain_and_passes() {
        let chain = bare_chain(None);
        let config = RequirementsConfig::default();
        assert!(chain.build_requirements(&config, StormId::new()).is_empty());
        assert!(chain.evaluate(&config, StormId::new(), &entrant()).is_empty());
    }

    #[test]
    fn build_order_is_fixed() {
        let chain = bare_chain(None);
        let config = RequirementsConfig {
            min_exposure_level: Some(5),
            essence_cost: Some(dec!(100)),
            max_distance_from_storm: Some(80.0),
            min_storm_intensity: None,
            required_completions: [
                (String::from("b_dungeon"), 1),
                (String::from("a_dungeon"), 2),
            ]
            .into_iter()
            .collect(),
            permission: Some(String::from("stormgate.tier2")),
        };
        let names: Vec<&str> = chain
            .build_requirements(&config, StormId::new())
            .iter()
            .map(|r| r.name())
            .collect();
        assert_eq!(
            names,
            vec![
                "exposure",
                "essence",
                "storm proximity",
                "completion",
                "completion",
                "permission"
            ]
        );
    }

    #[test]
    fn evaluate_reports_every_failure() {
        let chain = RequirementChain::new(
            None,
            Arc::new(DenyAll),
            Arc::new(NoStorms),
            Arc::new(NoCompletions),
        );
        let config = RequirementsConfig {
            max_distance_from_storm: Some(50.0),
            required_completions: [(String::from("storm_caverns"), 1)].into_iter().collect(),
            permission: Some(String::from("stormgate.tier2")),
            ..RequirementsConfig::default()
        };
        let failures = chain.evaluate(&config, StormId::new(), &entrant());
        assert_eq!(failures.len(), 3);
    }

    #[test]
    fn consume_fails_closed_without_provider() {
        let chain = bare_chain(None);
        let config = RequirementsConfig {
            essence_cost: Some(dec!(100)),
            ..RequirementsConfig::default()
        };
        assert!(!chain.consume_costs(&config, PlayerId::new()));
    }

    #[test]
    fn consume_deducts_exactly_once() {
        let account = Arc::new(CountingEssence::new(dec!(500), u32::MAX));
        let chain = bare_chain(Some(Arc::clone(&account) as Arc<dyn EssenceProvider>));
        let config = RequirementsConfig {
            essence_cost: Some(dec!(150)),
            ..RequirementsConfig::default()
        };
        assert!(chain.consume_costs(&config, PlayerId::new()));
        assert_eq!(account.balance_now(), dec!(350));
    }

    #[test]
    fn zero_and_negative_costs_are_dropped() {
        let zero = RequirementsConfig {
            essence_cost: Some(Decimal::ZERO),
            ..RequirementsConfig::default()
        };
        let negative = RequirementsConfig {
            essence_cost: Some(dec!(-25)),
            ..RequirementsConfig::default()
        };
        assert!(RequirementChain::entry_costs(&zero).is_empty());
        assert!(RequirementChain::entry_costs(&negative).is_empty());

        // No provider installed, but nothing to collect either.
        let chain = bare_chain(None);
        assert!(chain.consume_costs(&zero, PlayerId::new()));
    }

    #[test]
    fn partial_failure_refunds_collected_costs() {
        // Allow one withdrawal, then fail the second; the first must be
        // deposited back.
        let account = Arc::new(CountingEssence::new(dec!(500), 1));
        let chain = bare_chain(Some(Arc::clone(&account) as Arc<dyn EssenceProvider>));
        let costs = vec![EntryCost::Essence(dec!(100)), EntryCost::Essence(dec!(50))];
        assert!(!chain.apply_costs(&costs, PlayerId::new()));
        assert_eq!(account.balance_now(), dec!(500));
    }
}
