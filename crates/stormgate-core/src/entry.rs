//! Portal entry coordination.
//!
//! Wires an interaction at a portal frame through the requirement
//! chain, cost consumption, and the dungeon gateway hand-off, in that
//! order. Costs are only collected once the gateway is known to be
//! installed, so a half-configured server never charges players for
//! doors that go nowhere.

use std::sync::Arc;

use tracing::{info, warn};

use stormgate_gate::{Entrant, RequirementChain};
use stormgate_types::{Anchor, DungeonGateway, PermissionSource, PlayerId};

use crate::manager::PortalManager;
use crate::portal::PortalSnapshot;

/// Permission flag that skips all entry requirements and costs.
pub const BYPASS_FLAG: &str = "stormgate.bypass";

/// What happened when a player interacted with a location.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    /// The location is not part of any portal frame.
    NotAPortal,
    /// The player was handed off to the dungeon.
    Entered {
        /// The portal entered.
        portal: PortalSnapshot,
        /// Whether entry used the bypass flag.
        bypassed: bool,
    },
    /// One or more requirements failed. Every failure is reported.
    RequirementsFailed {
        /// Player-facing failure messages, in requirement order.
        messages: Vec<String>,
    },
    /// Requirements passed but the entry cost could not be collected.
    CostFailed,
    /// No dungeon gateway is installed, or it refused the hand-off.
    GatewayUnavailable,
}

/// Coordinates portal entry attempts.
pub struct EntryCoordinator {
    manager: Arc<PortalManager>,
    chain: RequirementChain,
    permissions: Arc<dyn PermissionSource>,
    gateway: Option<Arc<dyn DungeonGateway>>,
}

impl EntryCoordinator {
    /// Create the coordinator.
    pub const fn new(
        manager: Arc<PortalManager>,
        chain: RequirementChain,
        permissions: Arc<dyn PermissionSource>,
        gateway: Option<Arc<dyn DungeonGateway>>,
    ) -> Self {
        Self {
            manager,
            chain,
            permissions,
            gateway,
        }
    }

    /// Handle a player interacting with an anchor.
    ///
    /// Resolves the portal under the anchor, evaluates the kind's
    /// requirement chain, collects costs, and hands the player to the
    /// dungeon gateway. Holders of [`BYPASS_FLAG`] skip the chain and
    /// the costs entirely.
    pub async fn interact(&self, player: PlayerId, anchor: &Anchor) -> EntryOutcome {
        let Some(portal) = self.manager.portal_at(anchor).await else {
            return EntryOutcome::NotAPortal;
        };

        let config = self.manager.config().current();
        let requirements = config
            .dungeons
            .get(&portal.kind)
            .map(|d| d.requirements.clone())
            .unwrap_or_default();

        let bypassed = self.permissions.has_flag(player, BYPASS_FLAG);
        if !bypassed {
            let entrant = Entrant::new(player, anchor.clone());
            let failures = self.chain.evaluate(&requirements, portal.storm_id, &entrant);
            if !failures.is_empty() {
                return EntryOutcome::RequirementsFailed { messages: failures };
            }
        }

        let Some(gateway) = &self.gateway else {
            warn!(%player, kind = portal.kind, "no dungeon gateway installed");
            return EntryOutcome::GatewayUnavailable;
        };

        if !bypassed && !self.chain.consume_costs(&requirements, player) {
            return EntryOutcome::CostFailed;
        }

        if !gateway.enter(player, &portal.kind) {
            // Costs stay spent: the gateway owns the failure from here.
            warn!(%player, kind = portal.kind, "dungeon gateway refused the hand-off");
            return EntryOutcome::GatewayUnavailable;
        }

        info!(%player, kind = portal.kind, portal_id = %portal.id, bypassed, "player entered portal");
        EntryOutcome::Entered { portal, bypassed }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::sync::Mutex;

    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rust_decimal::Decimal;

    use stormgate_types::{
        AnnouncementSink, CompletionLookup, EssenceProvider, FrameHandle, FrameMaterializer,
        Position, RegionId, Storm, StormId, StormSource, Terrain,
    };

    use crate::config::{ConfigStore, StormgateConfig};

    use super::*;

    struct NoStorms;

    impl StormSource for NoStorms {
        fn active_storms(&self) -> Vec<Storm> {
            Vec::new()
        }
    }

    struct FlatTerrain;

    impl Terrain for FlatTerrain {
        fn surface_anchor(&self, region: &RegionId, x: f64, z: f64) -> Anchor {
            Anchor::new(region.clone(), Position::new(x, 65.0, z))
        }
        fn is_solid_below(&self, _anchor: &Anchor) -> bool {
            true
        }
        fn is_unobstructed(&self, _anchor: &Anchor) -> bool {
            true
        }
    }

    struct WideFrames;

    impl FrameMaterializer for WideFrames {
        fn place_frame(&self, _anchor: &Anchor) -> FrameHandle {
            FrameHandle(1)
        }
        fn teardown(&self, _handle: FrameHandle) {}
        fn intact_elements(&self, _handle: FrameHandle) -> u32 {
            13
        }
        fn total_elements(&self, _handle: FrameHandle) -> u32 {
            13
        }
        fn covers(&self, _handle: FrameHandle, _anchor: &Anchor) -> bool {
            true
        }
    }

    struct SilentSink;

    impl AnnouncementSink for SilentSink {
        fn portal_opened(&self, _display_name: &str, _anchor: &Anchor, _radius: f64) {}
        fn portal_pulse(&self, _anchor: &Anchor) {}
        fn portal_closed(&self, _display_name: &str, _anchor: &Anchor) {}
    }

    struct FlagSet(Vec<String>);

    impl PermissionSource for FlagSet {
        fn has_flag(&self, _player: PlayerId, flag: &str) -> bool {
            self.0.iter().any(|f| f == flag)
        }
    }

    struct NoCompletions;

    impl CompletionLookup for NoCompletions {
        fn completion_count(&self, _player: PlayerId, _kind: &str) -> u32 {
            0
        }
    }

    #[derive(Default)]
    struct CountingGateway {
        entries: Mutex<Vec<String>>,
    }

    impl DungeonGateway for CountingGateway {
        fn enter(&self, _player: PlayerId, kind: &str) -> bool {
            self.entries.lock().unwrap().push(kind.to_owned());
            true
        }
    }

    struct BrokeEssence;

    impl EssenceProvider for BrokeEssence {
        fn exposure_level(&self, _player: PlayerId) -> Option<u32> {
            Some(50)
        }
        fn balance(&self, _player: PlayerId) -> Option<Decimal> {
            Some(Decimal::from(1_000_000))
        }
        fn withdraw(&self, _player: PlayerId, _amount: Decimal) -> bool {
            false
        }
        fn deposit(&self, _player: PlayerId, _amount: Decimal) {}
    }

    fn config(yaml: &str) -> StormgateConfig {
        StormgateConfig::parse(yaml).unwrap()
    }

    async fn manager_with_portal(cfg: StormgateConfig) -> (Arc<PortalManager>, Anchor) {
        let manager = Arc::new(PortalManager::new(
            Arc::new(NoStorms),
            Arc::new(FlatTerrain),
            Arc::new(WideFrames),
            Arc::new(SilentSink),
            ConfigStore::new(cfg),
        ));
        let storm = Storm {
            id: StormId::new(),
            epicenter: Anchor::new(RegionId::new("overworld"), Position::new(0.0, 70.0, 0.0)),
            remaining_secs: 50,
            total_secs: 100,
        };
        let mut rng = SmallRng::seed_from_u64(7);
        let portal = manager
            .force_spawn("storm_caverns", &storm, &mut rng)
            .await
            .unwrap();
        (manager, portal.anchor)
    }

    fn chain(
        essence: Option<Arc<dyn EssenceProvider>>,
        permissions: Arc<dyn PermissionSource>,
    ) -> RequirementChain {
        RequirementChain::new(essence, permissions, Arc::new(NoStorms), Arc::new(NoCompletions))
    }

    #[tokio::test]
    async fn open_kind_enters_directly() {
        let cfg = config("dungeons:\n  storm_caverns:\n    enabled: true\n");
        let (manager, anchor) = manager_with_portal(cfg).await;
        let perms: Arc<dyn PermissionSource> = Arc::new(FlagSet(Vec::new()));
        let gateway = Arc::new(CountingGateway::default());
        let coordinator = EntryCoordinator::new(
            manager,
            chain(None, Arc::clone(&perms)),
            perms,
            Some(Arc::clone(&gateway) as Arc<dyn DungeonGateway>),
        );

        let outcome = coordinator.interact(PlayerId::new(), &anchor).await;
        assert!(matches!(outcome, EntryOutcome::Entered { bypassed: false, .. }));
        assert_eq!(*gateway.entries.lock().unwrap(), vec!["storm_caverns"]);
    }

    #[tokio::test]
    async fn non_portal_anchor_is_ignored() {
        let cfg = config("dungeons:\n  storm_caverns:\n    enabled: true\n");
        let manager = Arc::new(PortalManager::new(
            Arc::new(NoStorms),
            Arc::new(FlatTerrain),
            Arc::new(WideFrames),
            Arc::new(SilentSink),
            ConfigStore::new(cfg),
        ));
        let perms: Arc<dyn PermissionSource> = Arc::new(FlagSet(Vec::new()));
        let coordinator =
            EntryCoordinator::new(manager, chain(None, Arc::clone(&perms)), perms, None);

        let anywhere = Anchor::new(RegionId::new("overworld"), Position::new(0.0, 65.0, 0.0));
        assert_eq!(
            coordinator.interact(PlayerId::new(), &anywhere).await,
            EntryOutcome::NotAPortal
        );
    }

    #[tokio::test]
    async fn failed_requirements_block_entry() {
        let cfg = config(
            "dungeons:\n  storm_caverns:\n    enabled: true\n    requirements:\n      permission: stormgate.tier2\n",
        );
        let (manager, anchor) = manager_with_portal(cfg).await;
        let perms: Arc<dyn PermissionSource> = Arc::new(FlagSet(Vec::new()));
        let gateway = Arc::new(CountingGateway::default());
        let coordinator = EntryCoordinator::new(
            manager,
            chain(None, Arc::clone(&perms)),
            perms,
            Some(Arc::clone(&gateway) as Arc<dyn DungeonGateway>),
        );

        let outcome = coordinator.interact(PlayerId::new(), &anchor).await;
        let messages = match outcome {
            EntryOutcome::RequirementsFailed { messages } => messages,
            other => {
                assert!(matches!(other, EntryOutcome::RequirementsFailed { .. }));
                Vec::new()
            }
        };
        assert_eq!(messages.len(), 1);
        assert!(gateway.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn bypass_flag_skips_requirements_and_costs() {
        let cfg = config(
            "dungeons:\n  storm_caverns:\n    enabled: true\n    requirements:\n      permission: stormgate.tier2\n      essence_cost: 100\n",
        );
        let (manager, anchor) = manager_with_portal(cfg).await;
        let perms: Arc<dyn PermissionSource> = Arc::new(FlagSet(vec![BYPASS_FLAG.to_owned()]));
        let gateway = Arc::new(CountingGateway::default());
        // Withdrawals always fail; bypass must never reach them.
        let coordinator = EntryCoordinator::new(
            manager,
            chain(Some(Arc::new(BrokeEssence)), Arc::clone(&perms)),
            perms,
            Some(Arc::clone(&gateway) as Arc<dyn DungeonGateway>),
        );

        let outcome = coordinator.interact(PlayerId::new(), &anchor).await;
        assert!(matches!(outcome, EntryOutcome::Entered { bypassed: true, .. }));
    }

    #[tokio::test]
    async fn cost_failure_blocks_entry() {
        let cfg = config(
            "dungeons:\n  storm_caverns:\n    enabled: true\n    requirements:\n      essence_cost: 100\n",
        );
        let (manager, anchor) = manager_with_portal(cfg).await;
        let perms: Arc<dyn PermissionSource> = Arc::new(FlagSet(Vec::new()));
        let gateway = Arc::new(CountingGateway::default());
        let coordinator = EntryCoordinator::new(
            manager,
            chain(Some(Arc::new(BrokeEssence)), Arc::clone(&perms)),
            perms,
            Some(Arc::clone(&gateway) as Arc<dyn DungeonGateway>),
        );

        assert_eq!(
            coordinator.interact(PlayerId::new(), &anchor).await,
            EntryOutcome::CostFailed
        );
        assert!(gateway.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_gateway_blocks_before_charging() {
        let cfg = config("dungeons:\n  storm_caverns:\n    enabled: true\n");
        let (manager, anchor) = manager_with_portal(cfg).await;
        let perms: Arc<dyn PermissionSource> = Arc::new(FlagSet(Vec::new()));
        let coordinator =
            EntryCoordinator::new(manager, chain(None, Arc::clone(&perms)), perms, None);

        assert_eq!(
            coordinator.interact(PlayerId::new(), &anchor).await,
            EntryOutcome::GatewayUnavailable
        );
    }
}
