//! The admin console.
//!
//! A line-oriented command surface over the running system. The console
//! drives everything through the same manager and coordinator the
//! scheduler uses; it holds no portal state of its own. The operator
//! acts as a single demo player for entry and permission commands.

use std::path::PathBuf;
use std::sync::Arc;

use rand::rngs::SmallRng;
use rust_decimal::Decimal;

use stormgate_core::{EntryCoordinator, EntryOutcome, PortalManager};
use stormgate_rewards::{CompletionStore, SharedLedger};
use stormgate_types::{
    Anchor, EssenceProvider, PlayerId, Position, RegionId, StormSource,
};
use stormgate_world::{nearest_storm, storm_intensity};

use crate::adapters::GrantedPermissions;

/// What the console should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleOutcome {
    /// Print the text and read the next line.
    Continue(String),
    /// Stop reading; the operator asked to quit.
    Quit,
}

/// The wired-up admin console.
pub struct Console {
    manager: Arc<PortalManager>,
    coordinator: Arc<EntryCoordinator>,
    storms: Arc<dyn StormSource>,
    essence: Arc<dyn EssenceProvider>,
    permissions: Arc<GrantedPermissions>,
    ledger: SharedLedger,
    store: Arc<dyn CompletionStore>,
    config_path: PathBuf,
    player: PlayerId,
    region: RegionId,
    rng: SmallRng,
}

/// Everything the console needs, bundled to keep construction readable.
pub struct ConsoleParts {
    /// The portal manager.
    pub manager: Arc<PortalManager>,
    /// The entry coordinator.
    pub coordinator: Arc<EntryCoordinator>,
    /// The storm source, for stats and manual spawns.
    pub storms: Arc<dyn StormSource>,
    /// The essence economy, for the balance command.
    pub essence: Arc<dyn EssenceProvider>,
    /// The grant-list permission source.
    pub permissions: Arc<GrantedPermissions>,
    /// The completion ledger.
    pub ledger: SharedLedger,
    /// Ledger persistence, for the save command.
    pub store: Arc<dyn CompletionStore>,
    /// Path reloaded by the reload command.
    pub config_path: PathBuf,
    /// The operator's demo player.
    pub player: PlayerId,
    /// Rng for manual spawns.
    pub rng: SmallRng,
}

impl Console {
    /// Assemble the console.
    pub fn new(parts: ConsoleParts) -> Self {
        Self {
            manager: parts.manager,
            coordinator: parts.coordinator,
            storms: parts.storms,
            essence: parts.essence,
            permissions: parts.permissions,
            ledger: parts.ledger,
            store: parts.store,
            config_path: parts.config_path,
            player: parts.player,
            region: RegionId::new("overworld"),
            rng: parts.rng,
        }
    }

    /// Execute one console line.
    pub async fn handle_line(&mut self, line: &str) -> ConsoleOutcome {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or("");
        let args: Vec<&str> = words.collect();

        let output = match command {
            "" => String::new(),
            "help" => Self::help(),
            "list" => self.list().await,
            "stats" => self.stats().await,
            "storms" => self.storms_report(),
            "nearest" => self.nearest(&args).await,
            "enter" => self.enter(&args).await,
            "spawn" => self.spawn(&args).await,
            "clear" => format!("removed {} portal(s)", self.manager.clear_all().await),
            "grant" => self.grant(&args),
            "revoke" => self.revoke(&args),
            "balance" => self.balance(),
            "reload" => self.reload(),
            "save" => self.save(),
            "quit" | "exit" => return ConsoleOutcome::Quit,
            other => format!("unknown command: {other} (try 'help')"),
        };
        ConsoleOutcome::Continue(output)
    }

    fn help() -> String {
        [
            "commands:",
            "  list                 live portals",
            "  stats                portal, storm, and ledger counts",
            "  storms               active storms with intensity",
            "  nearest <x> <z>      nearest portal to a position",
            "  enter <x> <z>        attempt entry at a position",
            "  spawn <kind>         force-spawn a portal at the nearest storm",
            "  clear                remove all portals",
            "  grant <flag>         grant yourself a permission flag",
            "  revoke <flag>        revoke a permission flag",
            "  balance              your essence balance",
            "  reload               reload the configuration file",
            "  save                 persist the completion ledger",
            "  quit                 shut down",
        ]
        .join("\n")
    }

    async fn list(&self) -> String {
        let portals = self.manager.active_portals().await;
        if portals.is_empty() {
            return String::from("no live portals");
        }
        portals
            .iter()
            .map(|p| format!("{} [{}] at {} (storm {})", p.display_name, p.kind, p.anchor, p.storm_id))
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn stats(&self) -> String {
        let snapshot = self.ledger.snapshot();
        let mut out = format!(
            "portals: {} | storms: {} | completions: {} across {} player(s)",
            self.manager.portal_count().await,
            self.storms.active_storms().len(),
            snapshot.total_completions(),
            snapshot.player_count(),
        );
        for (kind, count) in snapshot.player_counts(self.player) {
            out.push_str(&format!("\n  {kind}: {count}"));
        }
        out
    }

    fn storms_report(&self) -> String {
        let storms = self.storms.active_storms();
        if storms.is_empty() {
            return String::from("no active storms");
        }
        storms
            .iter()
            .map(|s| {
                format!(
                    "{} at {} intensity {} ({}s left)",
                    s.id,
                    s.epicenter.position,
                    storm_intensity(s),
                    s.remaining_secs,
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn nearest(&self, args: &[&str]) -> String {
        let Some(anchor) = self.parse_position(args) else {
            return String::from("usage: nearest <x> <z>");
        };
        match self.manager.nearest_to(&anchor).await {
            Some((portal, distance)) => {
                format!("{} at {} ({distance:.0} blocks away)", portal.display_name, portal.anchor)
            }
            None => String::from("no portals in this region"),
        }
    }

    async fn enter(&mut self, args: &[&str]) -> String {
        let Some(anchor) = self.parse_position(args) else {
            return String::from("usage: enter <x> <z>");
        };
        match self.coordinator.interact(self.player, &anchor).await {
            EntryOutcome::NotAPortal => String::from("there is no portal here"),
            EntryOutcome::Entered { portal, bypassed } => {
                if bypassed {
                    format!("entered {} (bypass)", portal.display_name)
                } else {
                    format!("entered {}", portal.display_name)
                }
            }
            EntryOutcome::RequirementsFailed { messages } => {
                let mut out = String::from("entry denied:");
                for message in messages {
                    out.push_str("\n  - ");
                    out.push_str(&message);
                }
                out
            }
            EntryOutcome::CostFailed => String::from("entry cost could not be collected"),
            EntryOutcome::GatewayUnavailable => String::from("the dungeon is unavailable"),
        }
    }

    async fn spawn(&mut self, args: &[&str]) -> String {
        let Some(kind) = args.first() else {
            return String::from("usage: spawn <kind>");
        };
        let here = Anchor::new(self.region.clone(), Position::new(0.0, 64.0, 0.0));
        let Some(storm) = nearest_storm(&self.storms.active_storms(), &here) else {
            return String::from("no active storm to host the portal");
        };
        match self.manager.force_spawn(kind, &storm, &mut self.rng).await {
            Ok(portal) => format!("opened {} at {}", portal.display_name, portal.anchor),
            Err(e) => format!("spawn failed: {e}"),
        }
    }

    fn grant(&self, args: &[&str]) -> String {
        args.first().map_or_else(
            || String::from("usage: grant <flag>"),
            |flag| {
                self.permissions.grant(self.player, flag);
                format!("granted {flag}")
            },
        )
    }

    fn revoke(&self, args: &[&str]) -> String {
        args.first().map_or_else(
            || String::from("usage: revoke <flag>"),
            |flag| {
                self.permissions.revoke(self.player, flag);
                format!("revoked {flag}")
            },
        )
    }

    fn balance(&self) -> String {
        let balance = self.essence.balance(self.player).unwrap_or(Decimal::ZERO);
        format!("{balance} essence")
    }

    fn reload(&self) -> String {
        match self.manager.config().reload_from(&self.config_path) {
            Ok(()) => String::from("configuration reloaded"),
            Err(e) => format!("reload failed: {e}"),
        }
    }

    fn save(&self) -> String {
        match self.store.save(&self.ledger.snapshot()) {
            Ok(()) => String::from("ledger saved"),
            Err(e) => format!("save failed: {e}"),
        }
    }

    fn parse_position(&self, args: &[&str]) -> Option<Anchor> {
        let x: f64 = args.first()?.parse().ok()?;
        let z: f64 = args.get(1)?.parse().ok()?;
        Some(Anchor::new(self.region.clone(), Position::new(x, 64.0, z)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    use stormgate_core::{ConfigStore, StormgateConfig};
    use stormgate_gate::RequirementChain;
    use stormgate_rewards::InMemoryStore;
    use stormgate_types::Storm;
    use stormgate_types::StormId;

    use crate::adapters::{LogAnnouncer, MemoryEssence, SimFrames};

    use super::*;

    struct FixedStorms(Mutex<Vec<Storm>>);

    impl StormSource for FixedStorms {
        fn active_storms(&self) -> Vec<Storm> {
            self.0.lock().unwrap().clone()
        }
    }

    struct FlatTerrain;

    impl stormgate_types::Terrain for FlatTerrain {
        fn surface_anchor(&self, region: &RegionId, x: f64, z: f64) -> Anchor {
            Anchor::new(region.clone(), Position::new(x, 64.0, z))
        }
        fn is_solid_below(&self, _anchor: &Anchor) -> bool {
            true
        }
        fn is_unobstructed(&self, _anchor: &Anchor) -> bool {
            true
        }
    }

    fn console() -> Console {
        console_with_config_path(PathBuf::from("stormgate-config.yaml"))
    }

    fn console_with_config_path(config_path: PathBuf) -> Console {
        let yaml =
            "dungeons:\n  storm_caverns:\n    enabled: true\n    display_name: \"Storm Caverns\"\n";
        let storm = Storm {
            id: StormId::new(),
            epicenter: Anchor::new(RegionId::new("overworld"), Position::new(0.0, 70.0, 0.0)),
            remaining_secs: 50,
            total_secs: 100,
        };
        let storms = Arc::new(FixedStorms(Mutex::new(vec![storm])));
        let essence: Arc<MemoryEssence> = Arc::new(MemoryEssence::new(dec!(1000), 50));
        let permissions = Arc::new(GrantedPermissions::default());
        let ledger = SharedLedger::default();

        let manager = Arc::new(PortalManager::new(
            Arc::clone(&storms) as Arc<dyn StormSource>,
            Arc::new(FlatTerrain),
            Arc::new(SimFrames::default()),
            Arc::new(LogAnnouncer),
            ConfigStore::new(StormgateConfig::parse(yaml).unwrap()),
        ));
        let chain = RequirementChain::new(
            Some(Arc::clone(&essence) as Arc<dyn EssenceProvider>),
            Arc::clone(&permissions) as Arc<dyn stormgate_types::PermissionSource>,
            Arc::clone(&storms) as Arc<dyn StormSource>,
            Arc::new(ledger.clone()),
        );
        let coordinator = Arc::new(EntryCoordinator::new(
            Arc::clone(&manager),
            chain,
            Arc::clone(&permissions) as Arc<dyn stormgate_types::PermissionSource>,
            None,
        ));

        Console::new(ConsoleParts {
            manager,
            coordinator,
            storms,
            essence,
            permissions,
            ledger,
            store: Arc::new(InMemoryStore::new()),
            config_path,
            player: PlayerId::new(),
            rng: SmallRng::seed_from_u64(7),
        })
    }

    async fn text(console: &mut Console, line: &str) -> String {
        match console.handle_line(line).await {
            ConsoleOutcome::Continue(out) => out,
            ConsoleOutcome::Quit => String::from("<quit>"),
        }
    }

    #[tokio::test]
    async fn spawn_then_list_and_clear() {
        let mut console = console();
        assert_eq!(text(&mut console, "list").await, "no live portals");

        let spawned = text(&mut console, "spawn storm_caverns").await;
        assert!(spawned.starts_with("opened Storm Caverns"), "{spawned}");

        let listed = text(&mut console, "list").await;
        assert!(listed.contains("Storm Caverns [storm_caverns]"), "{listed}");

        assert_eq!(text(&mut console, "clear").await, "removed 1 portal(s)");
    }

    #[tokio::test]
    async fn unknown_kind_spawn_reports_error() {
        let mut console = console();
        let out = text(&mut console, "spawn no_such_kind").await;
        assert!(out.starts_with("spawn failed:"), "{out}");
    }

    #[tokio::test]
    async fn unknown_command_and_quit() {
        let mut console = console();
        let out = text(&mut console, "frobnicate").await;
        assert!(out.contains("unknown command"), "{out}");
        assert_eq!(console.handle_line("quit").await, ConsoleOutcome::Quit);
    }

    #[tokio::test]
    async fn reload_swaps_in_the_edited_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            "dungeons:\n  storm_caverns:\n    enabled: true\n    display_name: \"Storm Caverns\"\n",
        )
        .unwrap();
        let mut console = console_with_config_path(file.path().to_path_buf());

        let spawned = text(&mut console, "spawn storm_caverns").await;
        assert!(spawned.starts_with("opened Storm Caverns"), "{spawned}");
        text(&mut console, "clear").await;

        // The operator disables the kind on disk; reload makes the
        // change live without a restart.
        std::fs::write(file.path(), "dungeons:\n  storm_caverns:\n    enabled: false\n").unwrap();
        assert_eq!(text(&mut console, "reload").await, "configuration reloaded");

        let refused = text(&mut console, "spawn storm_caverns").await;
        assert!(refused.starts_with("spawn failed:"), "{refused}");
    }

    #[tokio::test]
    async fn reload_reports_a_missing_file() {
        let mut console = console();
        let out = text(&mut console, "reload").await;
        assert!(out.starts_with("reload failed:"), "{out}");
    }

    #[tokio::test]
    async fn grant_and_balance() {
        let mut console = console();
        assert_eq!(text(&mut console, "grant stormgate.bypass").await, "granted stormgate.bypass");
        assert_eq!(text(&mut console, "balance").await, "1000 essence");
    }
}
