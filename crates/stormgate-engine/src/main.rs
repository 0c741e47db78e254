//! Stormgate host binary.
//!
//! Wires the portal system to a fully simulated environment: a synthetic
//! storm front, flat terrain, an in-memory essence economy, and a timed
//! dungeon gateway. The operator drives the system through a line-based
//! admin console on stdin.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `stormgate-config.yaml`
//! 3. Load the completion ledger from `stormgate-completions.yaml`
//! 4. Build the demo adapters and start the storm driver
//! 5. Assemble the requirement chain, reward manager, portal manager,
//!    and entry coordinator
//! 6. Start the portal scheduler and the completion listener
//! 7. Run the admin console until quit or Ctrl-C
//! 8. Shut down the scheduler and persist the ledger

mod adapters;
mod commands;
mod error;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use stormgate_core::{
    ConfigStore, EntryCoordinator, PortalManager, StormgateConfig, start_completion_listener,
    start_scheduler,
};
use stormgate_gate::RequirementChain;
use stormgate_rewards::{
    CompletionStore, RewardManager, SharedLedger, YamlCompletionStore,
};
use stormgate_types::{
    DungeonGateway, EssenceProvider, PermissionSource, PlayerId, StormSource,
};

use crate::adapters::{
    FlatTerrain, GrantedPermissions, LogAnnouncer, MemoryEssence, SimFrames, SimStorms,
    TimedDungeon,
};
use crate::commands::{Console, ConsoleOutcome, ConsoleParts};
use crate::error::EngineError;

const CONFIG_PATH: &str = "stormgate-config.yaml";
const LEDGER_PATH: &str = "stormgate-completions.yaml";

/// Seconds a simulated dungeon run takes before completion fires.
const DUNGEON_RUN_SECS: u64 = 10;

/// Application entry point for the Stormgate host.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("stormgate-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        dungeons = config.dungeons.len(),
        max_portals = config.portals.max_portals,
        check_interval_secs = config.portals.check_interval_secs,
        "Configuration loaded"
    );
    let config_store = ConfigStore::new(config);

    // 3. Load the completion ledger.
    let store: Arc<dyn CompletionStore> = Arc::new(YamlCompletionStore::new(LEDGER_PATH));
    let ledger = SharedLedger::new(store.load().map_err(EngineError::from)?);
    info!(
        completions = ledger.snapshot().total_completions(),
        "Completion ledger loaded"
    );

    // 4. Build the demo adapters and start the storm driver.
    let storms = Arc::new(SimStorms::default());
    let storm_driver = Arc::clone(&storms).drive(rand::random());
    let essence = Arc::new(MemoryEssence::new(Decimal::from(1000), 50));
    let permissions = Arc::new(GrantedPermissions::default());

    let (completion_tx, completion_rx) = mpsc::channel(64);
    let gateway: Arc<dyn DungeonGateway> = Arc::new(TimedDungeon::new(
        completion_tx,
        Duration::from_secs(DUNGEON_RUN_SECS),
    ));
    info!("Demo adapters ready, storm driver running");

    // 5. Assemble the core.
    let manager = Arc::new(PortalManager::new(
        Arc::clone(&storms) as Arc<dyn StormSource>,
        Arc::new(FlatTerrain),
        Arc::new(SimFrames::default()),
        Arc::new(LogAnnouncer),
        config_store.clone(),
    ));
    let chain = RequirementChain::new(
        Some(Arc::clone(&essence) as Arc<dyn EssenceProvider>),
        Arc::clone(&permissions) as Arc<dyn PermissionSource>,
        Arc::clone(&storms) as Arc<dyn StormSource>,
        Arc::new(ledger.clone()),
    );
    let coordinator = Arc::new(EntryCoordinator::new(
        Arc::clone(&manager),
        chain,
        Arc::clone(&permissions) as Arc<dyn PermissionSource>,
        Some(gateway),
    ));
    let rewards = Arc::new(RewardManager::new(
        ledger.clone(),
        Some(Arc::clone(&essence) as Arc<dyn EssenceProvider>),
    ));
    info!("Core assembled");

    // 6. Start the scheduler and the completion listener.
    let scheduler = start_scheduler(Arc::clone(&manager), SmallRng::from_os_rng());
    let listener = start_completion_listener(
        Arc::clone(&rewards),
        config_store,
        completion_rx,
        SmallRng::from_os_rng(),
    );
    info!("Scheduler and completion listener started");

    // 7. Run the admin console until quit or Ctrl-C.
    let mut console = Console::new(ConsoleParts {
        manager: Arc::clone(&manager),
        coordinator,
        storms: Arc::clone(&storms) as Arc<dyn StormSource>,
        essence: Arc::clone(&essence) as Arc<dyn EssenceProvider>,
        permissions,
        ledger: ledger.clone(),
        store: Arc::clone(&store),
        config_path: Path::new(CONFIG_PATH).to_path_buf(),
        player: PlayerId::new(),
        rng: SmallRng::from_os_rng(),
    });
    run_console(&mut console).await?;

    // 8. Shut down and persist.
    scheduler.shutdown().await;
    storm_driver.abort();
    // The gateway's sender lives in the coordinator, which is dropped
    // with the console; the listener drains and stops on its own.
    drop(console);
    let _ = listener.await;

    store.save(&ledger.snapshot()).map_err(EngineError::from)?;
    info!("stormgate-engine shutdown complete");
    Ok(())
}

/// Read console lines from stdin until quit, EOF, or Ctrl-C.
async fn run_console(console: &mut Console) -> Result<(), EngineError> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    println!("stormgate admin console (type 'help')");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("console input closed");
                    return Ok(());
                };
                match console.handle_line(&line).await {
                    ConsoleOutcome::Continue(output) => {
                        if !output.is_empty() {
                            println!("{output}");
                        }
                    }
                    ConsoleOutcome::Quit => return Ok(()),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                return Ok(());
            }
        }
    }
}

/// Load the configuration from `stormgate-config.yaml`, falling back to
/// defaults when the file does not exist.
fn load_config() -> Result<StormgateConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(StormgateConfig::from_file(config_path)?)
    } else {
        info!("Config file not found, using defaults");
        Ok(StormgateConfig::default())
    }
}
