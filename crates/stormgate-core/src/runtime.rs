//! The scheduler runtime.
//!
//! One task owns all periodic portal work: spawn polls, cleanup sweeps,
//! and ambient effect pulses, each on its own timer. A second, optional
//! task consumes dungeon-completion events and routes them to the
//! reward manager. Both stop through a watch channel or when their
//! input closes.
//!
//! Timer periods are read once at startup; changing them in the live
//! config takes effect on the next restart.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::SmallRng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use stormgate_rewards::RewardManager;
use stormgate_types::CompletionEvent;

use crate::config::ConfigStore;
use crate::manager::PortalManager;

/// Handle to the running scheduler.
pub struct RuntimeHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RuntimeHandle {
    /// Stop the scheduler and tear down every live portal.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}

/// Start the portal scheduler.
///
/// Polls for spawns every `check_interval_secs`, sweeps every
/// `cleanup_interval_secs`, and pulses effects every
/// `effects_interval_secs`. All periods are clamped to at least one
/// second. On shutdown the manager refuses further spawns and removes
/// every portal before the task exits.
pub fn start_scheduler(manager: Arc<PortalManager>, mut rng: SmallRng) -> RuntimeHandle {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let portals = manager.config().current().portals.clone();
        let mut spawn_timer = timer(portals.check_interval_secs);
        let mut cleanup_timer = timer(portals.cleanup_interval_secs);
        let mut effects_timer = timer(portals.effects_interval_secs);

        info!(
            check_interval_secs = portals.check_interval_secs,
            cleanup_interval_secs = portals.cleanup_interval_secs,
            effects_interval_secs = portals.effects_interval_secs,
            "portal scheduler started"
        );

        loop {
            tokio::select! {
                _ = spawn_timer.tick() => {
                    let spawned = manager.poll_and_spawn(&mut rng).await;
                    if !spawned.is_empty() {
                        debug!(count = spawned.len(), "spawn poll opened portals");
                    }
                }
                _ = cleanup_timer.tick() => {
                    let removed = manager.sweep().await;
                    if removed > 0 {
                        debug!(removed, "cleanup sweep closed portals");
                    }
                }
                _ = effects_timer.tick() => {
                    manager.pulse_effects().await;
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
            }
        }

        manager.shutdown().await;
        info!("portal scheduler stopped");
    });

    RuntimeHandle { shutdown_tx, task }
}

/// Start the completion listener.
///
/// Consumes [`CompletionEvent`]s until the channel closes, rewarding
/// each against the kind's reward configuration. Events for kinds no
/// longer in the configuration are rewarded with defaults; the
/// completion itself always counts.
pub fn start_completion_listener(
    rewards: Arc<RewardManager>,
    config: ConfigStore,
    mut events: mpsc::Receiver<CompletionEvent>,
    mut rng: SmallRng,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let reward_config = config
                .current()
                .dungeons
                .get(&event.kind)
                .map(|d| d.rewards.clone())
                .unwrap_or_default();
            rewards.award_completion(event.player, &event.kind, &reward_config, &mut rng);
        }
        info!("completion listener stopped");
    })
}

fn timer(period_secs: u64) -> tokio::time::Interval {
    let mut t = interval(Duration::from_secs(period_secs.max(1)));
    t.set_missed_tick_behavior(MissedTickBehavior::Delay);
    t
}
