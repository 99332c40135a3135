//! # Station: assembles the workers and drives graceful shutdown.
//!
//! The [`Station`] owns the global configuration, the error reporting
//! collaborator, and the shared reward source set. [`Station::run`] takes
//! the singleton lock, builds the store, spawns one [`ModuleActor`] per
//! module plus the rewards loop, then supervises them until a termination
//! signal or a fatal store failure.
//!
//! ## High-level architecture
//! ```text
//! Inputs to run():
//!   Vec<ModuleSpec> ──► Station::run(modules)
//!
//! Preparation:
//!   - SingletonLock::acquire(paths)           (fatal when a live owner exists)
//!   - StationPaths::ensure_layout()
//!   - EventLogStore + ActivityWriter + MetricsWriter (zero snapshot)
//!   - "Station Core is running" on stdout     (immediate, precedes the spawns)
//!
//! Spawn workers:
//!   ModuleSpec[0] ... ModuleSpec[N-1]         RewardsLoop
//!        │                  │                      │
//!        └──► ModuleActor ──┘                      │
//!                  └── child token = runtime_token.child_token()
//!                      set.spawn(worker.run(child_token))
//!
//! Shutdown paths:
//!   signal  ──► cancel token ──► wait_all_with_grace(cfg.grace)
//!   fatal worker error ──► cancel token ──► bounded drain ──► error returned
//! ```
//!
//! A module exiting is not a shutdown trigger: its actor records the exit
//! and finishes, the rest of the station keeps running.
//!
//! ## Example
//! ```no_run
//! use station_core::{zinnia, Config, Station, StationError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StationError> {
//!     let mut cfg = Config::new("/tmp/station-demo");
//!     cfg.wallet_address = Some("f1abjxfbp274xpdqcpuaykwkfb43omjotacm2p3za".to_string());
//!     let wallet = cfg.wallet_address.clone().unwrap_or_default();
//!
//!     let modules = vec![zinnia(&cfg, &wallet)];
//!     Station::new(cfg).run(modules).await
//! }
//! ```

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::{actor::ModuleActor, module::ModuleSpec, shutdown};
use crate::error::StationError;
use crate::lock::SingletonLock;
use crate::report::{ErrorReporter, TracingReporter};
use crate::rewards::{RewardsLoop, SharedRewardSources};
use crate::store::{ActivityWriter, EventLogStore, MetricsSink, MetricsWriter};

/// Source name the station uses for its own activity records.
const STATION_SOURCE: &str = "Station Core";

/// Coordinates module actors, the rewards loop, and graceful shutdown.
pub struct Station {
    /// Global configuration.
    pub cfg: Config,
    /// Error reporting collaborator, told about module exits.
    pub reporter: Arc<dyn ErrorReporter>,
    /// Reward sources, shared with the embedding layer. Starts empty; the
    /// rewards loop idles until something is pushed here.
    pub reward_sources: SharedRewardSources,
}

impl Station {
    /// Station with the default reporter and an empty reward source set.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            reporter: Arc::new(TracingReporter),
            reward_sources: Arc::new(tokio::sync::RwLock::new(Vec::new())),
        }
    }

    /// Runs the station until a termination signal arrives or a worker hits
    /// a fatal store failure.
    ///
    /// Requires [`Config::wallet_address`]; reader commands do not go
    /// through here and work without it. The first log line is written
    /// before any module is spawned, so startup is observable immediately
    /// even when a module hangs.
    pub async fn run(&self, modules: Vec<ModuleSpec>) -> Result<(), StationError> {
        let wallet = self
            .cfg
            .wallet_address
            .clone()
            .ok_or(StationError::WalletRequired)?;
        let _lock = SingletonLock::acquire(&self.cfg.paths)?;
        self.cfg
            .paths
            .ensure_layout()
            .map_err(|source| StationError::LogIo {
                path: self.cfg.paths.root.clone(),
                source,
            })?;

        let store = EventLogStore::new();
        let activity = ActivityWriter::new(store.clone(), &self.cfg.paths.activity);
        let metrics = MetricsWriter::new(store.clone(), &self.cfg.paths.metrics);

        tracing::info!("Station Core is running");
        activity
            .info(STATION_SOURCE, "Station Core started")
            .await?;

        let token = CancellationToken::new();
        let alive = AliveSet::default();
        let mut set = JoinSet::new();
        self.spawn_module_actors(&mut set, &token, &alive, &store, &activity, &metrics, modules);
        self.spawn_rewards_loop(&mut set, &token, &alive, &wallet, metrics);

        self.drive(&mut set, &token, &alive).await
    }

    /// Spawns one actor per module under a child token.
    #[allow(clippy::too_many_arguments)]
    fn spawn_module_actors(
        &self,
        set: &mut JoinSet<Result<(), StationError>>,
        runtime_token: &CancellationToken,
        alive: &AliveSet,
        store: &EventLogStore,
        activity: &ActivityWriter,
        metrics: &MetricsWriter,
        modules: Vec<ModuleSpec>,
    ) {
        for spec in modules {
            let actor = ModuleActor {
                module_log: self.cfg.paths.module_log(&spec.name),
                all_log: self.cfg.paths.all_logs.clone(),
                spec,
                store: store.clone(),
                activity: activity.clone(),
                metrics: Arc::new(metrics.clone()) as Arc<dyn MetricsSink>,
                reporter: self.reporter.clone(),
                readiness_timeout: self.cfg.readiness_timeout,
            };
            let name = actor.spec.name.clone();
            alive.insert(&name);
            let alive = alive.clone();
            let child = runtime_token.child_token();
            set.spawn(async move {
                let result = actor.run(child).await;
                alive.remove(&name);
                result
            });
        }
    }

    fn spawn_rewards_loop(
        &self,
        set: &mut JoinSet<Result<(), StationError>>,
        runtime_token: &CancellationToken,
        alive: &AliveSet,
        wallet: &str,
        metrics: MetricsWriter,
    ) {
        let rewards = RewardsLoop::new(
            self.reward_sources.clone(),
            wallet,
            metrics,
            self.cfg.contracts_poll,
            self.cfg.rewards_pacing(),
        );
        alive.insert("rewards");
        let alive = alive.clone();
        let child = runtime_token.child_token();
        set.spawn(async move {
            let result = rewards.run(child).await;
            alive.remove("rewards");
            result
        });
    }

    /// Waits until a shutdown signal arrives or every worker has finished.
    /// A worker's fatal error cancels the rest and is returned after a
    /// bounded drain.
    async fn drive(
        &self,
        set: &mut JoinSet<Result<(), StationError>>,
        runtime_token: &CancellationToken,
        alive: &AliveSet,
    ) -> Result<(), StationError> {
        tokio::select! {
            _ = shutdown::wait_for_shutdown_signal() => {
                tracing::info!("shutdown requested");
                runtime_token.cancel();
                self.wait_all_with_grace(set, alive).await
            }
            result = join_all(set) => match result {
                Ok(()) => Ok(()),
                Err(err) => {
                    tracing::error!("worker failed: {err}");
                    runtime_token.cancel();
                    let _ = self.wait_all_with_grace(set, alive).await;
                    Err(err)
                }
            }
        }
    }

    /// Waits for every worker to finish within [`Config::grace`]; aborts
    /// whatever is stuck past the deadline.
    async fn wait_all_with_grace(
        &self,
        set: &mut JoinSet<Result<(), StationError>>,
        alive: &AliveSet,
    ) -> Result<(), StationError> {
        let grace = self.cfg.grace;
        let drain = async {
            while let Some(joined) = set.join_next().await {
                log_shutdown_join(joined);
            }
        };
        if tokio::time::timeout(grace, drain).await.is_err() {
            let stuck = alive.snapshot();
            tracing::warn!("grace {grace:?} exceeded; aborting stuck workers: {stuck:?}");
            set.abort_all();
            while set.join_next().await.is_some() {}
            return Err(StationError::GraceExceeded { grace, stuck });
        }
        Ok(())
    }
}

/// Names of the workers that have not finished yet; read when the grace
/// period runs out to say who got stuck.
#[derive(Clone, Default)]
struct AliveSet {
    inner: Arc<Mutex<BTreeSet<String>>>,
}

impl AliveSet {
    fn insert(&self, name: &str) {
        if let Ok(mut set) = self.inner.lock() {
            set.insert(name.to_string());
        }
    }

    fn remove(&self, name: &str) {
        if let Ok(mut set) = self.inner.lock() {
            set.remove(name);
        }
    }

    fn snapshot(&self) -> Vec<String> {
        match self.inner.lock() {
            Ok(set) => set.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Joins workers until the set drains or one returns a fatal error.
async fn join_all(set: &mut JoinSet<Result<(), StationError>>) -> Result<(), StationError> {
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(err),
            Err(err) if err.is_cancelled() => {}
            Err(err) => tracing::error!("worker panicked: {err}"),
        }
    }
    Ok(())
}

fn log_shutdown_join(joined: Result<Result<(), StationError>, tokio::task::JoinError>) {
    match joined {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::error!("worker failed during shutdown: {err}"),
        Err(err) if err.is_cancelled() => {}
        Err(err) => tracing::error!("worker panicked during shutdown: {err}"),
    }
}
