//! # station-core
//!
//! **Station Core** is a local host agent that runs compute modules as
//! child processes, persists every event they emit into append-only logs,
//! and serves independent read-side consumers over those logs.
//!
//! The supervising process and the readers never share memory: everything
//! coordinates through the files under one root directory, so `station
//! metrics` works against a live supervisor, a dead one, or none at all.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                   ┌──────────────────────────────┐
//!                   │        station (CLI)         │
//!                   │  default ──► run supervisor  │
//!                   │  metrics / logs / activity / │
//!                   │  events  ──► read the store  │
//!                   └──────────────┬───────────────┘
//!                                  ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Station (supervising process)                                │
//! │  - SingletonLock (one supervisor per root directory)          │
//! │  - EventLogStore (append side, one handle per log)            │
//! │  - ActivityWriter / MetricsWriter (normalized records)        │
//! └───────┬───────────────────┬───────────────────┬───────────────┘
//!         ▼                   ▼                   ▼
//!  ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//!  │ ModuleActor  │    │ ModuleActor  │    │ RewardsLoop  │
//!  │ (zinnia)     │    │ (module #2)  │    │ (chain poll) │
//!  └──────┬───────┘    └──────┬───────┘    └──────┬───────┘
//!         │ stdout/stderr     │                   │ scheduled rewards
//!         ▼                   ▼                   ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  <root>/logs/...  append-only, timestamp-prefixed records     │
//! │  activity.log   metrics.log   all.log   modules/<name>.log    │
//! └──────────────────────────────┬────────────────────────────────┘
//!                                ▼
//!                 independent reader processes
//!         metrics / logs / activity / events (follow or not)
//! ```
//!
//! ### Lifecycle
//! ```text
//! station (no subcommand)
//!   ├─► SingletonLock::acquire     (exit 1 when one is already running)
//!   ├─► ensure the directory layout under the root
//!   ├─► log "Station Core is running" (before any module settles)
//!   ├─► spawn one ModuleActor per module + the RewardsLoop
//!   │      actor: spawn child ──► readiness (first output races a fixed
//!   │             timeout) ──► decode protocol lines ──► append to store
//!   │      loop:  idle until reward sources appear ──► poll every source,
//!   │             sum with per-source fallback ──► submit the total
//!   └─► SIGINT/SIGTERM/SIGQUIT ──► cancel ──► grace-bounded drain
//! ```
//!
//! ## Features
//! | Area            | Description                                                 | Key types / traits               |
//! |-----------------|-------------------------------------------------------------|----------------------------------|
//! | **Supervision** | Run modules as child processes, route their protocol.       | [`Station`], [`ModuleSpec`]      |
//! | **Store**       | Append-only timestamped logs with poll-based tail readers.  | [`EventLogStore`], [`LogReader`] |
//! | **Metrics**     | Latest-record-wins snapshot, merge-style updates.           | [`MetricsSnapshot`], [`MetricsWriter`] |
//! | **Events**      | Module protocol decoding and the merged consumer stream.    | [`decode_line`], [`MergedEvents`] |
//! | **Rewards**     | Jittered polling of rewards scheduled for the wallet.       | [`RewardSource`], [`PollPacing`] |
//! | **Errors**      | Typed errors with stable labels.                            | [`StationError`], [`DecodeError`] |
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use station_core::{zinnia, Config, RewardSource, Station, StationError};
//!
//! struct DemoSource;
//!
//! #[async_trait]
//! impl RewardSource for DemoSource {
//!     fn name(&self) -> &str {
//!         "demo"
//!     }
//!
//!     async fn rewards_scheduled_for(&self, _wallet: &str) -> anyhow::Result<u128> {
//!         Ok(0)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StationError> {
//!     let mut cfg = Config::new("/tmp/station-demo");
//!     cfg.wallet_address = Some("f1abjxfbp274xpdqcpuaykwkfb43omjotacm2p3za".to_string());
//!     let wallet = cfg.wallet_address.clone().unwrap_or_default();
//!
//!     let station = Station::new(cfg.clone());
//!     station.reward_sources.write().await.push(Arc::new(DemoSource));
//!     station.run(vec![zinnia(&cfg, &wallet)]).await
//! }
//! ```

mod cli;
mod commands;
mod config;
mod core;
mod error;
mod events;
mod lock;
mod report;
mod rewards;
mod store;

// ---- Public re-exports ----

pub use cli::{Cli, Commands};
pub use commands::{print_activity, print_logs, print_metrics, stream_events};
pub use config::Config;
pub use core::{zinnia, ModuleSpec, Station};
pub use error::{DecodeError, StationError};
pub use events::{decode_line, MergedEvents, ModuleEvent, StationEvent};
pub use lock::SingletonLock;
pub use report::{ErrorReporter, TracingReporter};
pub use rewards::{PollPacing, RewardSource, SharedRewardSources};
pub use store::{
    read_latest_snapshot, strip_timestamp_prefix, ActivityKind, ActivityRecord, ActivityWriter,
    EventLogStore, LogReader, MetricsSink, MetricsSnapshot, MetricsUpdate, MetricsWriter,
    StationPaths,
};
