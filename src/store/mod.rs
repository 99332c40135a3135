//! Durable store: append-only logs, activity records, metrics snapshots.
//!
//! This module groups everything the station persists and the readers the
//! consumer commands use to get it back out. Writers and readers never share
//! state: the writer side serializes appends behind one mutex, the reader
//! side tails the files directly, so consumers work from a separate process
//! while the station runs.
//!
//! ## Contents
//! - [`EventLogStore`], [`LogReader`] timestamped append-only logs and their
//!   cross-process poll readers
//! - [`ActivityRecord`], [`ActivityWriter`] the human-visible timeline
//! - [`MetricsSnapshot`], [`MetricsWriter`] cumulative totals, every change
//!   appended as a full record
//! - [`StationPaths`] where all of it lives on disk
//!
//! ## Quick reference
//! - **Writers**: `ModuleActor` (raw lines, activity, job metrics),
//!   `RewardsLoop` (reward metrics), `Station` (startup activity).
//! - **Readers**: the `metrics`/`logs`/`activity` commands and the merged
//!   event stream behind `events`.

mod activity;
mod log;
mod metrics;
mod paths;

pub use activity::{ActivityKind, ActivityRecord, ActivityWriter};
pub use log::{strip_timestamp_prefix, EventLogStore, LogReader};
pub use metrics::{
    read_latest_snapshot, MetricsSink, MetricsSnapshot, MetricsUpdate, MetricsWriter,
};
pub use paths::StationPaths;

pub(crate) use log::LineBuf;
