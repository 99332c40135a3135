//! Merged event stream: one machine-readable feed over both logs.
//!
//! The stream is derived, not stored: replay summarizes the metrics log into
//! a single synthetic `jobs-completed` event and replays every historical
//! activity record, then live tailing surfaces new appends to either log as
//! they arrive.

use std::collections::VecDeque;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::StationError;
use crate::store::{
    strip_timestamp_prefix, ActivityKind, ActivityRecord, LogReader, MetricsSnapshot, StationPaths,
};

/// One event of the merged consumer stream, serialized as a JSON line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StationEvent {
    /// Latest cumulative jobs counter.
    #[serde(rename = "jobs-completed")]
    JobsCompleted { total: u64 },
    /// A module (or the station itself) logged normal activity.
    #[serde(rename = "activity:info")]
    ActivityInfo { module: String, message: String },
    /// A module (or the station itself) logged a failure.
    #[serde(rename = "activity:error")]
    ActivityError { module: String, message: String },
}

/// Merged view over the metrics and activity logs.
///
/// [`MergedEvents::next_event`] never returns "end of stream"; once the
/// present data is replayed it waits for more, polling every `poll`.
/// Arrival order across the two logs is best effort: within one poll pass,
/// metrics records surface before activity records.
pub struct MergedEvents {
    metrics: LogReader,
    activity: LogReader,
    poll: Duration,
    queued: VecDeque<StationEvent>,
    replayed: bool,
}

impl MergedEvents {
    /// Opens the stream over the logs under `paths`.
    pub fn open(paths: &StationPaths, poll: Duration) -> Self {
        Self {
            metrics: LogReader::open(&paths.metrics, true, poll),
            activity: LogReader::open(&paths.activity, true, poll),
            poll,
            queued: VecDeque::new(),
            replayed: false,
        }
    }

    /// Returns the next event, waiting for one if none is pending.
    pub async fn next_event(&mut self) -> Result<StationEvent, StationError> {
        loop {
            if let Some(event) = self.queued.pop_front() {
                return Ok(event);
            }
            if !self.replayed {
                self.replay().await?;
                self.replayed = true;
                continue;
            }
            self.poll_metrics().await?;
            self.poll_activity().await?;
            if self.queued.is_empty() {
                tokio::time::sleep(self.poll).await;
            }
        }
    }

    /// Drains both logs once: the metrics history collapses into one
    /// synthetic event carrying the latest snapshot (zero if there is none),
    /// the activity history replays record by record. Draining through the
    /// readers leaves them positioned for live tailing without duplicates.
    async fn replay(&mut self) -> Result<(), StationError> {
        let mut latest = MetricsSnapshot::zero();
        for line in self.metrics.poll_new_lines().await? {
            match serde_json::from_str(strip_timestamp_prefix(&line)) {
                Ok(snapshot) => latest = snapshot,
                Err(err) => tracing::warn!("skipping unparseable metrics record: {err}"),
            }
        }
        self.queued.push_back(StationEvent::JobsCompleted {
            total: latest.total_jobs_completed,
        });
        self.poll_activity().await
    }

    async fn poll_metrics(&mut self) -> Result<(), StationError> {
        for line in self.metrics.poll_new_lines().await? {
            match serde_json::from_str::<MetricsSnapshot>(strip_timestamp_prefix(&line)) {
                Ok(snapshot) => self.queued.push_back(StationEvent::JobsCompleted {
                    total: snapshot.total_jobs_completed,
                }),
                Err(err) => tracing::warn!("skipping unparseable metrics record: {err}"),
            }
        }
        Ok(())
    }

    async fn poll_activity(&mut self) -> Result<(), StationError> {
        for line in self.activity.poll_new_lines().await? {
            match serde_json::from_str::<ActivityRecord>(strip_timestamp_prefix(&line)) {
                Ok(record) => self.queued.push_back(activity_event(record)),
                Err(err) => tracing::warn!("skipping unparseable activity record: {err}"),
            }
        }
        Ok(())
    }
}

fn activity_event(record: ActivityRecord) -> StationEvent {
    match record.kind {
        ActivityKind::Info => StationEvent::ActivityInfo {
            module: record.source,
            message: record.message,
        },
        ActivityKind::Error => StationEvent::ActivityError {
            module: record.source,
            message: record.message,
        },
    }
}
