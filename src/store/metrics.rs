//! Metrics snapshots: cumulative totals, appended as full records.
//!
//! Every change appends the *entire* snapshot, so the latest record of the
//! metrics log is always the whole truth and consumers never have to fold
//! deltas.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::StationError;
use crate::store::log::{strip_timestamp_prefix, EventLogStore};

/// Cumulative totals of one station run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Jobs completed by modules during this run.
    pub total_jobs_completed: u64,
    /// Earnings as a decimal string; attoFIL amounts do not fit a float.
    pub total_earnings: String,
    /// Rewards currently scheduled for the wallet, decimal string.
    /// Absent until the rewards loop has reported at least once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewards_scheduled_for_address: Option<String>,
}

impl MetricsSnapshot {
    /// Snapshot before anything happened: zero jobs, zero earnings.
    pub fn zero() -> Self {
        Self {
            total_jobs_completed: 0,
            total_earnings: "0".to_string(),
            rewards_scheduled_for_address: None,
        }
    }
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self::zero()
    }
}

/// Partial update merged into the current snapshot; `Some` fields overwrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsUpdate {
    pub total_jobs_completed: Option<u64>,
    pub total_earnings: Option<String>,
    pub rewards_scheduled_for_address: Option<String>,
}

/// Write access to the metrics snapshot, handed to whoever produces metrics
/// (module actors, the rewards loop).
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Merges `update` into the snapshot and persists the result.
    async fn submit(&self, update: MetricsUpdate) -> Result<(), StationError>;
}

/// Owns the in-memory snapshot and appends every merged change as one
/// compact-JSON record to the metrics log.
///
/// A fresh writer starts from [`MetricsSnapshot::zero`]; totals are per run
/// and nothing is carried over from a previous process.
#[derive(Clone)]
pub struct MetricsWriter {
    current: Arc<Mutex<MetricsSnapshot>>,
    store: EventLogStore,
    path: PathBuf,
}

impl MetricsWriter {
    pub fn new(store: EventLogStore, path: impl Into<PathBuf>) -> Self {
        Self {
            current: Arc::new(Mutex::new(MetricsSnapshot::zero())),
            store,
            path: path.into(),
        }
    }
}

#[async_trait]
impl MetricsSink for MetricsWriter {
    async fn submit(&self, update: MetricsUpdate) -> Result<(), StationError> {
        // The snapshot lock is held across the append so the log order
        // matches the merge order.
        let mut current = self.current.lock().await;
        if let Some(total) = update.total_jobs_completed {
            current.total_jobs_completed = total;
        }
        if let Some(earnings) = update.total_earnings {
            current.total_earnings = earnings;
        }
        if let Some(rewards) = update.rewards_scheduled_for_address {
            current.rewards_scheduled_for_address = Some(rewards);
        }
        let json = serde_json::to_string(&*current)?;
        self.store.append(&self.path, &json).await
    }
}

/// Latest parseable snapshot in the metrics log at `path`.
///
/// A missing log, an empty log, or a log with no parseable record all read
/// as the zero snapshot.
pub async fn read_latest_snapshot(path: &Path) -> Result<MetricsSnapshot, StationError> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(MetricsSnapshot::zero())
        }
        Err(source) => {
            return Err(StationError::LogIo {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let mut latest = MetricsSnapshot::zero();
    for line in contents.lines() {
        if let Ok(snapshot) = serde_json::from_str(strip_timestamp_prefix(line)) {
            latest = snapshot;
        }
    }
    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_snapshot_wire_shape() {
        let json = serde_json::to_string(&MetricsSnapshot::zero()).expect("serialize");
        assert_eq!(json, r#"{"totalJobsCompleted":0,"totalEarnings":"0"}"#);

        let pretty = serde_json::to_string_pretty(&MetricsSnapshot::zero()).expect("serialize");
        assert_eq!(
            pretty,
            "{\n  \"totalJobsCompleted\": 0,\n  \"totalEarnings\": \"0\"\n}"
        );
    }

    #[test]
    fn test_snapshot_parses_stored_record() {
        let line = r#"[3/14/2023, 10:38:14 AM] {"totalJobsCompleted":1,"totalEarnings":"2"}"#;
        let snapshot: MetricsSnapshot =
            serde_json::from_str(strip_timestamp_prefix(line)).expect("parse");
        assert_eq!(snapshot.total_jobs_completed, 1);
        assert_eq!(snapshot.total_earnings, "2");
        assert_eq!(snapshot.rewards_scheduled_for_address, None);
    }

    #[tokio::test]
    async fn test_submit_merges_and_appends_full_snapshots() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("metrics.log");
        let writer = MetricsWriter::new(EventLogStore::new(), &path);

        writer
            .submit(MetricsUpdate {
                total_jobs_completed: Some(3),
                total_earnings: Some("0".to_string()),
                ..Default::default()
            })
            .await
            .expect("submit jobs");
        writer
            .submit(MetricsUpdate {
                rewards_scheduled_for_address: Some("5".to_string()),
                ..Default::default()
            })
            .await
            .expect("submit rewards");

        let contents = std::fs::read_to_string(&path).expect("read back");
        let records: Vec<MetricsSnapshot> = contents
            .lines()
            .map(|line| serde_json::from_str(strip_timestamp_prefix(line)).expect("parse"))
            .collect();
        assert_eq!(records.len(), 2, "one full record per submit");
        assert_eq!(records[0].total_jobs_completed, 3);
        assert_eq!(records[0].rewards_scheduled_for_address, None);
        assert_eq!(records[1].total_jobs_completed, 3, "earlier fields survive");
        assert_eq!(
            records[1].rewards_scheduled_for_address,
            Some("5".to_string())
        );
        assert!(
            contents.contains("rewardsScheduledForAddress"),
            "rewards field must use the wire name"
        );
    }

    #[tokio::test]
    async fn test_read_latest_skips_garbage_and_takes_last() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("metrics.log");
        std::fs::write(
            &path,
            concat!(
                "[d] {\"totalJobsCompleted\":1,\"totalEarnings\":\"0\"}\n",
                "[d] not json at all\n",
                "[d] {\"totalJobsCompleted\":2,\"totalEarnings\":\"7\"}\n",
            ),
        )
        .expect("seed");

        let latest = read_latest_snapshot(&path).await.expect("read");
        assert_eq!(latest.total_jobs_completed, 2);
        assert_eq!(latest.total_earnings, "7");
    }

    #[tokio::test]
    async fn test_read_latest_without_log_is_zero() {
        let dir = tempfile::tempdir().expect("tempdir");
        let latest = read_latest_snapshot(&dir.path().join("missing.log"))
            .await
            .expect("read");
        assert_eq!(latest, MetricsSnapshot::zero());
    }
}
