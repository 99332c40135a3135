//! Activity records: the human-visible timeline of what the station did.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::StationError;
use crate::store::log::EventLogStore;

/// Severity of an activity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Info,
    Error,
}

/// One record of the activity log, stored as compact JSON behind the
/// timestamp prefix, e.g.
/// `{"source":"Zinnia","type":"info","message":"Jobs completed"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Which component produced the record (a module's display name, or
    /// `Station Core` for the station itself).
    pub source: String,
    /// Record severity.
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    /// Human-readable text.
    pub message: String,
}

/// Appends activity records to the activity log.
#[derive(Clone)]
pub struct ActivityWriter {
    store: EventLogStore,
    path: PathBuf,
}

impl ActivityWriter {
    pub fn new(store: EventLogStore, path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            path: path.into(),
        }
    }

    /// Records something that went as expected.
    pub async fn info(&self, source: &str, message: &str) -> Result<(), StationError> {
        self.write(ActivityKind::Info, source, message).await
    }

    /// Records a failure worth surfacing to the user.
    pub async fn error(&self, source: &str, message: &str) -> Result<(), StationError> {
        self.write(ActivityKind::Error, source, message).await
    }

    async fn write(
        &self,
        kind: ActivityKind,
        source: &str,
        message: &str,
    ) -> Result<(), StationError> {
        let record = ActivityRecord {
            source: source.to_string(),
            kind,
            message: message.to_string(),
        };
        let json = serde_json::to_string(&record)?;
        self.store.append(&self.path, &json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::log::strip_timestamp_prefix;

    #[test]
    fn test_record_serializes_in_stored_field_order() {
        let record = ActivityRecord {
            source: "Saturn".to_string(),
            kind: ActivityKind::Info,
            message: "beep boop".to_string(),
        };
        let json = serde_json::to_string(&record).expect("serialize");
        assert_eq!(
            json,
            r#"{"source":"Saturn","type":"info","message":"beep boop"}"#
        );
    }

    #[tokio::test]
    async fn test_writer_appends_parseable_records() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("activity.log");
        let writer = ActivityWriter::new(EventLogStore::new(), &path);

        writer.info("Zinnia", "module came up").await.expect("info");
        writer.error("Zinnia", "module fell over").await.expect("error");

        let contents = std::fs::read_to_string(&path).expect("read back");
        let records: Vec<ActivityRecord> = contents
            .lines()
            .map(|line| serde_json::from_str(strip_timestamp_prefix(line)).expect("parse"))
            .collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, ActivityKind::Info);
        assert_eq!(records[0].message, "module came up");
        assert_eq!(records[1].kind, ActivityKind::Error);
        assert_eq!(records[1].source, "Zinnia");
    }
}
